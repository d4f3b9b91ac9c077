//! Ratio metrics computed from a unified table.

use insights_core::{Cell, Column, ColumnKind, InsightsError, InsightsResult, ResultTable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedMetric {
    /// conversions / sessions × 100
    ConversionRate,
    /// transactions / sessions × 100
    TransactionRate,
    /// screenPageViews / sessions
    PagesPerSession,
    /// newUsers / totalUsers × 100
    NewUserRate,
}

impl DerivedMetric {
    pub const ALL: [DerivedMetric; 4] = [
        Self::ConversionRate,
        Self::TransactionRate,
        Self::PagesPerSession,
        Self::NewUserRate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::ConversionRate => "conversion_rate",
            Self::TransactionRate => "transaction_rate",
            Self::PagesPerSession => "pages_per_session",
            Self::NewUserRate => "new_user_rate",
        }
    }

    /// (numerator, denominator, scale)
    fn formula(self) -> (&'static str, &'static str, f64) {
        match self {
            Self::ConversionRate => ("conversions", "sessions", 100.0),
            Self::TransactionRate => ("transactions", "sessions", 100.0),
            Self::PagesPerSession => ("screenPageViews", "sessions", 1.0),
            Self::NewUserRate => ("newUsers", "totalUsers", 100.0),
        }
    }

    /// Ratio for one pair of operands, rounded to two decimals. A zero
    /// denominator yields NaN or infinity.
    pub fn compute(self, numerator: f64, denominator: f64) -> f64 {
        let (_, _, scale) = self.formula();
        round2(numerator / denominator * scale)
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Append one column per metric in `metrics`, in order. An empty table is
/// returned as is. Rows with a missing operand get a missing ratio.
pub fn append_derived(mut table: ResultTable, metrics: &[DerivedMetric]) -> InsightsResult<ResultTable> {
    if table.is_empty() {
        return Ok(table);
    }

    let mut plan = Vec::with_capacity(metrics.len());
    for metric in metrics {
        let (num, den, _) = metric.formula();
        let lookup = |column: &str| {
            table
                .column_index(column)
                .ok_or_else(|| InsightsError::MissingColumn {
                    column: column.to_string(),
                    derived: metric.name().to_string(),
                })
        };
        plan.push((*metric, lookup(num)?, lookup(den)?));
    }

    for (metric, num_idx, den_idx) in plan {
        table.push_column(Column::new(metric.name(), ColumnKind::Derived), |row| {
            match (row[num_idx].as_f64(), row[den_idx].as_f64()) {
                (Some(n), Some(d)) => Cell::Number(metric.compute(n, d)),
                _ => Cell::Missing,
            }
        });
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use insights_core::{DateRange, QuerySpec, ResultRow};

    fn table(rows: &[[&str; 5]]) -> ResultTable {
        let spec = QuerySpec::new(
            Vec::<String>::new(),
            ["sessions", "totalUsers", "newUsers", "screenPageViews", "conversions"],
            DateRange::parse("7daysAgo", "yesterday").unwrap(),
        )
        .unwrap();
        let rows = rows
            .iter()
            .map(|r| {
                let metrics: Vec<String> = r.iter().map(|s| s.to_string()).collect();
                ResultRow::from_raw(&spec, &[], &metrics)
            })
            .collect();
        ResultTable::from_rows(&spec, Some("US"), rows)
    }

    fn column(table: &ResultTable, name: &str) -> Vec<Cell> {
        table
            .column_values(name)
            .unwrap()
            .into_iter()
            .cloned()
            .collect()
    }

    #[test]
    fn test_ratios_are_rounded() {
        let t = table(&[["300", "200", "50", "1000", "7"]]);
        let t = append_derived(
            t,
            &[
                DerivedMetric::ConversionRate,
                DerivedMetric::PagesPerSession,
                DerivedMetric::NewUserRate,
            ],
        )
        .unwrap();

        assert_eq!(column(&t, "conversion_rate"), vec![Cell::Number(2.33)]);
        assert_eq!(column(&t, "pages_per_session"), vec![Cell::Number(3.33)]);
        assert_eq!(column(&t, "new_user_rate"), vec![Cell::Number(25.0)]);
        assert_eq!(t.columns().last().unwrap().kind, ColumnKind::Derived);
    }

    #[test]
    fn test_empty_table_unchanged() {
        let t = table(&[]);
        let before = t.clone();
        let after = append_derived(t, &DerivedMetric::ALL).unwrap();
        assert_eq!(after, before);
    }

    #[test]
    fn test_zero_denominator_is_not_special_cased() {
        let t = table(&[["0", "0", "0", "5", "0"]]);
        let t = append_derived(t, &[DerivedMetric::ConversionRate, DerivedMetric::PagesPerSession])
            .unwrap();
        assert!(column(&t, "conversion_rate")[0].as_f64().unwrap().is_nan());
        assert!(column(&t, "pages_per_session")[0].as_f64().unwrap().is_infinite());
    }

    #[test]
    fn test_missing_operand_gives_missing() {
        let t = table(&[["(other)", "10", "1", "20", "2"]]);
        let t = append_derived(t, &[DerivedMetric::ConversionRate]).unwrap();
        assert_eq!(column(&t, "conversion_rate"), vec![Cell::Missing]);
    }

    #[test]
    fn test_absent_column_is_an_error() {
        let t = table(&[["10", "10", "1", "20", "2"]]);
        let err = append_derived(t, &[DerivedMetric::TransactionRate]).unwrap_err();
        match err {
            InsightsError::MissingColumn { column, derived } => {
                assert_eq!(column, "transactions");
                assert_eq!(derived, "transaction_rate");
            }
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }
}

//! Typed result tables. Column order is fixed when the table is created:
//! `[label] + dimensions + metrics`, with derived columns appended after.

use serde::{Deserialize, Serialize};

use crate::query::QuerySpec;

/// Name of the column holding the originating property's country label.
pub const LABEL_COLUMN: &str = "country_label";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Label,
    Dimension,
    Metric,
    Derived,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
    Missing,
}

impl Cell {
    /// Coerce a raw metric value. Anything that does not parse as a finite
    /// number becomes [`Cell::Missing`].
    pub fn coerce_numeric(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Self::Number(v),
            _ => Self::Missing,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// One source row: dimension values as text, metric values coerced.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub dimensions: Vec<String>,
    pub metrics: Vec<Cell>,
}

impl ResultRow {
    /// Map raw API values onto the requested columns. Short rows are padded:
    /// absent dimensions become empty strings and absent metrics
    /// [`Cell::Missing`].
    pub fn from_raw(spec: &QuerySpec, dimension_values: &[String], metric_values: &[String]) -> Self {
        let dimensions = (0..spec.dimensions.len())
            .map(|i| dimension_values.get(i).cloned().unwrap_or_default())
            .collect();
        let metrics = (0..spec.metrics.len())
            .map(|i| {
                metric_values
                    .get(i)
                    .map_or(Cell::Missing, |v| Cell::coerce_numeric(v))
            })
            .collect();
        Self {
            dimensions,
            metrics,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    columns: Vec<Column>,
    rows: Vec<Vec<Cell>>,
}

impl ResultTable {
    /// Empty table with columns built from the query, optionally led by the
    /// label column.
    pub fn for_query(spec: &QuerySpec, with_label: bool) -> Self {
        let mut columns = Vec::with_capacity(spec.dimensions.len() + spec.metrics.len() + 1);
        if with_label {
            columns.push(Column::new(LABEL_COLUMN, ColumnKind::Label));
        }
        columns.extend(
            spec.dimensions
                .iter()
                .map(|d| Column::new(d.clone(), ColumnKind::Dimension)),
        );
        columns.extend(
            spec.metrics
                .iter()
                .map(|m| Column::new(m.clone(), ColumnKind::Metric)),
        );
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Table for one source's rows, every row tagged with `label` when given.
    pub fn from_rows(spec: &QuerySpec, label: Option<&str>, rows: Vec<ResultRow>) -> Self {
        let mut table = Self::for_query(spec, label.is_some());
        table.rows.reserve(rows.len());
        for row in rows {
            let mut cells = Vec::with_capacity(table.columns.len());
            if let Some(label) = label {
                cells.push(Cell::Text(label.to_string()));
            }
            cells.extend(row.dimensions.into_iter().map(Cell::Text));
            cells.extend(row.metrics);
            table.rows.push(cells);
        }
        table
    }

    /// Append the rows of `other`. Both tables must share the same columns.
    pub fn append(&mut self, other: ResultTable) {
        debug_assert_eq!(self.columns, other.columns);
        self.rows.extend(other.rows);
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All values of one column, top to bottom.
    pub fn column_values(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Append a column computed from each row. `f` sees the row's cells in
    /// current column order.
    pub fn push_column<F>(&mut self, column: Column, mut f: F)
    where
        F: FnMut(&[Cell]) -> Cell,
    {
        for row in &mut self.rows {
            let value = f(row);
            row.push(value);
        }
        self.columns.push(column);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::DateRange;

    fn spec() -> QuerySpec {
        QuerySpec::new(
            ["date", "deviceCategory"],
            ["sessions", "bounceRate"],
            DateRange::parse("7daysAgo", "yesterday").unwrap(),
        )
        .unwrap()
    }

    fn raw(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(Cell::coerce_numeric("42"), Cell::Number(42.0));
        assert_eq!(Cell::coerce_numeric("0.5312"), Cell::Number(0.5312));
        assert_eq!(Cell::coerce_numeric("(not set)"), Cell::Missing);
        assert_eq!(Cell::coerce_numeric(""), Cell::Missing);
    }

    #[test]
    fn test_non_finite_text_is_missing() {
        for raw in ["NaN", "nan", "inf", "-inf", "infinity", "1e400"] {
            assert!(Cell::coerce_numeric(raw).is_missing(), "{raw}");
        }
    }

    #[test]
    fn test_label_column_first() {
        let rows = vec![ResultRow::from_raw(
            &spec(),
            &raw(&["20240101", "mobile"]),
            &raw(&["10", "0.4"]),
        )];
        let table = ResultTable::from_rows(&spec(), Some("US"), rows);
        assert_eq!(
            table.column_names(),
            vec!["country_label", "date", "deviceCategory", "sessions", "bounceRate"]
        );
        assert_eq!(table.columns()[0].kind, ColumnKind::Label);
        assert_eq!(table.rows()[0][0], Cell::Text("US".into()));
        assert_eq!(table.rows()[0][3], Cell::Number(10.0));
    }

    #[test]
    fn test_without_label() {
        let table = ResultTable::from_rows(&spec(), None, Vec::new());
        assert_eq!(
            table.column_names(),
            vec!["date", "deviceCategory", "sessions", "bounceRate"]
        );
        assert!(table.is_empty());
    }

    #[test]
    fn test_short_row_is_padded() {
        let row = ResultRow::from_raw(&spec(), &raw(&["20240101"]), &raw(&["abc"]));
        assert_eq!(row.dimensions, vec!["20240101".to_string(), String::new()]);
        assert_eq!(row.metrics, vec![Cell::Missing, Cell::Missing]);
    }

    #[test]
    fn test_push_column() {
        let rows = vec![
            ResultRow::from_raw(&spec(), &raw(&["d1", "mobile"]), &raw(&["10", "0.5"])),
            ResultRow::from_raw(&spec(), &raw(&["d2", "desktop"]), &raw(&["4", "0.25"])),
        ];
        let mut table = ResultTable::from_rows(&spec(), None, rows);
        let idx = table.column_index("sessions").unwrap();
        table.push_column(Column::new("double", ColumnKind::Derived), |row| {
            row[idx].as_f64().map_or(Cell::Missing, |v| Cell::Number(v * 2.0))
        });
        let values: Vec<_> = table
            .column_values("double")
            .unwrap()
            .into_iter()
            .cloned()
            .collect();
        assert_eq!(values, vec![Cell::Number(20.0), Cell::Number(8.0)]);
    }
}

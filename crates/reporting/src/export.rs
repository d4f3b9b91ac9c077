//! Render result tables as CSV, JSON records or aligned text.

use insights_core::{Cell, ColumnKind, InsightsResult, ResultTable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Table,
    Csv,
    Json,
}

pub fn render(table: &ResultTable, format: ExportFormat) -> InsightsResult<String> {
    match format {
        ExportFormat::Table => Ok(to_text(table)),
        ExportFormat::Csv => Ok(to_csv(table)),
        ExportFormat::Json => to_json_records(table),
    }
}

fn format_number(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        v.to_string()
    }
}

fn plain(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => s.clone(),
        Cell::Number(v) => format_number(*v),
        Cell::Missing => String::new(),
    }
}

pub fn to_csv(table: &ResultTable) -> String {
    let mut csv = table
        .column_names()
        .iter()
        .map(|name| quote(name))
        .collect::<Vec<_>>()
        .join(",");
    csv.push('\n');
    for row in table.rows() {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| match cell {
                Cell::Text(s) => quote(s),
                other => plain(other),
            })
            .collect();
        csv.push_str(&cells.join(","));
        csv.push('\n');
    }
    csv
}

fn quote(s: &str) -> String {
    if s.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// JSON array of objects, keys in column order. Missing and non-finite
/// values become `null`; whole numbers are written without a fraction.
pub fn to_json_records(table: &ResultTable) -> InsightsResult<String> {
    let names = table.column_names();
    let records: Vec<serde_json::Value> = table
        .rows()
        .iter()
        .map(|row| {
            let record: serde_json::Map<String, serde_json::Value> = names
                .iter()
                .zip(row)
                .map(|(name, cell)| (name.to_string(), json_value(cell)))
                .collect();
            serde_json::Value::Object(record)
        })
        .collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

fn json_value(cell: &Cell) -> serde_json::Value {
    match cell {
        Cell::Text(s) => serde_json::json!(s),
        Cell::Number(v) if !v.is_finite() => serde_json::Value::Null,
        Cell::Number(v) if v.fract() == 0.0 && v.abs() < 9.0e15 => serde_json::json!(*v as i64),
        Cell::Number(v) => serde_json::json!(v),
        Cell::Missing => serde_json::Value::Null,
    }
}

/// Column-aligned text for terminals. Numeric columns are right-aligned.
pub fn to_text(table: &ResultTable) -> String {
    let header: Vec<String> = table.column_names().iter().map(|s| s.to_string()).collect();
    let body: Vec<Vec<String>> = table
        .rows()
        .iter()
        .map(|row| row.iter().map(plain).collect())
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &body {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }
    let numeric: Vec<bool> = table
        .columns()
        .iter()
        .map(|c| matches!(c.kind, ColumnKind::Metric | ColumnKind::Derived))
        .collect();

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                if numeric[i] {
                    format!("{:>width$}", cell, width = widths[i])
                } else {
                    format!("{:<width$}", cell, width = widths[i])
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = line(&header);
    out.push('\n');
    for row in &body {
        out.push_str(&line(row));
        out.push('\n');
    }
    out.push_str(&format!("({} rows)\n", body.len()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use insights_core::{DateRange, QuerySpec, ResultRow};

    fn sample() -> ResultTable {
        let spec = QuerySpec::new(
            ["pageTitle"],
            ["sessions", "bounceRate"],
            DateRange::parse("7daysAgo", "today").unwrap(),
        )
        .unwrap();
        let rows = vec![
            ResultRow::from_raw(
                &spec,
                &["Shoes, \"new\"".to_string()],
                &["120".to_string(), "0.4512".to_string()],
            ),
            ResultRow::from_raw(&spec, &["Home".to_string()], &["n/a".to_string(), "1".to_string()]),
        ];
        ResultTable::from_rows(&spec, Some("UK"), rows)
    }

    #[test]
    fn test_csv_export() {
        let csv = to_csv(&sample());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3); // header + 2 rows
        assert_eq!(lines[0], "country_label,pageTitle,sessions,bounceRate");
        assert_eq!(lines[1], "UK,\"Shoes, \"\"new\"\"\",120,0.4512");
        assert_eq!(lines[2], "UK,Home,,1");
    }

    #[test]
    fn test_json_export_keeps_column_order() {
        let json = to_json_records(&sample()).unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["sessions"], serde_json::json!(120));
        assert_eq!(parsed[0]["bounceRate"], serde_json::json!(0.4512));
        assert!(parsed[1]["sessions"].is_null());

        let first_key = json.find("\"country_label\"").unwrap();
        let last_key = json.find("\"bounceRate\"").unwrap();
        assert!(first_key < last_key);
    }

    #[test]
    fn test_json_non_finite_is_null() {
        assert!(json_value(&Cell::Number(f64::NAN)).is_null());
        assert!(json_value(&Cell::Number(f64::INFINITY)).is_null());
    }

    #[test]
    fn test_text_alignment() {
        let text = to_text(&sample());
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("country_label"));
        assert!(lines[1].contains("Shoes"));
        assert_eq!(lines.last().copied(), Some("(2 rows)"));
    }

    #[test]
    fn test_render_dispatch() {
        let table = sample();
        assert!(render(&table, ExportFormat::Csv).unwrap().starts_with("country_label,"));
        assert!(render(&table, ExportFormat::Json).unwrap().starts_with('['));
    }
}

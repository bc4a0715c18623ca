//! Diagnostic result rendering (table / CSV / JSON)
//!
//! Pure serialization functions, no I/O. The caller writes the returned
//! string wherever it wants.

use crate::config::OutputFormat;
use crate::db::DiagnosticResult;
use unicode_width::UnicodeWidthStr;

/// Longest cell printed in table mode before truncation
const MAX_CELL_WIDTH: usize = 60;

/// Render in the requested format
pub fn render(result: &DiagnosticResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => to_table(result),
        OutputFormat::Csv => to_csv(result),
        OutputFormat::Json => to_json(result),
    }
}

/// Serialize rows as RFC 4180 CSV.
pub fn to_csv(result: &DiagnosticResult) -> String {
    let mut out = String::new();

    // Header row
    for (i, col) in result.columns.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        csv_escape_into(&mut out, col);
    }
    out.push('\n');

    // Data rows
    for row in &result.rows {
        for (i, value) in row.values().iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            csv_escape_into(&mut out, value.as_deref().unwrap_or(""));
        }
        out.push('\n');
    }

    out
}

/// Serialize rows as a JSON array of objects in column order. Values stay
/// text; NULL is `null`.
pub fn to_json(result: &DiagnosticResult) -> String {
    let rows: Vec<serde_json::Value> = result
        .rows
        .iter()
        .map(|row| {
            let obj: serde_json::Map<String, serde_json::Value> = row
                .iter()
                .map(|(key, value)| {
                    let value = value
                        .map(|v| serde_json::Value::String(v.to_string()))
                        .unwrap_or(serde_json::Value::Null);
                    (key.to_string(), value)
                })
                .collect();
            serde_json::Value::Object(obj)
        })
        .collect();

    serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
}

/// Aligned plain-text table, psql style. Widths are display widths, so
/// CJK text lines up.
pub fn to_table(result: &DiagnosticResult) -> String {
    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| {
            row.values()
                .iter()
                .map(|v| truncate(&flatten(v.as_deref().unwrap_or(""))))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.width()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.width());
        }
    }

    let mut out = String::new();
    push_line(&mut out, result.columns.iter().map(String::as_str), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("-+-"));
    out.push('\n');
    for row in &cells {
        push_line(&mut out, row.iter().map(String::as_str), &widths);
    }

    let n = result.row_count();
    out.push_str(&format!("({} {})\n", n, if n == 1 { "row" } else { "rows" }));
    out
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, w)| format!("{}{}", cell, " ".repeat(w.saturating_sub(cell.width()))))
        .collect();
    out.push_str(padded.join(" | ").trim_end());
    out.push('\n');
}

/// Collapse whitespace runs so multi-line SQL fits on one table line
fn flatten(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(value: &str) -> String {
    if value.width() <= MAX_CELL_WIDTH {
        return value.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in value.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > MAX_CELL_WIDTH - 3 {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str("...");
    out
}

/// Quote a field if it contains `,` `"` or a newline (RFC 4180).
fn csv_escape_into(out: &mut String, field: &str) {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        out.push('"');
        for c in field.chars() {
            if c == '"' {
                out.push_str("\"\"");
            } else {
                out.push(c);
            }
        }
        out.push('"');
    } else {
        out.push_str(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn result(columns: &[&str], rows: Vec<Vec<Option<&str>>>) -> DiagnosticResult {
        DiagnosticResult::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.into_iter()
                .map(|r| r.into_iter().map(|v| v.map(String::from)).collect())
                .collect(),
            Duration::from_millis(1),
        )
    }

    fn sample() -> DiagnosticResult {
        result(
            &["name", "estimated_count"],
            vec![
                vec![Some("users"), Some("1200")],
                vec![Some("orders"), Some("87")],
            ],
        )
    }

    #[test]
    fn test_basic_csv() {
        let csv = to_csv(&sample());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "name,estimated_count");
        assert_eq!(lines[1], "users,1200");
        assert_eq!(lines[2], "orders,87");
    }

    #[test]
    fn test_csv_escaping() {
        let r = result(
            &["val"],
            vec![
                vec![Some("a,b")],
                vec![Some("say \"hi\"")],
                vec![Some("line1\nline2")],
            ],
        );
        let csv = to_csv(&r);
        assert!(csv.contains("\"a,b\""));
        assert!(csv.contains("\"say \"\"hi\"\"\""));
        assert!(csv.contains("\"line1\nline2\""));
    }

    #[test]
    fn test_csv_null_is_empty() {
        let csv = to_csv(&result(&["val"], vec![vec![None]]));
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[1], "");
    }

    #[test]
    fn test_csv_empty_results() {
        assert_eq!(to_csv(&result(&["a", "b"], vec![])), "a,b\n");
    }

    #[test]
    fn test_json_values_stay_text() {
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&to_json(&sample())).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["name"], "users");
        assert_eq!(parsed[0]["estimated_count"], "1200");
    }

    #[test]
    fn test_json_keeps_column_order() {
        let r = result(
            &["state", "count", "application"],
            vec![vec![Some("active"), Some("3"), Some("psql")]],
        );
        let json = to_json(&r);
        let state = json.find("\"state\"").unwrap();
        let count = json.find("\"count\"").unwrap();
        let application = json.find("\"application\"").unwrap();
        assert!(state < count && count < application, "{}", json);
    }

    #[test]
    fn test_json_null() {
        let r = result(&["state", "count"], vec![vec![None, Some("3")]]);
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&to_json(&r)).unwrap();
        assert!(parsed[0]["state"].is_null());
        assert_eq!(parsed[0]["count"], "3");
    }

    #[test]
    fn test_table_alignment() {
        let table = to_table(&sample());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "name   | estimated_count");
        assert_eq!(lines[1], "-------+----------------");
        assert_eq!(lines[2], "users  | 1200");
        assert_eq!(lines[3], "orders | 87");
        assert_eq!(lines[4], "(2 rows)");
    }

    #[test]
    fn test_table_wide_characters() {
        let r = result(&["name"], vec![vec![Some("表")], vec![Some("ab")]]);
        let table = to_table(&r);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "name");
        assert_eq!(lines[2], "表");
        assert_eq!(lines[4], "(2 rows)");
    }

    #[test]
    fn test_table_flattens_and_truncates() {
        let long = "x".repeat(100);
        let r = result(&["query"], vec![vec![Some("SELECT 1\n  FROM t")], vec![Some(&long)]]);
        let table = to_table(&r);
        assert!(table.contains("SELECT 1 FROM t"));
        assert!(table.contains(&format!("{}...", "x".repeat(MAX_CELL_WIDTH - 3))));
    }

    #[test]
    fn test_table_single_row_label() {
        let r = result(&["version"], vec![vec![Some("PostgreSQL 16.2")]]);
        assert!(to_table(&r).ends_with("(1 row)\n"));
    }
}

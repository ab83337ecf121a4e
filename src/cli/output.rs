//! Terminal output: JSON, simple tables and status lines

use colored::*;
use serde_json::Value;

/// List responses print their `value` array; anything else prints as-is
pub fn records_of(result: Value) -> Value {
    match result {
        Value::Object(mut map) if map.get("value").is_some_and(Value::is_array) => {
            map.remove("value").unwrap_or(Value::Null)
        }
        other => other,
    }
}

pub fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{}", value),
    }
}

pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.green());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.red());
}

pub fn print_info(message: &str) {
    eprintln!("{}", message.dimmed());
}

pub fn print_table(records: &[Value], columns: &[&str]) {
    print!("{}", render_table(records, columns));
}

/// First record's field names, skipping OData annotations, capped at `limit`
pub fn default_columns(records: &[Value], limit: usize) -> Vec<String> {
    records
        .first()
        .and_then(|r| r.as_object())
        .map(|obj| {
            obj.keys()
                .filter(|k| !k.starts_with('@'))
                .take(limit)
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

pub fn render_table(records: &[Value], columns: &[&str]) -> String {
    if records.is_empty() {
        return "No records found.\n".to_string();
    }

    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|col| record.get(*col).map(cell).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(col.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut output = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(col, width)| format!("{:<width$}", col, width = *width))
        .collect();
    output.push_str(header.join(" | ").trim_end());
    output.push('\n');

    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    output.push_str(&separator.join("-+-"));
    output.push('\n');

    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(value, width)| format!("{:<width$}", value, width = *width))
            .collect();
        output.push_str(line.join(" | ").trim_end());
        output.push('\n');
    }

    output.push_str(&format!("\nTotal records: {}\n", records.len()));
    output
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => "...".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_records_of_unwraps_value_array() {
        let list = json!({"@odata.context": "ctx", "value": [{"name": "a"}]});
        assert_eq!(records_of(list), json!([{"name": "a"}]));

        let single = json!({"name": "a", "value": 3});
        assert_eq!(records_of(single.clone()), single);
    }

    #[test]
    fn test_render_table_aligns_columns() {
        let records = vec![
            json!({"name": "Sync accounts", "statecode": 1}),
            json!({"name": "X", "statecode": 0, "extra": [1]}),
        ];

        let table = render_table(&records, &["name", "statecode"]);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "name          | statecode");
        assert_eq!(lines[1], "--------------+----------");
        assert_eq!(lines[2], "Sync accounts | 1");
        assert_eq!(lines[3], "X             | 0");
        assert!(table.ends_with("Total records: 2\n"));
    }

    #[test]
    fn test_render_table_empty() {
        assert_eq!(render_table(&[], &["name"]), "No records found.\n");
    }

    #[test]
    fn test_default_columns_skip_annotations() {
        let records = vec![json!({"@odata.etag": "W/\"1\"", "accountid": "1", "name": "Contoso"})];
        let columns = default_columns(&records, 6);

        assert!(!columns.iter().any(|c| c.starts_with('@')));
        assert_eq!(columns.len(), 2);
    }
}

//! Value conversion helpers for Gherkin data tables
//!
//! Converts string values from feature files to splitter Value types.

use order_splitter::Value;

use crate::world::Row;

/// Convert a Gherkin table cell value to a splitter Value.
///
/// Supports:
/// - `true` / `false` -> Bool
/// - `null` or an empty cell -> Null
/// - Integer literals -> Int
/// - Float literals -> Float
/// - Everything else -> String
pub fn convert_gherkin_value(val: &str) -> Value {
    let trimmed = val.trim();

    if trimmed == "true" {
        return Value::Bool(true);
    }
    if trimmed == "false" {
        return Value::Bool(false);
    }

    if trimmed == "null" || trimmed.is_empty() {
        return Value::Null;
    }

    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Int(i);
    }

    if let Ok(f) = trimmed.parse::<f64>() {
        return Value::Float(f);
    }

    Value::String(trimmed.to_string())
}

/// Parse a Gherkin table with a header row into records.
///
/// ```text
/// | id | sku | quantity |
/// | 1  | C1  | 5        |
/// ```
///
/// A cell holding `-` leaves the field out of that record.
pub fn parse_table_to_records(table: &cucumber::gherkin::Table) -> Vec<Row> {
    let Some((header, rows)) = table.rows.split_first() else {
        return Vec::new();
    };

    rows.iter()
        .map(|row| {
            header
                .iter()
                .zip(row)
                .filter(|(_, cell)| cell.trim() != "-")
                .map(|(key, cell)| (key.trim().to_string(), convert_gherkin_value(cell)))
                .collect()
        })
        .collect()
}

/// Parse a two-column `| field | expression |` table into pairs.
pub fn parse_table_to_pairs(table: &cucumber::gherkin::Table) -> Vec<(String, String)> {
    table
        .rows
        .iter()
        .filter(|row| row.len() >= 2)
        .map(|row| (row[0].trim().to_string(), row[1].trim().to_string()))
        .collect()
}

/// Split a comma-separated step argument, dropping empty items.
pub fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// The `id` values of records, rendered for comparison with a step argument.
pub fn record_ids(records: &[Row]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.get("id").map(|v| v.to_string()).unwrap_or_default())
        .collect()
}

//! Rendering of report results for the command line.

use crate::db::QueryResult;
use crate::error::{ReportError, Result};
use serde_json::{Map, Value as JsonValue};

/// Renders a result as a tab-separated header line followed by one line per row.
pub fn format_text(result: &QueryResult) -> String {
    let mut out = result.column_names().join("\t");
    out.push('\n');

    for row in &result.rows {
        let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }

    out
}

/// Renders a result as a JSON array with one object per row, keyed by column name.
pub fn format_json(result: &QueryResult) -> Result<String> {
    let rows: Vec<JsonValue> = result
        .rows
        .iter()
        .map(|row| {
            let object: Map<String, JsonValue> = result
                .columns
                .iter()
                .zip(row)
                .map(|(column, value)| (column.name.clone(), value.to_json()))
                .collect();
            JsonValue::Object(object)
        })
        .collect();

    serde_json::to_string_pretty(&rows)
        .map_err(|e| ReportError::internal(format!("Failed to serialize result: {e}")))
}

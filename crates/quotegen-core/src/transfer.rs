//! JSON import and export
//!
//! Export writes the whole collection as a pretty-printed JSON array.
//! Import accepts only a JSON array of `{text, category}` objects; any
//! problem rejects the file as a whole.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{QuoteError, QuoteResult};
use crate::models::Quote;

/// Serialize a collection for export
pub fn export_json(quotes: &[Quote]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(quotes)
}

/// Export file name with an embedded UTC timestamp
///
/// Format: `quotes_export_YYYY-MM-DD-HH-MM-SS.json`
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("quotes_export_{}.json", now.format("%Y-%m-%d-%H-%M-%S"))
}

/// Check the import file name carries a `.json` extension
pub fn check_import_path(path: &Path) -> QuoteResult<()> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        Ok(())
    } else {
        Err(QuoteError::ImportFormat(format!(
            "'{}' is not a .json file",
            path.display()
        )))
    }
}

/// Parse and validate an import payload
///
/// Every element must be an object whose `text` and `category` are strings
/// that are non-empty after trimming. Extra fields are ignored.
pub fn parse_import(content: &str) -> QuoteResult<Vec<Quote>> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| QuoteError::ImportFormat(format!("failed to parse JSON: {}", e)))?;

    let Value::Array(items) = value else {
        return Err(QuoteError::ImportFormat(
            "expected an array of {text, category} objects".to_string(),
        ));
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| parse_item(i, item))
        .collect()
}

fn parse_item(index: usize, item: &Value) -> QuoteResult<Quote> {
    let field = |name: &str| -> QuoteResult<String> {
        match item.get(name) {
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
            Some(Value::String(_)) => Err(QuoteError::ImportFormat(format!(
                "element {} has an empty \"{}\"",
                index, name
            ))),
            _ => Err(QuoteError::ImportFormat(format!(
                "element {} is not a {{text, category}} object with string \"{}\"",
                index, name
            ))),
        }
    };

    Ok(Quote::new(field("text")?, field("category")?))
}

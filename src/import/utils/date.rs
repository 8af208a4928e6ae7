use chrono::NaiveDate;

use crate::ir::FieldValue;

/// Parses a date cell with a chrono format string. Empty cells are absent.
pub fn date_cell(content: &str, format: &str) -> Option<FieldValue<NaiveDate>> {
    let content = content.trim();
    if content.is_empty() {
        return None;
    }
    Some(match NaiveDate::parse_from_str(content, format) {
        Ok(date) => FieldValue::Valid(date),
        Err(_) => FieldValue::Malformed(content.to_string()),
    })
}

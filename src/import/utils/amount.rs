use rust_decimal::Decimal;
use std::str::FromStr;

use crate::ir::FieldValue;

/// Parses a debit or credit cell. Empty cells are absent, comma decimal separators and
/// space thousand separators are accepted.
pub fn amount_cell(content: &str) -> Option<FieldValue<Decimal>> {
    let content = content.trim();
    if content.is_empty() {
        return None;
    }
    let normalized: String = content
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    Some(match Decimal::from_str(&normalized) {
        Ok(amount) => FieldValue::Valid(amount),
        Err(_) => FieldValue::Malformed(content.to_string()),
    })
}

/// Parses an amount stored as an integer number of cents.
pub fn amount_from_cents(content: &str) -> FieldValue<Decimal> {
    let content = content.trim();
    match content.parse::<i64>() {
        Ok(cents) if content.chars().all(|c| c.is_ascii_digit()) => {
            FieldValue::Valid(Decimal::new(cents, 2))
        }
        _ => FieldValue::Malformed(content.to_string()),
    }
}

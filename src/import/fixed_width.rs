use encoding_rs::Encoding;

use super::utils::{amount_from_cents, date_cell, decode_text};
use crate::error::DecodeError;
use crate::ir::PivotRow;

/// Closed range of character offsets, the first character of a line being 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpan {
    pub start: usize,
    pub end: usize,
}

impl FieldSpan {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    fn extract(&self, chars: &[char]) -> String {
        chars[self.start..=self.end].iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedWidthLayout {
    pub account: FieldSpan,
    pub journal: FieldSpan,
    pub date: FieldSpan,
    pub label: FieldSpan,
    /// 'C' for credit, 'D' for debit
    pub sign: FieldSpan,
    /// Unsigned amount in cents
    pub amount_cents: FieldSpan,
}

impl FixedWidthLayout {
    pub fn quadra() -> Self {
        Self {
            account: FieldSpan::new(1, 8),
            journal: FieldSpan::new(9, 10),
            date: FieldSpan::new(14, 19),
            label: FieldSpan::new(21, 40),
            sign: FieldSpan::new(41, 41),
            amount_cents: FieldSpan::new(42, 54),
        }
    }

    /// Lines shorter than this cannot hold every field.
    pub fn min_width(&self) -> usize {
        [
            self.account,
            self.journal,
            self.date,
            self.label,
            self.sign,
            self.amount_cents,
        ]
        .iter()
        .map(|span| span.end + 1)
        .max()
        .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct FixedWidthConfig {
    pub encoding: &'static Encoding,
    pub date_format: String,
    /// Only lines starting with this character are ledger lines.
    pub record_marker: char,
    pub layout: FixedWidthLayout,
}

pub fn decode(input: &[u8], config: &FixedWidthConfig) -> Result<Vec<PivotRow>, DecodeError> {
    let content = decode_text(input, config.encoding)?;
    let min_width = config.layout.min_width();
    let mut rows = Vec::new();
    for (index, raw_line) in content.lines().enumerate() {
        let line = index + 1;
        if !raw_line.starts_with(config.record_marker) {
            continue;
        }
        let chars: Vec<char> = raw_line.chars().collect();
        if chars.len() < min_width {
            log::debug!(
                "Line {line}: {} characters, expected at least {min_width}, skipped",
                chars.len()
            );
            continue;
        }
        let row = to_pivot(line, &chars, config)?;
        if row.has_no_movement() {
            log::debug!("Line {line}: no debit nor credit, skipped");
            continue;
        }
        rows.push(row);
    }
    Ok(rows)
}

fn to_pivot(
    line: usize,
    chars: &[char],
    config: &FixedWidthConfig,
) -> Result<PivotRow, DecodeError> {
    let layout = &config.layout;
    let text = |span: FieldSpan| Some(span.extract(chars)).filter(|s| !s.trim().is_empty());
    let amount = amount_from_cents(&layout.amount_cents.extract(chars));
    let mut row = PivotRow {
        line,
        journal: text(layout.journal),
        account: text(layout.account),
        date: date_cell(&layout.date.extract(chars), &config.date_format),
        name: text(layout.label),
        ..PivotRow::new(line)
    };
    match layout.sign.extract(chars).as_str() {
        "C" => row.credit = Some(amount),
        "D" => row.debit = Some(amount),
        flag => {
            return Err(DecodeError::BadSignFlag {
                line,
                flag: flag.to_string(),
            })
        }
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;
    use crate::ir::FieldValue;

    fn config() -> FixedWidthConfig {
        FixedWidthConfig {
            encoding: encoding_rs::WINDOWS_1252,
            date_format: "%d%m%y".to_string(),
            record_marker: 'M',
            layout: FixedWidthLayout::quadra(),
        }
    }

    /// Builds a Quadra ledger line.
    fn quadra_line(
        account: &str,
        journal: &str,
        date: &str,
        label: &str,
        sign: char,
        cents: &str,
    ) -> String {
        format!("M{account:<8}{journal:<2}000{date:<6}0{label:<20}{sign}{cents:0>13}")
    }

    #[test]
    fn layout_width() {
        assert_eq!(55, FixedWidthLayout::quadra().min_width());
        assert_eq!(55, quadra_line("411000", "VT", "150217", "x", 'D', "1").len());
    }

    #[test]
    fn debit_line() {
        let input = quadra_line("411000", "VT", "150217", "Facture 42", 'D', "000000012345");
        let rows = decode(input.as_bytes(), &config()).unwrap();
        assert_eq!(
            vec![PivotRow {
                line: 1,
                journal: Some("VT".to_string()),
                account: Some("411000  ".to_string()),
                date: Some(FieldValue::Valid(
                    NaiveDate::from_ymd_opt(2017, 2, 15).unwrap()
                )),
                name: Some(format!("{:<20}", "Facture 42")),
                debit: Some(FieldValue::Valid(Decimal::new(12345, 2))),
                credit: None,
                ..PivotRow::new(1)
            }],
            rows
        );
    }

    #[test]
    fn credit_line() {
        let input = quadra_line("707000", "VT", "150217", "Facture 42", 'C', "12345");
        let rows = decode(input.as_bytes(), &config()).unwrap();
        assert_eq!(None, rows[0].debit);
        assert_eq!(
            Some(FieldValue::Valid(Decimal::new(12345, 2))),
            rows[0].credit
        );
    }

    #[test]
    fn skips_other_records_and_short_lines() {
        let input = [
            "C411000  Clients".to_string(),
            quadra_line("411000", "VT", "150217", "Facture 42", 'D', "500"),
            "M411000  VT000150217".to_string(),
            "I000000000500ADM".to_string(),
            quadra_line("411000", "VT", "150217", "Nothing", 'D', "0"),
            quadra_line("707000", "VT", "150217", "Facture 42", 'C', "500"),
        ]
        .join("\r\n");
        let rows = decode(input.as_bytes(), &config()).unwrap();
        let lines: Vec<usize> = rows.iter().map(|row| row.line).collect();
        assert_eq!(vec![2, 6], lines);
    }

    #[test]
    fn accented_label() {
        let mut input = quadra_line("401000", "HA", "010324", "Caf", 'C', "999").into_bytes();
        // "Caf" followed by 0xE9 (é in windows-1252) replaces one padding space
        input[24] = 0xE9;
        let rows = decode(&input, &config()).unwrap();
        assert_eq!(Some(format!("{:<20}", "Caf\u{e9}")), rows[0].name);
    }

    #[test]
    fn bad_sign_flag() {
        let input = quadra_line("411000", "VT", "150217", "Facture 42", 'X', "500");
        assert!(matches!(
            decode(input.as_bytes(), &config()),
            Err(DecodeError::BadSignFlag { line: 1, flag }) if flag == "X"
        ));
    }
}

use csv::StringRecord;
use encoding_rs::Encoding;

use super::utils::{amount_cell, cell, date_cell, decode_text, read_records, sniff_delimiter};
use crate::error::DecodeError;
use crate::ir::PivotRow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelimiterChoice {
    Fixed(u8),
    /// Detect from the first line among these candidates.
    Sniff(Vec<u8>),
}

/// Column index of every pivot field. Fields without a column stay absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: Option<usize>,
    pub journal: Option<usize>,
    pub account: usize,
    pub partner: Option<usize>,
    pub analytic: Option<usize>,
    pub name: Option<usize>,
    pub debit: usize,
    pub credit: usize,
    pub reference: Option<usize>,
    pub reconcile_ref: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct DelimitedConfig {
    pub encoding: &'static Encoding,
    pub delimiter: DelimiterChoice,
    pub quoting: bool,
    pub skip_header: bool,
    pub date_format: String,
    pub columns: ColumnMap,
}

pub fn decode(input: &[u8], config: &DelimitedConfig) -> Result<Vec<PivotRow>, DecodeError> {
    let content = decode_text(input, config.encoding)?;
    if content.trim().is_empty() {
        log::info!("Input is empty");
        return Ok(Vec::new());
    }
    let delimiter = match &config.delimiter {
        DelimiterChoice::Fixed(delimiter) => *delimiter,
        DelimiterChoice::Sniff(candidates) => sniff_delimiter(&content, candidates)?,
    };
    let records = read_records(&content, delimiter, config.quoting)?;
    let skip = usize::from(config.skip_header);
    Ok(records
        .into_iter()
        .skip(skip)
        .map(|(line, record)| to_pivot(line, &record, config))
        .filter(|row| {
            if row.has_no_movement() {
                log::debug!("Line {}: no debit nor credit, skipped", row.line);
                false
            } else {
                true
            }
        })
        .collect())
}

fn to_pivot(line: usize, record: &StringRecord, config: &DelimitedConfig) -> PivotRow {
    let columns = &config.columns;
    let text = |index: Option<usize>| {
        index
            .map(|index| cell(record, index))
            .filter(|content| !content.is_empty())
            .map(str::to_string)
    };
    PivotRow {
        line,
        journal: text(columns.journal),
        account: text(Some(columns.account)),
        date: columns
            .date
            .and_then(|index| date_cell(cell(record, index), &config.date_format)),
        name: text(columns.name),
        debit: amount_cell(cell(record, columns.debit)),
        credit: amount_cell(cell(record, columns.credit)),
        reference: text(columns.reference),
        reconcile_ref: text(columns.reconcile_ref),
        partner: text(columns.partner),
        analytic: text(columns.analytic),
    }
}

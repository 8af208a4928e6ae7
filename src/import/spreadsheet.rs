use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rust_decimal::{prelude::FromPrimitive, Decimal, RoundingStrategy};

use super::utils::amount_cell;
use crate::error::DecodeError;
use crate::ir::{FieldValue, PivotRow};

/// Payroll spreadsheets carry no usable label, every line gets this one.
pub const PAYROLL_LABEL: &str = "Payroll";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetConfig {
    pub sheet_index: usize,
    pub skip_header: bool,
    pub account_column: usize,
    pub analytic_column: Option<usize>,
    pub debit_column: usize,
    pub credit_column: usize,
    pub label: String,
    /// Float cells are rounded to this many decimals.
    pub amount_decimals: u32,
}

impl SpreadsheetConfig {
    pub fn payfit() -> Self {
        Self {
            sheet_index: 1,
            skip_header: true,
            account_column: 0,
            analytic_column: Some(2),
            debit_column: 3,
            credit_column: 4,
            label: PAYROLL_LABEL.to_string(),
            amount_decimals: 2,
        }
    }
}

pub fn decode(input: &[u8], config: &SpreadsheetConfig) -> Result<Vec<PivotRow>, DecodeError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(input.to_vec()))
        .map_err(|err| DecodeError::Spreadsheet(err.to_string()))?;
    let range = workbook
        .worksheet_range_at(config.sheet_index)
        .ok_or(DecodeError::MissingSheet(config.sheet_index))?
        .map_err(|err| DecodeError::Spreadsheet(err.to_string()))?;
    let first_row = range
        .start()
        .map(|(row, _column)| row as usize)
        .unwrap_or_default();
    Ok(rows_to_pivot(
        range
            .rows()
            .enumerate()
            .map(|(index, cells)| (first_row + index + 1, cells)),
        config,
    ))
}

/// Maps sheet rows, numbered from 1, to pivot rows.
pub fn rows_to_pivot<'a>(
    rows: impl Iterator<Item = (usize, &'a [Data])>,
    config: &SpreadsheetConfig,
) -> Vec<PivotRow> {
    let skip = usize::from(config.skip_header);
    rows.skip(skip)
        .filter_map(|(line, cells)| to_pivot(line, cells, config))
        .collect()
}

fn to_pivot(line: usize, cells: &[Data], config: &SpreadsheetConfig) -> Option<PivotRow> {
    let account = cell_text(cells.get(config.account_column));
    if !account.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    // "421000.01" is a sub-account of 421000
    let account = account
        .split_once('.')
        .map_or(account.as_str(), |(account, _suffix)| account)
        .to_string();
    let row = PivotRow {
        line,
        account: Some(account),
        name: Some(config.label.clone()),
        analytic: config
            .analytic_column
            .map(|column| cell_text(cells.get(column)))
            .filter(|analytic| !analytic.is_empty()),
        debit: cell_amount(cells.get(config.debit_column), config.amount_decimals),
        credit: cell_amount(cells.get(config.credit_column), config.amount_decimals),
        ..PivotRow::new(line)
    };
    if row.has_no_movement() {
        log::debug!("Row {line}: no debit nor credit, skipped");
        return None;
    }
    Some(row)
}

fn cell_text(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) => String::new(),
        Some(Data::String(text)) => text.trim().to_string(),
        Some(Data::Int(value)) => value.to_string(),
        Some(Data::Float(value)) if value.fract() == 0.0 => format!("{value:.0}"),
        Some(other) => other.to_string(),
    }
}

fn cell_amount(cell: Option<&Data>, decimals: u32) -> Option<FieldValue<Decimal>> {
    match cell {
        None | Some(Data::Empty) => None,
        Some(Data::Float(value)) => Some(
            Decimal::from_f64(*value)
                .map(|amount| {
                    FieldValue::Valid(
                        amount
                            .round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
                            .normalize(),
                    )
                })
                .unwrap_or_else(|| FieldValue::Malformed(value.to_string())),
        ),
        Some(Data::Int(value)) => Some(FieldValue::Valid(Decimal::from(*value))),
        Some(Data::String(text)) => amount_cell(text),
        Some(other) => Some(FieldValue::Malformed(other.to_string())),
    }
}

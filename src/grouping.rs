use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::GroupingMode;
use crate::error::GroupingError;
use crate::ir::{is_zero_at, JournalId, Move, ResolvedRow};

/// Splits the resolved rows, in file order, into balanced moves of at least two lines.
///
/// A row continues the open move if it has the same journal, the running balance of the open
/// move is not zero yet, and, unless disabled by `mode`, it has the same date and (when the
/// reference is the unique key) the same reference. Every move is checked when it is closed,
/// including the last one.
pub fn group(
    rows: Vec<ResolvedRow>,
    mode: GroupingMode,
    currency_decimals: u32,
) -> Result<Vec<Move>, GroupingError> {
    let mut moves = Vec::new();
    let mut open: Option<OpenMove> = None;
    for row in rows {
        match &mut open {
            Some(current) if current.continues_with(&row, mode, currency_decimals) => {
                current.push(row);
            }
            _ => {
                if let Some(closed) = open.replace(OpenMove::new(row)) {
                    moves.push(closed.seal(currency_decimals)?);
                }
            }
        }
    }
    if let Some(closed) = open {
        moves.push(closed.seal(currency_decimals)?);
    }
    log::info!("Grouped the rows into {} moves", moves.len());
    Ok(moves)
}

struct OpenMove {
    journal_id: JournalId,
    date: NaiveDate,
    reference: Option<String>,
    balance: Decimal,
    lines: Vec<ResolvedRow>,
}

impl OpenMove {
    fn new(row: ResolvedRow) -> Self {
        Self {
            journal_id: row.journal_id,
            date: row.date,
            reference: row.reference.clone(),
            balance: row.balance_delta(),
            lines: vec![row],
        }
    }

    fn continues_with(&self, row: &ResolvedRow, mode: GroupingMode, decimals: u32) -> bool {
        row.journal_id == self.journal_id
            && !is_zero_at(self.balance, decimals)
            && (mode.date_by_line || row.date == self.date)
            && (!mode.reference_is_unique || row.reference == self.reference)
    }

    fn push(&mut self, row: ResolvedRow) {
        self.balance += row.balance_delta();
        self.lines.push(row);
    }

    fn seal(self, decimals: u32) -> Result<Move, GroupingError> {
        let last_line = self.lines.last().map(|row| row.line).unwrap_or_default();
        if !is_zero_at(self.balance, decimals) {
            return Err(GroupingError::Unbalanced {
                line: last_line,
                balance: self.balance,
            });
        }
        if self.lines.len() < 2 {
            return Err(GroupingError::SingleLine { line: last_line });
        }
        Ok(Move {
            journal_id: self.journal_id,
            date: self.date,
            reference: self.reference,
            lines: self.lines,
        })
    }
}

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::RunConfig;
use crate::ir::{AccountId, AnalyticAccountId, JournalId, Move, PartnerId, ResolvedRow};

/// Header of a move as handed to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveHeader {
    pub journal_id: JournalId,
    pub date: NaiveDate,
    pub reference: Option<String>,
    /// Move number forced to the reference. `None` lets the ledger number the move.
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveLinePayload {
    pub debit: Decimal,
    pub credit: Decimal,
    pub name: String,
    pub date: NaiveDate,
    pub account_id: AccountId,
    pub partner_id: Option<PartnerId>,
    pub analytic_account_id: Option<AnalyticAccountId>,
    pub reconcile_tag: Option<String>,
    /// Unique across imports: "{run sequence}-{source line}".
    pub external_id: String,
    pub source_line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovePayload {
    pub header: MoveHeader,
    pub lines: Vec<MoveLinePayload>,
}

impl MovePayload {
    /// Distinct reconciliation tags of the lines, in line order.
    pub fn reconcile_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = Vec::new();
        for tag in self.lines.iter().filter_map(|line| line.reconcile_tag.as_deref()) {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }
}

pub fn prepare_move(sealed: Move, config: &RunConfig) -> MovePayload {
    let name = if config.force_move_number {
        sealed.reference.clone()
    } else {
        None
    };
    MovePayload {
        header: MoveHeader {
            journal_id: sealed.journal_id,
            date: sealed.date,
            reference: sealed.reference,
            name,
        },
        lines: sealed
            .lines
            .into_iter()
            .map(|row| line_to_payload(row, config.run_sequence))
            .collect(),
    }
}

fn line_to_payload(row: ResolvedRow, run_sequence: u64) -> MoveLinePayload {
    MoveLinePayload {
        debit: row.debit,
        credit: row.credit,
        name: row.name,
        date: row.date,
        account_id: row.account_id,
        partner_id: row.partner_id,
        analytic_account_id: row.analytic_account_id,
        reconcile_tag: row.reconcile_ref,
        external_id: format!("{run_sequence}-{}", row.line),
        source_line: row.line,
    }
}

use std::collections::HashSet;

use anyhow::{anyhow, bail, Result};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::export::MovePayload;
use crate::ir::{AccountId, PartnerId};
use crate::master_data::MasterDataFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MoveId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LineId(pub u64);

/// A move line as stored in the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerLine {
    pub id: LineId,
    pub move_id: MoveId,
    pub account_id: AccountId,
    pub partner_id: Option<PartnerId>,
    pub debit: Decimal,
    pub credit: Decimal,
    pub reconcile_tag: Option<String>,
}

/// The general ledger the moves are written to.
pub trait Ledger {
    /// Creates the move with all its lines, atomically.
    fn create_move(&mut self, payload: &MovePayload) -> Result<MoveId>;
    fn post_move(&mut self, id: MoveId) -> Result<()>;
    /// Lines of the given moves carrying the reconciliation tag.
    fn find_lines_by_tag(&self, tag: &str, moves: &[MoveId]) -> Result<Vec<LedgerLine>>;
    fn account_allows_reconcile(&self, account: AccountId) -> Result<bool>;
    fn link_lines(&mut self, lines: &[LineId]) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMove {
    pub id: MoveId,
    pub payload: MovePayload,
    pub posted: bool,
}

/// Ledger kept in memory. Used for dry runs and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    moves: Vec<StoredMove>,
    lines: Vec<LedgerLine>,
    reconcilable_accounts: HashSet<AccountId>,
    links: Vec<Vec<LineId>>,
}

impl MemoryLedger {
    pub fn new(reconcilable_accounts: impl IntoIterator<Item = AccountId>) -> Self {
        Self {
            reconcilable_accounts: reconcilable_accounts.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn from_master_data(master: &MasterDataFile) -> Self {
        Self::new(
            master
                .accounts
                .iter()
                .filter(|account| account.reconcile)
                .map(|account| account.id),
        )
    }

    pub fn moves(&self) -> &[StoredMove] {
        &self.moves
    }

    /// Every successful link call, in order.
    pub fn links(&self) -> &[Vec<LineId>] {
        &self.links
    }

    fn next_line_id(&self) -> LineId {
        LineId(self.lines.len() as u64 + 1)
    }
}

impl Ledger for MemoryLedger {
    fn create_move(&mut self, payload: &MovePayload) -> Result<MoveId> {
        let id = MoveId(self.moves.len() as u64 + 1);
        for line in &payload.lines {
            let line_id = self.next_line_id();
            self.lines.push(LedgerLine {
                id: line_id,
                move_id: id,
                account_id: line.account_id,
                partner_id: line.partner_id,
                debit: line.debit,
                credit: line.credit,
                reconcile_tag: line.reconcile_tag.clone(),
            });
        }
        self.moves.push(StoredMove {
            id,
            payload: payload.clone(),
            posted: false,
        });
        Ok(id)
    }

    fn post_move(&mut self, id: MoveId) -> Result<()> {
        let stored = self
            .moves
            .iter_mut()
            .find(|stored| stored.id == id)
            .ok_or_else(|| anyhow!("Move {id:?} does not exist"))?;
        stored.posted = true;
        Ok(())
    }

    fn find_lines_by_tag(&self, tag: &str, moves: &[MoveId]) -> Result<Vec<LedgerLine>> {
        Ok(self
            .lines
            .iter()
            .filter(|line| line.reconcile_tag.as_deref() == Some(tag))
            .filter(|line| moves.contains(&line.move_id))
            .cloned()
            .collect())
    }

    fn account_allows_reconcile(&self, account: AccountId) -> Result<bool> {
        Ok(self.reconcilable_accounts.contains(&account))
    }

    fn link_lines(&mut self, lines: &[LineId]) -> Result<()> {
        let known = 1..=self.lines.len() as u64;
        if let Some(unknown) = lines.iter().find(|id| !known.contains(&id.0)) {
            bail!("Line {unknown:?} does not exist");
        }
        self.links.push(lines.to_vec());
        Ok(())
    }
}

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::error::{EntityKind, LineProblem, ResolutionReport};
use crate::ir::{
    AccountId, AnalyticAccountId, FieldValue, JournalId, PartnerId, PivotRow, ResolvedRow,
};
use crate::master_data::MasterData;

/// Matches every code of every row against the master data and checks the required fields.
/// All problems of all rows are collected, the run fails once with the whole report.
pub fn resolve(
    rows: Vec<PivotRow>,
    master: &impl MasterData,
) -> Result<Vec<ResolvedRow>, ResolutionReport> {
    let mut resolver = Resolver::new(master);
    let resolved: Vec<ResolvedRow> = rows
        .into_iter()
        .filter_map(|row| resolver.resolve_row(row))
        .collect();
    let mut report = resolver.report;
    if report.is_empty() {
        Ok(resolved)
    } else {
        report.sort();
        Err(report)
    }
}

struct Resolver<'a, M: MasterData> {
    master: &'a M,
    accounts: HashMap<String, Option<AccountId>>,
    cache: HashMap<(EntityKind, String), Option<u64>>,
    report: ResolutionReport,
}

impl<'a, M: MasterData> Resolver<'a, M> {
    fn new(master: &'a M) -> Self {
        Self {
            master,
            accounts: HashMap::new(),
            cache: HashMap::new(),
            report: ResolutionReport::default(),
        }
    }

    fn resolve_row(&mut self, row: PivotRow) -> Option<ResolvedRow> {
        let line = row.line;

        let account_id = match &row.account {
            Some(code) => self.account(code, line),
            None => self.problem(line, LineProblem::MissingAccount),
        };
        let journal_id = match &row.journal {
            Some(code) => self
                .lookup(EntityKind::Journal, code, line, |master, code| {
                    master.journal(code).map(|id| id.0)
                })
                .map(JournalId),
            None => self.problem(line, LineProblem::MissingJournal),
        };
        // Optional codes: absent is fine, present but unknown is an error.
        let mut optional_failed = false;
        let partner_id = row.partner.as_deref().and_then(|code| {
            let id = self.lookup(EntityKind::Partner, code, line, |master, code| {
                master.partner(code).map(|id| id.0)
            });
            optional_failed |= id.is_none();
            id.map(PartnerId)
        });
        let analytic_account_id = row.analytic.as_deref().and_then(|code| {
            let id = self.lookup(EntityKind::AnalyticAccount, code, line, |master, code| {
                master.analytic_account(code).map(|id| id.0)
            });
            optional_failed |= id.is_none();
            id.map(AnalyticAccountId)
        });

        let name = match row.name {
            Some(name) => Some(name),
            None => self.problem(line, LineProblem::MissingLabel),
        };
        let date = match row.date {
            Some(FieldValue::Valid(date)) => Some(date),
            Some(FieldValue::Malformed(raw)) => {
                self.problem(line, LineProblem::MalformedDate(raw))
            }
            None => self.problem(line, LineProblem::MissingDate),
        };
        let debit = self.amount(row.debit, line, LineProblem::MalformedDebit);
        let credit = self.amount(row.credit, line, LineProblem::MalformedCredit);
        let (debit, credit) = match (debit, credit) {
            (Some(debit), Some(credit)) => self.check_amounts(debit, credit, line)?,
            _ => return None,
        };

        if optional_failed {
            return None;
        }
        Some(ResolvedRow {
            line,
            journal_id: journal_id?,
            account_id: account_id?,
            partner_id,
            analytic_account_id,
            date: date?,
            name: name?,
            debit,
            credit,
            reference: row.reference,
            reconcile_ref: row.reconcile_ref,
        })
    }

    fn problem<T>(&mut self, line: usize, problem: LineProblem) -> Option<T> {
        self.report.add_problem(line, problem);
        None
    }

    fn amount(
        &mut self,
        amount: Option<FieldValue<Decimal>>,
        line: usize,
        malformed: fn(String) -> LineProblem,
    ) -> Option<Decimal> {
        match amount {
            None => Some(Decimal::ZERO),
            Some(FieldValue::Valid(amount)) => Some(amount),
            Some(FieldValue::Malformed(raw)) => self.problem(line, malformed(raw)),
        }
    }

    fn check_amounts(
        &mut self,
        debit: Decimal,
        credit: Decimal,
        line: usize,
    ) -> Option<(Decimal, Decimal)> {
        if debit < Decimal::ZERO || credit < Decimal::ZERO {
            return self.problem(line, LineProblem::NegativeAmount);
        }
        if !debit.is_zero() && !credit.is_zero() {
            return self.problem(line, LineProblem::DebitAndCredit);
        }
        Some((debit, credit))
    }

    fn lookup(
        &mut self,
        kind: EntityKind,
        code: &str,
        line: usize,
        find: impl FnOnce(&M, &str) -> Option<u64>,
    ) -> Option<u64> {
        let master = self.master;
        let id = *self
            .cache
            .entry((kind, code.to_lowercase()))
            .or_insert_with(|| find(master, code));
        if id.is_none() {
            self.report.add_unmatched(kind, code, line);
        }
        id
    }

    fn account(&mut self, code: &str, line: usize) -> Option<AccountId> {
        let master = self.master;
        let id = *self
            .accounts
            .entry(code.to_lowercase())
            .or_insert_with(|| match_account(master, code));
        if id.is_none() {
            self.report.add_unmatched(EntityKind::Account, code, line);
        }
        id
    }
}

/// Exact match first. Then, since charts of accounts are often exported with a different
/// number of digits, "61100000" may match "611000" by dropping trailing zeros, and "611000"
/// may match the first stored account whose code starts with it.
pub fn match_account(master: &impl MasterData, code: &str) -> Option<AccountId> {
    if let Some(id) = master.account(code) {
        return Some(id);
    }

    let mut shortened = code;
    while shortened.len() > 1 && shortened.ends_with('0') {
        shortened = &shortened[..shortened.len() - 1];
        if let Some(id) = master.account(shortened) {
            log::debug!("Account code {code} matched {shortened} without trailing zeros");
            return Some(id);
        }
    }

    let lowercase_code = code.to_lowercase();
    let found = master
        .accounts()
        .into_iter()
        .find(|(stored, _)| stored.to_lowercase().starts_with(&lowercase_code));
    if let Some((stored, id)) = found {
        log::warn!("Approximate match: account code {code} matched account {stored}");
        return Some(id);
    }
    None
}

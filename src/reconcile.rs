use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::ir::{is_zero_at, AccountId, PartnerId};
use crate::ledger::{Ledger, LedgerLine, LineId, MoveId};

/// Why a cluster of tagged lines was not linked. Never fatal for the run.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ReconcileWarning {
    #[error("only {0} line(s) carry the tag")]
    TooFewLines(usize),
    #[error("the lines are not balanced (balance is {0})")]
    Unbalanced(Decimal),
    #[error("the lines use {0} different accounts")]
    SeveralAccounts(usize),
    #[error("account {0:?} does not allow reconciliation")]
    NotReconcilable(AccountId),
    #[error("the lines have {0} different partners")]
    SeveralPartners(usize),
    #[error("ledger error: {0}")]
    Ledger(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ReconcileOutcome {
    Linked { tag: String, lines: Vec<LineId> },
    Skipped { tag: String, warning: ReconcileWarning },
}

/// Links, for each tag, the lines of the given moves carrying it, if they settle each other.
/// Every tag is handled on its own and failures only skip the tag.
pub fn reconcile<'a>(
    ledger: &mut impl Ledger,
    tags: impl IntoIterator<Item = &'a str>,
    moves: &[MoveId],
    currency_decimals: u32,
) -> Vec<ReconcileOutcome> {
    let tags: BTreeSet<&str> = tags.into_iter().filter(|tag| !tag.is_empty()).collect();
    tags.into_iter()
        .map(|tag| match reconcile_tag(ledger, tag, moves, currency_decimals) {
            Ok(lines) => ReconcileOutcome::Linked {
                tag: tag.to_string(),
                lines,
            },
            Err(warning) => {
                log::warn!("Reconciliation of '{tag}' skipped: {warning}");
                ReconcileOutcome::Skipped {
                    tag: tag.to_string(),
                    warning,
                }
            }
        })
        .collect()
}

fn reconcile_tag(
    ledger: &mut impl Ledger,
    tag: &str,
    moves: &[MoveId],
    currency_decimals: u32,
) -> Result<Vec<LineId>, ReconcileWarning> {
    let lines = ledger
        .find_lines_by_tag(tag, moves)
        .map_err(|err| ReconcileWarning::Ledger(format!("{err:#}")))?;
    let account = check_cluster(&lines, currency_decimals)?;
    let allowed = ledger
        .account_allows_reconcile(account)
        .map_err(|err| ReconcileWarning::Ledger(format!("{err:#}")))?;
    if !allowed {
        return Err(ReconcileWarning::NotReconcilable(account));
    }
    let ids: Vec<LineId> = lines.iter().map(|line| line.id).collect();
    ledger
        .link_lines(&ids)
        .map_err(|err| ReconcileWarning::Ledger(format!("{err:#}")))?;
    log::info!("Reconciled {} lines tagged '{tag}'", ids.len());
    Ok(ids)
}

/// Checks the invariants that do not need the ledger and returns the single account.
fn check_cluster(
    lines: &[LedgerLine],
    currency_decimals: u32,
) -> Result<AccountId, ReconcileWarning> {
    if lines.len() < 2 {
        return Err(ReconcileWarning::TooFewLines(lines.len()));
    }
    let balance: Decimal = lines.iter().map(|line| line.credit - line.debit).sum();
    if !is_zero_at(balance, currency_decimals) {
        return Err(ReconcileWarning::Unbalanced(balance));
    }
    let accounts: BTreeSet<AccountId> = lines.iter().map(|line| line.account_id).collect();
    let account = match accounts.first() {
        Some(account) if accounts.len() == 1 => *account,
        _ => return Err(ReconcileWarning::SeveralAccounts(accounts.len())),
    };
    let partners: BTreeSet<Option<PartnerId>> = lines.iter().map(|line| line.partner_id).collect();
    if partners.len() > 1 {
        return Err(ReconcileWarning::SeveralPartners(partners.len()));
    }
    Ok(account)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::export::{MoveHeader, MoveLinePayload, MovePayload};
    use crate::ir::JournalId;
    use crate::ledger::MemoryLedger;

    const RECEIVABLE: AccountId = AccountId(1);
    const SALES: AccountId = AccountId(2);

    fn line(
        account: AccountId,
        partner: Option<u64>,
        debit: i64,
        credit: i64,
        tag: Option<&str>,
    ) -> MoveLinePayload {
        MoveLinePayload {
            debit: Decimal::new(debit, 2),
            credit: Decimal::new(credit, 2),
            name: "Line".to_string(),
            date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            account_id: account,
            partner_id: partner.map(PartnerId),
            analytic_account_id: None,
            reconcile_tag: tag.map(str::to_string),
            external_id: "1-1".to_string(),
            source_line: 1,
        }
    }

    fn create(ledger: &mut MemoryLedger, lines: Vec<MoveLinePayload>) -> MoveId {
        ledger
            .create_move(&MovePayload {
                header: MoveHeader {
                    journal_id: JournalId(10),
                    date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                    reference: None,
                    name: None,
                },
                lines,
            })
            .unwrap()
    }

    /// An invoice and its payment, both on the receivable account, tagged REC1.
    fn invoice_and_payment(
        ledger: &mut MemoryLedger,
        partners: (Option<u64>, Option<u64>),
        paid: i64,
    ) -> Vec<MoveId> {
        let invoice = create(
            ledger,
            vec![
                line(RECEIVABLE, partners.0, 5000, 0, Some("REC1")),
                line(SALES, None, 0, 5000, None),
            ],
        );
        let payment = create(
            ledger,
            vec![
                line(RECEIVABLE, partners.1, 0, paid, Some("REC1")),
                line(AccountId(3), None, paid, 0, None),
            ],
        );
        vec![invoice, payment]
    }

    #[test]
    fn links_a_settled_pair() {
        let mut ledger = MemoryLedger::new([RECEIVABLE]);
        let moves = invoice_and_payment(&mut ledger, (Some(7), Some(7)), 5000);
        let outcomes = reconcile(&mut ledger, ["REC1", "REC1"], &moves, 2);
        assert_eq!(
            vec![ReconcileOutcome::Linked {
                tag: "REC1".to_string(),
                lines: vec![LineId(1), LineId(3)],
            }],
            outcomes
        );
        assert_eq!(&[vec![LineId(1), LineId(3)]], ledger.links());
    }

    #[test]
    fn mixed_partners_are_not_linked() {
        let mut ledger = MemoryLedger::new([RECEIVABLE]);
        let moves = invoice_and_payment(&mut ledger, (Some(7), Some(8)), 5000);
        let outcomes = reconcile(&mut ledger, ["REC1"], &moves, 2);
        assert_eq!(
            vec![ReconcileOutcome::Skipped {
                tag: "REC1".to_string(),
                warning: ReconcileWarning::SeveralPartners(2),
            }],
            outcomes
        );
        assert!(ledger.links().is_empty());
    }

    #[test]
    fn partner_on_one_side_only_is_mixed() {
        let mut ledger = MemoryLedger::new([RECEIVABLE]);
        let moves = invoice_and_payment(&mut ledger, (Some(7), None), 5000);
        let outcomes = reconcile(&mut ledger, ["REC1"], &moves, 2);
        assert!(matches!(
            &outcomes[0],
            ReconcileOutcome::Skipped {
                warning: ReconcileWarning::SeveralPartners(2),
                ..
            }
        ));
    }

    #[test]
    fn no_partner_at_all_is_fine() {
        let mut ledger = MemoryLedger::new([RECEIVABLE]);
        let moves = invoice_and_payment(&mut ledger, (None, None), 5000);
        let outcomes = reconcile(&mut ledger, ["REC1"], &moves, 2);
        assert!(matches!(&outcomes[0], ReconcileOutcome::Linked { .. }));
    }

    #[test]
    fn partial_payment_is_unbalanced() {
        let mut ledger = MemoryLedger::new([RECEIVABLE]);
        let moves = invoice_and_payment(&mut ledger, (Some(7), Some(7)), 3000);
        let outcomes = reconcile(&mut ledger, ["REC1"], &moves, 2);
        assert_eq!(
            vec![ReconcileOutcome::Skipped {
                tag: "REC1".to_string(),
                warning: ReconcileWarning::Unbalanced(Decimal::new(-2000, 2)),
            }],
            outcomes
        );
    }

    #[test]
    fn account_must_allow_reconciliation() {
        let mut ledger = MemoryLedger::default();
        let moves = invoice_and_payment(&mut ledger, (Some(7), Some(7)), 5000);
        let outcomes = reconcile(&mut ledger, ["REC1"], &moves, 2);
        assert_eq!(
            vec![ReconcileOutcome::Skipped {
                tag: "REC1".to_string(),
                warning: ReconcileWarning::NotReconcilable(RECEIVABLE),
            }],
            outcomes
        );
    }

    #[test]
    fn several_accounts_and_lonely_lines() {
        let mut ledger = MemoryLedger::new([RECEIVABLE, SALES]);
        let moves = vec![
            create(
                &mut ledger,
                vec![
                    line(RECEIVABLE, None, 5000, 0, Some("A")),
                    line(SALES, None, 0, 5000, Some("A")),
                ],
            ),
            create(
                &mut ledger,
                vec![
                    line(RECEIVABLE, None, 1000, 0, Some("B")),
                    line(SALES, None, 0, 1000, None),
                ],
            ),
        ];
        let outcomes = reconcile(&mut ledger, ["B", "A", ""], &moves, 2);
        assert_eq!(
            vec![
                ReconcileOutcome::Skipped {
                    tag: "A".to_string(),
                    warning: ReconcileWarning::SeveralAccounts(2),
                },
                ReconcileOutcome::Skipped {
                    tag: "B".to_string(),
                    warning: ReconcileWarning::TooFewLines(1),
                },
            ],
            outcomes
        );
    }

    #[test]
    fn only_lines_of_this_run() {
        let mut ledger = MemoryLedger::new([RECEIVABLE]);
        let moves = invoice_and_payment(&mut ledger, (None, None), 5000);
        let outcomes = reconcile(&mut ledger, ["REC1"], &moves[1..], 2);
        assert!(matches!(
            &outcomes[0],
            ReconcileOutcome::Skipped {
                warning: ReconcileWarning::TooFewLines(1),
                ..
            }
        ));
    }
}

use rust_decimal::Decimal;

use crate::config::Overrides;
use crate::ir::{FieldValue, PivotRow};

/// Applies the forced values of the run, trims every text field (blank becomes absent), and
/// turns absent amounts into zero. Idempotent.
pub fn normalize(rows: &mut [PivotRow], overrides: &Overrides) {
    for row in rows {
        normalize_row(row, overrides);
    }
}

fn normalize_row(row: &mut PivotRow, overrides: &Overrides) {
    if let Some(date) = overrides.date {
        row.date = Some(FieldValue::Valid(date));
    }
    if let Some(label) = &overrides.label {
        row.name = Some(label.clone());
    }
    if let Some(reference) = &overrides.reference {
        row.reference = Some(reference.clone());
    }
    if let Some(journal) = &overrides.journal {
        row.journal = Some(journal.clone());
    }

    for field in [
        &mut row.journal,
        &mut row.account,
        &mut row.name,
        &mut row.reference,
        &mut row.reconcile_ref,
        &mut row.partner,
        &mut row.analytic,
    ] {
        trim(field);
    }

    for amount in [&mut row.debit, &mut row.credit] {
        if amount.is_none() {
            *amount = Some(FieldValue::Valid(Decimal::ZERO));
        }
    }
}

fn trim(field: &mut Option<String>) {
    *field = field
        .take()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
}

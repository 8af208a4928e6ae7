use std::collections::HashMap;

use anyhow::{Context as _, Result};
use console::{pad_str, style, Alignment, StyledObject};
use rust_decimal::Decimal;

use crate::args::Args;
use crate::config::RunConfig;
use crate::export::{MoveLinePayload, MovePayload};
use crate::ir::{AccountId, JournalId};
use crate::ledger::MemoryLedger;
use crate::master_data::{InMemoryMasterData, MasterDataFile};
use crate::pipeline::{plan_import, run_import, CreatedMove, ImportSummary};
use crate::reconcile::ReconcileOutcome;
use crate::terminal::{BulletPointPrinter, LineWriter};

pub fn main(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    let config = args.apply_to(config);
    let master_file = MasterDataFile::load(&args.master_data)?;
    let master = InMemoryMasterData::new(&master_file);
    let input = std::fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    log::info!("Importing {} as {:?}", args.input.display(), config.format);

    let codes = Codes::new(&master_file);
    let printer = BulletPointPrinter::new_stdout();
    if args.dry_run {
        let payloads = plan_import(&input, &config, &master)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&payloads)?);
        } else {
            println!("{}", style_header("Entries to create:"));
            print_planned(&printer, &codes, &payloads);
        }
    } else {
        let mut ledger = MemoryLedger::from_master_data(&master_file);
        let summary = run_import(&input, &config, &master, &mut ledger)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!("{}", style_header("Created entries:"));
            print_summary(&printer, &codes, &summary);
        }
    }
    Ok(())
}

/// Codes of the master data by id, for display.
struct Codes<'a> {
    accounts: HashMap<AccountId, &'a str>,
    journals: HashMap<JournalId, &'a str>,
}

impl<'a> Codes<'a> {
    fn new(master: &'a MasterDataFile) -> Self {
        Self {
            accounts: master
                .accounts
                .iter()
                .map(|account| (account.id, account.code.as_str()))
                .collect(),
            journals: master
                .journals
                .iter()
                .map(|journal| (journal.id, journal.code.as_str()))
                .collect(),
        }
    }

    fn account(&self, id: AccountId) -> String {
        self.accounts
            .get(&id)
            .map_or_else(|| format!("#{}", id.0), |code| code.to_string())
    }

    fn journal(&self, id: JournalId) -> String {
        self.journals
            .get(&id)
            .map_or_else(|| format!("#{}", id.0), |code| code.to_string())
    }
}

fn print_planned<W: LineWriter + Clone>(
    printer: &BulletPointPrinter<W>,
    codes: &Codes,
    payloads: &[MovePayload],
) {
    if payloads.is_empty() {
        printer.print_item(style("(none)").italic());
    }
    for payload in payloads {
        print_move(printer, codes, payload, "");
    }
}

fn print_summary<W: LineWriter + Clone>(
    printer: &BulletPointPrinter<W>,
    codes: &Codes,
    summary: &ImportSummary,
) {
    if summary.moves.is_empty() {
        printer.print_item(style("(none)").italic());
    }
    for CreatedMove {
        id,
        posted,
        payload,
    } in &summary.moves
    {
        let status = if *posted { "posted" } else { "draft" };
        print_move(printer, codes, payload, &format!(" #{} {status}", id.0));
    }
    if !summary.reconciliations.is_empty() {
        printer.print_text(style_header("Reconciliations:"));
        for outcome in &summary.reconciliations {
            printer.print_item(style_outcome(outcome));
        }
    }
}

fn print_move<W: LineWriter + Clone>(
    printer: &BulletPointPrinter<W>,
    codes: &Codes,
    payload: &MovePayload,
    suffix: &str,
) {
    let header = &payload.header;
    printer.print_item(format!(
        "{} {} {}{}",
        style_journal(&codes.journal(header.journal_id)),
        style_date(&header.date),
        style_reference(header.name.as_deref().or(header.reference.as_deref())),
        suffix,
    ));
    let printer = printer.indent();
    for line in &payload.lines {
        print_line(&printer, codes, line);
    }
}

fn print_line<W: LineWriter + Clone>(
    printer: &BulletPointPrinter<W>,
    codes: &Codes,
    line: &MoveLinePayload,
) {
    let tag = line
        .reconcile_tag
        .as_ref()
        .map(|tag| format!(" [{tag}]"))
        .unwrap_or_default();
    printer.print_item(format!(
        "{} {} {} {}{}",
        pad_str(
            &style_account(&codes.account(line.account_id)).to_string(),
            10,
            Alignment::Left,
            None
        ),
        pad_str(
            &style_amount(line.debit, true).to_string(),
            12,
            Alignment::Right,
            None
        ),
        pad_str(
            &style_amount(line.credit, false).to_string(),
            12,
            Alignment::Right,
            None
        ),
        style_label(&line.name),
        style_tag(&tag),
    ));
}

fn style_header(header: &str) -> StyledObject<&str> {
    style(header).bold().underlined()
}

fn style_journal(journal: &str) -> StyledObject<&str> {
    style(journal).cyan().bold()
}

fn style_date(date: &chrono::NaiveDate) -> StyledObject<String> {
    style(date.format("%Y-%m-%d").to_string())
}

fn style_reference(reference: Option<&str>) -> StyledObject<&str> {
    style(reference.unwrap_or("")).yellow()
}

fn style_account(account: &str) -> StyledObject<&str> {
    style(account).magenta()
}

fn style_amount(amount: Decimal, is_debit: bool) -> StyledObject<String> {
    if amount.is_zero() {
        return style(String::new());
    }
    let result = style(amount.to_string()).bold();
    if is_debit {
        result.green()
    } else {
        result.red()
    }
}

fn style_label(label: &str) -> StyledObject<&str> {
    style(label).italic()
}

fn style_tag(tag: &str) -> StyledObject<&str> {
    style(tag).blue()
}

fn style_outcome(outcome: &ReconcileOutcome) -> String {
    match outcome {
        ReconcileOutcome::Linked { tag, lines } => {
            format!("{} {} lines linked", style(tag).blue(), lines.len())
        }
        ReconcileOutcome::Skipped { tag, warning } => {
            format!("{} skipped: {}", style(tag).blue(), style(warning).red())
        }
    }
}

use anyhow::Context;
use serde::Serialize;

use crate::config::RunConfig;
use crate::error::ImportError;
use crate::export::{prepare_move, MovePayload};
use crate::grouping::group;
use crate::import::{decode, DecoderConfig};
use crate::ledger::{Ledger, MoveId};
use crate::master_data::MasterData;
use crate::normalize::normalize;
use crate::reconcile::{reconcile, ReconcileOutcome};
use crate::resolve::resolve;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedMove {
    pub id: MoveId,
    pub posted: bool,
    pub payload: MovePayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub moves: Vec<CreatedMove>,
    pub reconciliations: Vec<ReconcileOutcome>,
}

/// Decodes, validates and groups the whole file in memory. Nothing is written anywhere, so a
/// file with any problem produces no move at all.
pub fn plan_import(
    input: &[u8],
    config: &RunConfig,
    master: &impl MasterData,
) -> Result<Vec<MovePayload>, ImportError> {
    let decoder = DecoderConfig::for_run(config)?;
    let mut rows = decode(input, &decoder)?;
    normalize(&mut rows, &config.overrides);
    let resolved = resolve(rows, master)?;
    let moves = group(resolved, config.grouping, config.currency_decimals)?;
    Ok(moves
        .into_iter()
        .map(|sealed| prepare_move(sealed, config))
        .collect())
}

/// Plans the import, then creates (and optionally posts) every move and reconciles the tagged
/// lines among the moves created by this run.
pub fn run_import(
    input: &[u8],
    config: &RunConfig,
    master: &impl MasterData,
    ledger: &mut impl Ledger,
) -> Result<ImportSummary, ImportError> {
    let payloads = plan_import(input, config, master)?;

    let mut moves = Vec::with_capacity(payloads.len());
    for payload in payloads {
        let id = ledger.create_move(&payload).with_context(|| {
            format!(
                "Failed to create the entry for lines {}",
                source_lines(&payload)
            )
        })?;
        log::info!("Created entry {id:?} with {} lines", payload.lines.len());
        if config.post_moves {
            ledger
                .post_move(id)
                .with_context(|| format!("Failed to post entry {id:?}"))?;
        }
        moves.push(CreatedMove {
            id,
            posted: config.post_moves,
            payload,
        });
    }

    let ids: Vec<MoveId> = moves.iter().map(|created| created.id).collect();
    let reconciliations = reconcile(
        ledger,
        moves
            .iter()
            .flat_map(|created| created.payload.reconcile_tags()),
        &ids,
        config.currency_decimals,
    );
    Ok(ImportSummary {
        moves,
        reconciliations,
    })
}

fn source_lines(payload: &MovePayload) -> String {
    match (payload.lines.first(), payload.lines.last()) {
        (Some(first), Some(last)) => format!("{}-{}", first.source_line, last.source_line),
        _ => String::new(),
    }
}

pub mod args;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod grouping;
pub mod import;
pub mod ir;
pub mod ledger;
pub mod master_data;
pub mod normalize;
pub mod pipeline;
pub mod reconcile;
pub mod resolve;
pub mod terminal;

pub use config::{ImportFormat, RunConfig};
pub use error::ImportError;
pub use pipeline::{plan_import, run_import, ImportSummary};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Source formats understood by the importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ImportFormat {
    /// date,journal,account,partner,analytic,name,debit,credit,ref,reconcile_ref
    #[default]
    GenericCsv,
    /// French "Fichier des Écritures Comptables" text export
    Fec,
    /// Ciel Paye payroll export
    CielPaye,
    /// In Extenso export
    Extenso,
    /// Quadra fixed-width export
    Quadra,
    /// Payfit payroll spreadsheet
    Payfit,
}

/// Values forced onto every row, whatever the file says.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overrides {
    pub date: Option<NaiveDate>,
    pub label: Option<String>,
    pub reference: Option<String>,
    pub journal: Option<String>,
}

/// Controls how the grouper decides that a row starts a new journal entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingMode {
    /// Rows of one entry share the same reference, and a new reference starts a new entry.
    pub reference_is_unique: bool,
    /// Rows of one entry may carry different dates.
    pub date_by_line: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub format: ImportFormat,
    /// Encoding label (e.g. "utf-8", "iso-8859-15"). Defaults per format.
    pub encoding: Option<String>,
    /// chrono format string for dates. Defaults per format.
    pub date_format: Option<String>,
    /// Delimiter for delimited formats. Sniffed or defaulted per format if absent.
    pub delimiter: Option<char>,
    /// Whether the first line is a header. Defaults per format.
    pub skip_header: Option<bool>,
    pub overrides: Overrides,
    pub grouping: GroupingMode,
    /// Use the entry reference as the entry number in the ledger.
    pub force_move_number: bool,
    /// Post the entries once they are created.
    pub post_moves: bool,
    /// Number of decimals of the company currency, used for every balance check.
    pub currency_decimals: u32,
    /// Sequence number of this import, combined with line numbers into external ids.
    pub run_sequence: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            format: ImportFormat::default(),
            encoding: None,
            date_format: None,
            delimiter: None,
            skip_header: None,
            overrides: Overrides::default(),
            grouping: GroupingMode::default(),
            force_move_number: false,
            post_moves: false,
            currency_decimals: 2,
            run_sequence: 1,
        }
    }
}

impl RunConfig {
    pub fn new(format: ImportFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read run config {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse run config {}", path.display()))
    }
}

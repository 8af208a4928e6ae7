use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

use crate::config::{ImportFormat, RunConfig};

/// Import accounting entries from an export file into the general ledger.
#[derive(Parser, Debug)]
pub struct Args {
    /// Path to the file to import
    #[clap(short, long)]
    pub input: PathBuf,

    /// Format of the file. Overrides the run config file.
    #[clap(short, long, value_enum)]
    pub format: Option<ImportFormat>,

    /// YAML file with the accounts, journals, partners and analytic accounts of the ledger
    #[clap(short, long)]
    pub master_data: PathBuf,

    /// YAML run config. Flags given on the command line take precedence.
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Character encoding label of the file, e.g. "iso-8859-15"
    #[clap(long)]
    pub encoding: Option<String>,

    /// Date pattern, e.g. "%d/%m/%Y"
    #[clap(long)]
    pub date_format: Option<String>,

    /// Field delimiter, disables delimiter detection
    #[clap(long)]
    pub delimiter: Option<char>,

    /// The first line of the file is a header
    #[clap(long)]
    pub skip_header: bool,

    /// Date of every entry, as YYYY-MM-DD
    #[clap(long)]
    pub force_date: Option<NaiveDate>,

    /// Label of every line
    #[clap(long)]
    pub force_label: Option<String>,

    /// Reference of every entry
    #[clap(long)]
    pub force_ref: Option<String>,

    /// Journal code of every entry
    #[clap(long)]
    pub force_journal: Option<String>,

    /// A change of reference starts a new entry
    #[clap(long)]
    pub reference_is_unique: bool,

    /// Lines of one entry may have different dates
    #[clap(long)]
    pub date_by_line: bool,

    /// Number the entries with their reference
    #[clap(long)]
    pub force_move_number: bool,

    /// Post the entries once created
    #[clap(long)]
    pub post: bool,

    /// Sequence number of this import, used in the external ids of the lines
    #[clap(long)]
    pub sequence: Option<u64>,

    /// Only validate the file and show the entries that would be created
    #[clap(long)]
    pub dry_run: bool,

    /// Print JSON instead of a list
    #[clap(long)]
    pub json: bool,
}

impl Args {
    /// Applies the command line flags on top of `config`.
    pub fn apply_to(&self, mut config: RunConfig) -> RunConfig {
        if let Some(format) = self.format {
            config.format = format;
        }
        if self.encoding.is_some() {
            config.encoding = self.encoding.clone();
        }
        if self.date_format.is_some() {
            config.date_format = self.date_format.clone();
        }
        if self.delimiter.is_some() {
            config.delimiter = self.delimiter;
        }
        if self.skip_header {
            config.skip_header = Some(true);
        }
        if self.force_date.is_some() {
            config.overrides.date = self.force_date;
        }
        if self.force_label.is_some() {
            config.overrides.label = self.force_label.clone();
        }
        if self.force_ref.is_some() {
            config.overrides.reference = self.force_ref.clone();
        }
        if self.force_journal.is_some() {
            config.overrides.journal = self.force_journal.clone();
        }
        config.grouping.reference_is_unique |= self.reference_is_unique;
        config.grouping.date_by_line |= self.date_by_line;
        config.force_move_number |= self.force_move_number;
        config.post_moves |= self.post;
        if let Some(sequence) = self.sequence {
            config.run_sequence = sequence;
        }
        config
    }
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = Args::parse_from([
            "ledger-move-import",
            "--input",
            "paie.txt",
            "--format",
            "ciel-paye",
            "--master-data",
            "master.yaml",
            "--force-date",
            "2024-01-31",
            "--force-journal",
            "PAIE",
            "--delimiter",
            ";",
            "--date-by-line",
            "--post",
            "--sequence",
            "12",
        ]);
        let config = args.apply_to(RunConfig {
            currency_decimals: 3,
            ..RunConfig::new(ImportFormat::Fec)
        });
        assert_eq!(ImportFormat::CielPaye, config.format);
        assert_eq!(NaiveDate::from_ymd_opt(2024, 1, 31), config.overrides.date);
        assert_eq!(Some("PAIE".to_string()), config.overrides.journal);
        assert_eq!(Some(';'), config.delimiter);
        assert_eq!(None, config.skip_header);
        assert!(config.grouping.date_by_line);
        assert!(!config.grouping.reference_is_unique);
        assert!(config.post_moves);
        assert_eq!(12, config.run_sequence);
        assert_eq!(3, config.currency_decimals);
    }

    #[test]
    fn no_flags_keep_config() {
        let args = Args::parse_from([
            "ledger-move-import",
            "-i",
            "in.csv",
            "-m",
            "master.yaml",
        ]);
        let config = RunConfig {
            skip_header: Some(false),
            post_moves: true,
            ..RunConfig::new(ImportFormat::Extenso)
        };
        assert_eq!(config.clone(), args.apply_to(config));
    }
}

mod delimited;
mod fixed_width;
mod spreadsheet;
mod utils;

pub use delimited::{ColumnMap, DelimitedConfig, DelimiterChoice};
pub use fixed_width::{FieldSpan, FixedWidthConfig, FixedWidthLayout};
pub use spreadsheet::SpreadsheetConfig;

use crate::config::{ImportFormat, RunConfig};
use crate::error::DecodeError;
use crate::ir::PivotRow;
use utils::encoding_for_label;

/// Fully specified decoder settings: per-format defaults with the run's explicit overrides
/// applied on top.
#[derive(Debug, Clone)]
pub enum DecoderConfig {
    Delimited(DelimitedConfig),
    FixedWidth(FixedWidthConfig),
    Spreadsheet(SpreadsheetConfig),
}

impl DecoderConfig {
    pub fn for_run(config: &RunConfig) -> Result<Self, DecodeError> {
        let decoder = match config.format {
            ImportFormat::GenericCsv => Self::Delimited(DelimitedConfig {
                encoding: encoding_rs::UTF_8,
                delimiter: DelimiterChoice::Sniff(vec![b',', b';', b'\t']),
                quoting: true,
                skip_header: false,
                date_format: "%d/%m/%Y".to_string(),
                columns: ColumnMap {
                    date: Some(0),
                    journal: Some(1),
                    account: 2,
                    partner: Some(3),
                    analytic: Some(4),
                    name: Some(5),
                    debit: 6,
                    credit: 7,
                    reference: Some(8),
                    reconcile_ref: Some(9),
                },
            }),
            ImportFormat::Fec => Self::Delimited(DelimitedConfig {
                encoding: encoding_rs::UTF_8,
                delimiter: DelimiterChoice::Sniff(vec![b'\t', b'|']),
                quoting: false,
                skip_header: true,
                date_format: "%Y%m%d".to_string(),
                columns: ColumnMap {
                    journal: Some(0),
                    reference: Some(2),
                    date: Some(3),
                    account: 4,
                    partner: Some(6),
                    name: Some(10),
                    debit: 11,
                    credit: 12,
                    reconcile_ref: Some(13),
                    analytic: None,
                },
            }),
            ImportFormat::CielPaye => Self::Delimited(DelimitedConfig {
                encoding: encoding_rs::ISO_8859_15,
                delimiter: DelimiterChoice::Fixed(b'\t'),
                quoting: false,
                skip_header: false,
                date_format: "%d/%m/%Y".to_string(),
                columns: ColumnMap {
                    journal: Some(0),
                    date: Some(1),
                    account: 2,
                    name: Some(3),
                    debit: 4,
                    credit: 5,
                    ..ColumnMap::default()
                },
            }),
            ImportFormat::Extenso => Self::Delimited(DelimitedConfig {
                encoding: encoding_rs::UTF_8,
                delimiter: DelimiterChoice::Fixed(b'\t'),
                quoting: false,
                skip_header: false,
                date_format: "%d%m%Y".to_string(),
                columns: ColumnMap {
                    journal: Some(0),
                    date: Some(1),
                    account: 3,
                    debit: 8,
                    credit: 9,
                    ..ColumnMap::default()
                },
            }),
            ImportFormat::Quadra => Self::FixedWidth(FixedWidthConfig {
                encoding: encoding_rs::WINDOWS_1252,
                date_format: "%d%m%y".to_string(),
                record_marker: 'M',
                layout: FixedWidthLayout::quadra(),
            }),
            ImportFormat::Payfit => Self::Spreadsheet(SpreadsheetConfig::payfit()),
        };
        decoder.with_overrides(config)
    }

    fn with_overrides(mut self, config: &RunConfig) -> Result<Self, DecodeError> {
        let encoding = config
            .encoding
            .as_deref()
            .map(encoding_for_label)
            .transpose()?;
        match &mut self {
            Self::Delimited(delimited) => {
                if let Some(encoding) = encoding {
                    delimited.encoding = encoding;
                }
                if let Some(delimiter) = config.delimiter {
                    let byte = u8::try_from(delimiter)
                        .ok()
                        .filter(u8::is_ascii)
                        .ok_or(DecodeError::BadDelimiter(delimiter))?;
                    delimited.delimiter = DelimiterChoice::Fixed(byte);
                }
                if let Some(date_format) = &config.date_format {
                    delimited.date_format = date_format.clone();
                }
                if let Some(skip_header) = config.skip_header {
                    delimited.skip_header = skip_header;
                }
            }
            Self::FixedWidth(fixed_width) => {
                if let Some(encoding) = encoding {
                    fixed_width.encoding = encoding;
                }
                if let Some(date_format) = &config.date_format {
                    fixed_width.date_format = date_format.clone();
                }
            }
            Self::Spreadsheet(spreadsheet) => {
                spreadsheet.amount_decimals = config.currency_decimals;
                if let Some(skip_header) = config.skip_header {
                    spreadsheet.skip_header = skip_header;
                }
            }
        }
        Ok(self)
    }
}

/// Turns the raw file into pivot rows. Pure: the same bytes always give the same rows.
pub fn decode(input: &[u8], config: &DecoderConfig) -> Result<Vec<PivotRow>, DecodeError> {
    let rows = match config {
        DecoderConfig::Delimited(delimited) => delimited::decode(input, delimited)?,
        DecoderConfig::FixedWidth(fixed_width) => fixed_width::decode(input, fixed_width)?,
        DecoderConfig::Spreadsheet(spreadsheet) => spreadsheet::decode(input, spreadsheet)?,
    };
    log::info!("Decoded {} lines", rows.len());
    Ok(rows)
}

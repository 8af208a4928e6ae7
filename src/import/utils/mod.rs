mod amount;
mod date;
mod records;
mod text;

pub use amount::{amount_cell, amount_from_cents};
pub use date::date_cell;
pub use records::{cell, read_records, sniff_delimiter};
pub use text::{decode_text, encoding_for_label};

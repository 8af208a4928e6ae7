use csv::{ReaderBuilder, StringRecord};

use crate::error::DecodeError;

/// Picks the candidate delimiter occurring most often in the first line.
/// Ties go to the earlier candidate.
pub fn sniff_delimiter(content: &str, candidates: &[u8]) -> Result<u8, DecodeError> {
    let first_line = content.lines().next().unwrap_or_default();
    let mut best: Option<(u8, usize)> = None;
    for &candidate in candidates {
        let count = first_line.bytes().filter(|&b| b == candidate).count();
        if count > 0 && best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((candidate, count));
        }
    }
    best.map(|(delimiter, _)| delimiter)
        .ok_or_else(|| DecodeError::NoDelimiter {
            candidates: candidates.iter().map(|&c| char::from(c)).collect(),
        })
}

/// Reads every record together with the 1-based line it starts on.
pub fn read_records(
    content: &str,
    delimiter: u8,
    quoting: bool,
) -> Result<Vec<(usize, StringRecord)>, DecodeError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .quoting(quoting)
        .from_reader(content.as_bytes());
    let mut lines = LineCounter::new(content);
    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|err| DecodeError::Csv {
            line: err
                .position()
                .map(|position| lines.line_at(position.byte()))
                .unwrap_or_default(),
            message: err.to_string(),
        })?;
        let line = match record.position() {
            Some(position) => lines.line_at(position.byte()),
            None => records.len() + 1,
        };
        records.push((line, record));
    }
    Ok(records)
}

/// Maps record offsets to raw line numbers. The csv reader skips empty lines and reports a
/// record's position before them, so they are skipped here too.
struct LineCounter<'a> {
    content: &'a [u8],
    offset: usize,
    line: usize,
}

impl<'a> LineCounter<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            content: content.as_bytes(),
            offset: 0,
            line: 1,
        }
    }

    /// Offsets must not decrease between calls.
    fn line_at(&mut self, byte: u64) -> usize {
        let target = usize::try_from(byte)
            .unwrap_or(usize::MAX)
            .clamp(self.offset, self.content.len());
        self.advance_to(target);
        while let Some(b'\r' | b'\n') = self.content.get(self.offset) {
            self.advance_to(self.offset + 1);
        }
        self.line
    }

    fn advance_to(&mut self, target: usize) {
        self.line += self.content[self.offset..target]
            .iter()
            .filter(|&&b| b == b'\n')
            .count();
        self.offset = target;
    }
}

/// Content of the cell at `index`, or an empty string if the row is too short.
pub fn cell(record: &StringRecord, index: usize) -> &str {
    record.get(index).unwrap_or_default()
}

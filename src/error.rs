use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;

/// The raw input could not be turned into pivot rows. Always fatal.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Unknown character encoding '{0}'")]
    UnknownEncoding(String),
    #[error("Line {line}: byte sequence invalid in {encoding}")]
    InvalidEncoding { encoding: &'static str, line: usize },
    #[error("Line {line}: {message}")]
    Csv { line: usize, message: String },
    #[error("Could not detect the delimiter of the first line, expected one of {candidates:?}")]
    NoDelimiter { candidates: Vec<char> },
    #[error("Delimiter '{0}' is not a single-byte character")]
    BadDelimiter(char),
    #[error("Line {line}: unexpected debit/credit flag '{flag}', expected 'C' or 'D'")]
    BadSignFlag { line: usize, flag: String },
    #[error("Failed to read spreadsheet: {0}")]
    Spreadsheet(String),
    #[error("Spreadsheet has no sheet at index {0}")]
    MissingSheet(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    Account,
    Journal,
    Partner,
    AnalyticAccount,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Account => write!(f, "account"),
            EntityKind::Journal => write!(f, "journal"),
            EntityKind::Partner => write!(f, "partner"),
            EntityKind::AnalyticAccount => write!(f, "analytic account"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineProblem {
    MissingAccount,
    MissingJournal,
    MissingLabel,
    MissingDate,
    MalformedDate(String),
    MalformedDebit(String),
    MalformedCredit(String),
    NegativeAmount,
    DebitAndCredit,
}

impl fmt::Display for LineProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineProblem::MissingAccount => write!(f, "missing account"),
            LineProblem::MissingJournal => write!(f, "missing journal"),
            LineProblem::MissingLabel => write!(f, "missing label"),
            LineProblem::MissingDate => write!(f, "missing date"),
            LineProblem::MalformedDate(raw) => write!(f, "bad value for date ({raw})"),
            LineProblem::MalformedDebit(raw) => write!(f, "bad value for debit ({raw})"),
            LineProblem::MalformedCredit(raw) => write!(f, "bad value for credit ({raw})"),
            LineProblem::NegativeAmount => write!(f, "debit and credit must not be negative"),
            LineProblem::DebitAndCredit => write!(f, "has both a debit and a credit"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineError {
    pub line: usize,
    pub problem: LineProblem,
}

/// A code that matched nothing, as first spelled in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmatchedCode {
    pub code: String,
    pub lines: Vec<usize>,
}

/// Everything that went wrong while resolving a run, collected over all rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    /// Unmatched codes per kind, keyed by lowercased code since lookups ignore case.
    pub unmatched: BTreeMap<EntityKind, BTreeMap<String, UnmatchedCode>>,
    pub other: Vec<LineError>,
}

impl ResolutionReport {
    pub fn is_empty(&self) -> bool {
        self.unmatched.values().all(BTreeMap::is_empty) && self.other.is_empty()
    }

    pub fn add_unmatched(&mut self, kind: EntityKind, code: &str, line: usize) {
        let unmatched = self
            .unmatched
            .entry(kind)
            .or_default()
            .entry(code.to_lowercase())
            .or_insert_with(|| UnmatchedCode {
                code: code.to_string(),
                lines: Vec::new(),
            });
        if !unmatched.lines.contains(&line) {
            unmatched.lines.push(line);
        }
    }

    pub fn add_problem(&mut self, line: usize, problem: LineProblem) {
        self.other.push(LineError { line, problem });
    }

    /// Lines that referenced an unmatched code of the given kind.
    pub fn unmatched_lines(&self, kind: EntityKind, code: &str) -> Option<&[usize]> {
        self.unmatched
            .get(&kind)
            .and_then(|codes| codes.get(&code.to_lowercase()))
            .map(|unmatched| unmatched.lines.as_slice())
    }

    /// Sorts every line list so the report does not depend on resolution order.
    pub fn sort(&mut self) {
        for codes in self.unmatched.values_mut() {
            for unmatched in codes.values_mut() {
                unmatched.lines.sort_unstable();
            }
        }
        self.other.sort_by_key(|error| error.line);
    }
}

impl fmt::Display for ResolutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "The import failed because of the following errors:")?;
        for (kind, codes) in &self.unmatched {
            for UnmatchedCode { code, lines } in codes.values() {
                let lines = lines
                    .iter()
                    .map(usize::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                writeln!(f, "- No {kind} matches code '{code}' (lines {lines})")?;
            }
        }
        for error in &self.other {
            writeln!(f, "- Line {}: {}", error.line, error.problem)?;
        }
        Ok(())
    }
}

impl std::error::Error for ResolutionReport {}

/// The row stream could not be split into balanced moves.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupingError {
    #[error("The journal entry that ends on line {line} is not balanced (balance is {balance})")]
    Unbalanced { line: usize, balance: Decimal },
    #[error("The journal entry that ends on line {line} has a single line")]
    SingleLine { line: usize },
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Resolution(#[from] ResolutionReport),
    #[error(transparent)]
    Grouping(#[from] GroupingError),
    #[error(transparent)]
    Ledger(#[from] anyhow::Error),
}

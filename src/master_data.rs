use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::ir::{AccountId, AnalyticAccountId, JournalId, PartnerId};

/// Lookup service over the ledger master data. Lookups match codes exactly, ignoring case.
pub trait MasterData {
    fn account(&self, code: &str) -> Option<AccountId>;
    /// Every account as (code, id), in the order prefix matching should try them.
    fn accounts(&self) -> Vec<(String, AccountId)>;
    fn journal(&self, code: &str) -> Option<JournalId>;
    fn partner(&self, code: &str) -> Option<PartnerId>;
    fn analytic_account(&self, code: &str) -> Option<AnalyticAccountId>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountEntry {
    pub code: String,
    pub id: AccountId,
    #[serde(default)]
    pub reconcile: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry<Id> {
    pub code: String,
    pub id: Id,
}

/// Master data as written in a YAML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterDataFile {
    pub accounts: Vec<AccountEntry>,
    pub journals: Vec<Entry<JournalId>>,
    pub partners: Vec<Entry<PartnerId>>,
    pub analytic_accounts: Vec<Entry<AnalyticAccountId>>,
}

impl MasterDataFile {
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read master data {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse master data {}", path.display()))
    }
}

/// In-memory master data, keyed by lowercased code. Accounts are kept sorted by code so
/// prefix matching is deterministic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMasterData {
    accounts: BTreeMap<String, (String, AccountId)>,
    journals: BTreeMap<String, JournalId>,
    partners: BTreeMap<String, PartnerId>,
    analytic_accounts: BTreeMap<String, AnalyticAccountId>,
}

impl InMemoryMasterData {
    pub fn new(file: &MasterDataFile) -> Self {
        fn index<Id: Copy>(entries: &[Entry<Id>]) -> BTreeMap<String, Id> {
            entries
                .iter()
                .map(|entry| (entry.code.to_lowercase(), entry.id))
                .collect()
        }
        Self {
            accounts: file
                .accounts
                .iter()
                .map(|entry| (entry.code.to_lowercase(), (entry.code.clone(), entry.id)))
                .collect(),
            journals: index(&file.journals),
            partners: index(&file.partners),
            analytic_accounts: index(&file.analytic_accounts),
        }
    }
}

impl MasterData for InMemoryMasterData {
    fn account(&self, code: &str) -> Option<AccountId> {
        self.accounts.get(&code.to_lowercase()).map(|(_, id)| *id)
    }

    fn accounts(&self) -> Vec<(String, AccountId)> {
        self.accounts.values().cloned().collect()
    }

    fn journal(&self, code: &str) -> Option<JournalId> {
        self.journals.get(&code.to_lowercase()).copied()
    }

    fn partner(&self, code: &str) -> Option<PartnerId> {
        self.partners.get(&code.to_lowercase()).copied()
    }

    fn analytic_account(&self, code: &str) -> Option<AnalyticAccountId> {
        self.analytic_accounts.get(&code.to_lowercase()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
accounts:
  - code: "411000"
    id: 1
    reconcile: true
  - code: "707000"
    id: 2
journals:
  - code: VT
    id: 10
partners:
  - code: c042
    id: 100
"#;

    #[test]
    fn case_insensitive_lookups() {
        let file = MasterDataFile::from_yaml(YAML).unwrap();
        assert!(file.accounts[0].reconcile);
        assert!(!file.accounts[1].reconcile);
        assert!(file.analytic_accounts.is_empty());

        let master = InMemoryMasterData::new(&file);
        assert_eq!(Some(AccountId(1)), master.account("411000"));
        assert_eq!(Some(JournalId(10)), master.journal("vt"));
        assert_eq!(Some(PartnerId(100)), master.partner("C042"));
        assert_eq!(None, master.analytic_account("ADM"));
        assert_eq!(
            vec![
                ("411000".to_string(), AccountId(1)),
                ("707000".to_string(), AccountId(2)),
            ],
            master.accounts()
        );
    }

    #[test]
    fn load_from_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), YAML).unwrap();
        let loaded = MasterDataFile::load(file.path()).unwrap();
        assert_eq!(2, loaded.accounts.len());
        assert!(MasterDataFile::load(Path::new("/nonexistent/master.yaml")).is_err());
    }
}

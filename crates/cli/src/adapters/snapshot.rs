use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use acctsync_recon::store::{AccountId, DestinationStore, Lookup, SearchHits};
use acctsync_recon::StoreError;

use super::io_error;

#[derive(Debug, Clone, Deserialize)]
struct SnapshotFile {
    accounts: Vec<SnapshotAccount>,
}

#[derive(Debug, Clone, Deserialize)]
struct SnapshotAccount {
    id: String,
    name: String,
    #[serde(default)]
    files: Vec<String>,
}

/// Destination records read from a JSON export:
/// `{"accounts": [{"id": "...", "name": "...", "files": ["..."]}]}`.
///
/// Behaves like the interactive store it was exported from: file listings
/// are only available for the record currently open, and `reset_view`
/// closes it.
#[derive(Debug, Clone)]
pub struct SnapshotDestination {
    accounts: Vec<SnapshotAccount>,
    open: Option<usize>,
}

impl SnapshotDestination {
    pub fn from_json(json: &str) -> Result<Self, String> {
        let file: SnapshotFile = serde_json::from_str(json).map_err(|e| e.to_string())?;
        Ok(Self {
            accounts: file.accounts,
            open: None,
        })
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| io_error(&path.display().to_string(), e))?;
        Self::from_json(&json).map_err(|e| {
            StoreError::Unexpected(format!("invalid snapshot {}: {e}", path.display()))
        })
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        let wanted = name.trim().to_lowercase();
        self.accounts
            .iter()
            .position(|a| a.name.trim().to_lowercase() == wanted)
    }
}

impl DestinationStore for SnapshotDestination {
    fn search_accounts(&mut self, query: &str, _timeout: Duration) -> Result<SearchHits, StoreError> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return Ok(SearchHits::default());
        }
        let candidate_names: Vec<String> = self
            .accounts
            .iter()
            .filter(|a| a.name.to_lowercase().contains(&q))
            .map(|a| a.name.clone())
            .collect();
        Ok(SearchHits {
            count: candidate_names.len(),
            candidate_names,
        })
    }

    fn account_exists(&mut self, name: &str, _timeout: Duration) -> Result<bool, StoreError> {
        Ok(self.position(name).is_some())
    }

    fn navigate_to_account(
        &mut self,
        name: &str,
        _timeout: Duration,
    ) -> Result<Lookup<AccountId>, StoreError> {
        match self.position(name) {
            Some(i) => {
                self.open = Some(i);
                Ok(Lookup::Found(AccountId(self.accounts[i].id.clone())))
            }
            None => {
                self.open = None;
                Ok(Lookup::NotFound)
            }
        }
    }

    fn list_files(&mut self, account: &AccountId, _timeout: Duration) -> Result<Vec<String>, StoreError> {
        match self.open.map(|i| &self.accounts[i]) {
            Some(open) if open.id == account.0 => Ok(open.files.clone()),
            Some(open) => Err(StoreError::StaleState(format!(
                "record '{}' is open, expected '{account}'",
                open.name
            ))),
            None => Err(StoreError::StaleState(format!(
                "no record open when listing files for '{account}'"
            ))),
        }
    }

    fn reset_view(&mut self, _timeout: Duration) -> Result<(), StoreError> {
        self.open = None;
        Ok(())
    }
}

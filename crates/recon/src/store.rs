//! Collaborator capabilities and the destination session.
//!
//! The engine never talks to a browser or a file-transfer API directly.
//! Adapters implement [`SourceStore`] and [`DestinationStore`]; the engine
//! reaches the destination only through a [`Session`], which hands out one
//! [`AccountLease`] at a time.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::StoreError;

/// Tagged lookup outcome. Absence is a value, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(v) => Some(v),
            Self::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    pub name: String,
    pub modified_at: Option<DateTime<Utc>>,
}

impl SourceFile {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modified_at: None,
        }
    }
}

/// Result of one destination search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHits {
    pub count: usize,
    pub candidate_names: Vec<String>,
}

/// Opaque destination record id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AccountId(pub String);

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Folder-per-account store being verified.
pub trait SourceStore {
    fn list_accounts(&mut self) -> Result<Vec<String>, StoreError>;

    /// Files in one account folder. `StoreError::NotFound` when the folder is gone.
    fn list_files(&mut self, account: &str) -> Result<Vec<SourceFile>, StoreError>;
}

/// Record-per-account store, reachable only by query-by-name.
///
/// Every call receives the time budget it may spend; implementations report
/// an overrun as [`StoreError::Timeout`].
pub trait DestinationStore {
    fn search_accounts(&mut self, query: &str, timeout: Duration) -> Result<SearchHits, StoreError>;

    fn account_exists(&mut self, name: &str, timeout: Duration) -> Result<bool, StoreError>;

    fn navigate_to_account(
        &mut self,
        name: &str,
        timeout: Duration,
    ) -> Result<Lookup<AccountId>, StoreError>;

    fn list_files(&mut self, account: &AccountId, timeout: Duration) -> Result<Vec<String>, StoreError>;

    /// Return to the search view. Used before retrying an interaction.
    fn reset_view(&mut self, _timeout: Duration) -> Result<(), StoreError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Owner of the single destination handle for a run.
pub struct Session<D: DestinationStore> {
    destination: D,
    leases: usize,
}

impl<D: DestinationStore> Session<D> {
    pub fn new(destination: D) -> Self {
        Self {
            destination,
            leases: 0,
        }
    }

    /// Check the destination out for one account. The lease borrows the
    /// session mutably, so no second lease can coexist with it.
    pub fn checkout<'s>(&'s mut self, account: &'s str) -> AccountLease<'s, D> {
        self.leases += 1;
        log::debug!("lease #{} checked out for '{account}'", self.leases);
        AccountLease {
            destination: &mut self.destination,
            account,
        }
    }

    /// Number of leases handed out so far.
    pub fn leases(&self) -> usize {
        self.leases
    }

    pub fn into_inner(self) -> D {
        self.destination
    }
}

/// Exclusive, account-scoped access to the destination.
pub struct AccountLease<'s, D: DestinationStore> {
    destination: &'s mut D,
    account: &'s str,
}

impl<'s, D: DestinationStore> AccountLease<'s, D> {
    pub fn account(&self) -> &str {
        self.account
    }

    pub fn destination(&mut self) -> &mut D {
        &mut *self.destination
    }
}

impl<D: DestinationStore> Drop for AccountLease<'_, D> {
    fn drop(&mut self) {
        log::debug!("lease released for '{}'", self.account);
    }
}

//! `acctsync-recon`: account and file reconciliation engine.
//!
//! Pure engine crate: talks to the source and destination only through the
//! capability traits in [`store`], returns a [`ReconciliationReport`].
//! No CLI or terminal IO.

pub mod batch;
pub mod config;
pub mod error;
pub mod evidence;
pub mod filename;
pub mod files;
pub mod identity;
pub mod matcher;
pub mod model;
pub mod resilience;
pub mod store;

pub use batch::{run, BatchAbort, RunOptions};
pub use config::ReconConfig;
pub use error::{ReconError, StoreError};
pub use identity::{parse, ParsedIdentity};
pub use model::{BatchSlice, MatchStatus, ReconciliationReport, ReportEntry};

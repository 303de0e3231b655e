//! Store adapters used by `acctsync run`.
//!
//! Both are local: a folder-per-account directory tree and a JSON export of
//! the destination's records. Live integrations implement the same traits.

mod fs_source;
mod snapshot;

pub use fs_source::{read_files, FsSource};
pub use snapshot::SnapshotDestination;

use std::io;

use acctsync_recon::StoreError;

/// Classify a local IO failure for the retry controller.
///
/// A permission error is local to one folder and must not abort the batch.
fn io_error(context: &str, err: io::Error) -> StoreError {
    let message = format!("{context}: {err}");
    match err.kind() {
        io::ErrorKind::NotFound => StoreError::NotFound(message),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => {
            StoreError::Timeout(message)
        }
        _ => StoreError::Unexpected(message),
    }
}

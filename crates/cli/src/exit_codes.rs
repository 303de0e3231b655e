//! CLI Exit Code Registry
//!
//! Single source of truth for `acctsync` exit codes. Scripts that drive
//! batches (resume after an abort, alert on unresolved accounts) depend on
//! these values.
//!
//! # Exit Code Ranges
//!
//! | Code | Domain    | Description                                        |
//! |------|-----------|----------------------------------------------------|
//! | 0    | Universal | Success, every account resolved                    |
//! | 1    | Universal | General error (unspecified)                        |
//! | 2    | Universal | Usage error (bad args, missing source/destination) |
//! | 60   | recon     | Engine config failed to parse or validate          |
//! | 61   | recon     | Runtime error (unreadable input, store failure)    |
//! | 62   | recon     | Run finished with unresolved accounts or file gaps |
//! | 63   | recon     | Batch aborted on an authentication error           |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above

use acctsync_recon::StoreError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed and nothing needs attention.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
#[allow(dead_code)]
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Recon (60-69)
// =============================================================================

/// Engine config is not valid TOML or fails validation.
pub const EXIT_RECON_INVALID_CONFIG: u8 = 60;

/// Input could not be read, report could not be written, or a store call
/// failed outside any account.
pub const EXIT_RECON_RUNTIME: u8 = 61;

/// Run completed but at least one account is not an exact match, failed,
/// or has missing/extra files.
pub const EXIT_RECON_UNRESOLVED: u8 = 62;

/// Credential expired or authentication failed; the partial report names
/// the offset to resume from.
pub const EXIT_RECON_ABORTED: u8 = 63;

/// Map a store error to its exit code.
pub fn store_exit_code(err: &StoreError) -> u8 {
    if err.is_fatal() {
        EXIT_RECON_ABORTED
    } else {
        EXIT_RECON_RUNTIME
    }
}

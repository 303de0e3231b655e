use std::fmt;

/// Engine configuration and output errors.
#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (zero retries, empty special case, etc.).
    ConfigValidation(String),
    /// A skip pattern failed to compile.
    BadPattern { pattern: String, message: String },
    /// Report could not be serialized.
    Serialize(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::BadPattern { pattern, message } => {
                write!(f, "invalid skip pattern '{pattern}': {message}")
            }
            Self::Serialize(msg) => write!(f, "report serialization error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

// ---------------------------------------------------------------------------
// Collaborator errors
// ---------------------------------------------------------------------------

/// How the resilience layer treats a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Item absent. Skip it, never retry.
    NotFound,
    /// Worth another attempt.
    Transient,
    /// Aborts the whole batch.
    Fatal,
    /// Retried under the same budget; a per-account failure once exhausted.
    Unexpected,
}

/// Error raised by a source or destination collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Source path or account absent.
    NotFound(String),
    /// Timed out waiting on the store.
    Timeout(String),
    /// The interactive view was not in the expected state.
    StaleState(String),
    /// Connection-level failure talking to a remote API.
    Network(String),
    /// The session credential expired.
    ExpiredCredential(String),
    /// The store rejected our identity.
    AuthenticationFailure(String),
    /// Anything the collaborator could not classify.
    Unexpected(String),
}

impl StoreError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound(_) => ErrorClass::NotFound,
            Self::Timeout(_) | Self::StaleState(_) | Self::Network(_) => ErrorClass::Transient,
            Self::ExpiredCredential(_) | Self::AuthenticationFailure(_) => ErrorClass::Fatal,
            Self::Unexpected(_) => ErrorClass::Unexpected,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.class() == ErrorClass::Fatal
    }

    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }

    /// Stable snake_case tag, used in report failure markers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Timeout(_) => "timeout",
            Self::StaleState(_) => "stale_state",
            Self::Network(_) => "network",
            Self::ExpiredCredential(_) => "expired_credential",
            Self::AuthenticationFailure(_) => "authentication_failure",
            Self::Unexpected(_) => "unexpected",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(m)
            | Self::Timeout(m)
            | Self::StaleState(m)
            | Self::Network(m)
            | Self::ExpiredCredential(m)
            | Self::AuthenticationFailure(m)
            | Self::Unexpected(m) => m,
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::Timeout(msg) => write!(f, "timed out: {msg}"),
            Self::StaleState(msg) => write!(f, "stale view state: {msg}"),
            Self::Network(msg) => write!(f, "network error: {msg}"),
            Self::ExpiredCredential(msg) => write!(f, "credential expired: {msg}"),
            Self::AuthenticationFailure(msg) => write!(f, "authentication failed: {msg}"),
            Self::Unexpected(msg) => write!(f, "unexpected error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

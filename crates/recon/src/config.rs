use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;

use crate::batch::RunOptions;
use crate::error::ReconError;
use crate::files::SkipRules;
use crate::identity::{SpecialCase, SpecialCases};
use crate::resilience::{Resilience, RetryPolicy};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Engine run configuration. Every section is optional; an empty file is
/// a valid config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub accounts: AccountsConfig,
    #[serde(default)]
    pub special_cases: Vec<SpecialCase>,
}

// ---------------------------------------------------------------------------
// Retry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Attempts for destination UI interactions (search, list files).
    pub interaction_tries: u32,
    /// Attempts for source-store network calls.
    pub network_tries: u32,
    pub backoff_initial_ms: u64,
    pub backoff_max_ms: u64,
    /// Budget for one destination interaction.
    pub call_timeout_ms: u64,
    /// Budget for one navigation probe.
    pub probe_timeout_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            interaction_tries: 3,
            network_tries: 3,
            backoff_initial_ms: 1_000,
            backoff_max_ms: 8_000,
            call_timeout_ms: 30_000,
            probe_timeout_ms: 10_000,
        }
    }
}

// ---------------------------------------------------------------------------
// Files + Accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilesConfig {
    pub enabled: bool,
    /// Regexes over source file names to leave out of the comparison.
    pub skip_patterns: Vec<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            skip_patterns: vec![
                r"^\.DS_Store$".into(),
                r"(?i)^thumbs\.db$".into(),
                r"^~\$".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccountsConfig {
    /// Source folders that are not accounts (templates, archives).
    pub ignored: Vec<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let r = &self.retry;
        if r.interaction_tries == 0 || r.network_tries == 0 {
            return Err(ReconError::ConfigValidation(
                "retry tries must be at least 1".into(),
            ));
        }
        if r.backoff_initial_ms > r.backoff_max_ms {
            return Err(ReconError::ConfigValidation(format!(
                "backoff_initial_ms ({}) exceeds backoff_max_ms ({})",
                r.backoff_initial_ms, r.backoff_max_ms
            )));
        }
        if r.call_timeout_ms == 0 || r.probe_timeout_ms == 0 {
            return Err(ReconError::ConfigValidation(
                "timeouts must be greater than zero".into(),
            ));
        }

        // Compile once here so a bad pattern fails before any account runs
        SkipRules::new(&self.files.skip_patterns)?;

        let mut seen = HashSet::new();
        for case in &self.special_cases {
            if case.folder_name.trim().is_empty() {
                return Err(ReconError::ConfigValidation(
                    "special case with empty folder_name".into(),
                ));
            }
            if case.expected_matches.is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "special case '{}': expected_matches is empty",
                    case.folder_name
                )));
            }
            if !seen.insert(case.folder_name.as_str()) {
                return Err(ReconError::ConfigValidation(format!(
                    "special case '{}' listed twice",
                    case.folder_name
                )));
            }
        }

        Ok(())
    }

    /// Retry controller built from `[retry]`.
    pub fn resilience(&self) -> Resilience {
        let r = &self.retry;
        Resilience::new(
            RetryPolicy::interaction(r.interaction_tries),
            RetryPolicy::network(
                r.network_tries,
                Duration::from_millis(r.backoff_initial_ms),
                Duration::from_millis(r.backoff_max_ms),
            ),
            Duration::from_millis(r.call_timeout_ms),
            Duration::from_millis(r.probe_timeout_ms),
        )
    }

    pub fn run_options(&self) -> Result<RunOptions, ReconError> {
        Ok(RunOptions {
            compare_files: self.files.enabled,
            skip: SkipRules::new(&self.files.skip_patterns)?,
            ignored: self.accounts.ignored.clone(),
            special_cases: SpecialCases::new(self.special_cases.iter().cloned()),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

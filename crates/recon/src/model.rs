use serde::Serialize;

use crate::error::ReconError;
use crate::identity::ParsedIdentity;

// ---------------------------------------------------------------------------
// Identity matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    LastName,
    FullName,
    WithExtraInfo,
    ExpectedMatch,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LastName => write!(f, "last_name"),
            Self::FullName => write!(f, "full_name"),
            Self::WithExtraInfo => write!(f, "with_extra_info"),
            Self::ExpectedMatch => write!(f, "expected_match"),
        }
    }
}

/// One search against the destination, in protocol order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchAttempt {
    pub strategy_kind: StrategyKind,
    pub query: String,
    pub match_count: usize,
    pub candidate_names: Vec<String>,
    /// Exact record this attempt confirmed, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    NoMatch,
    PartialMatch,
    ExactMatch,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoMatch => write!(f, "No Match"),
            Self::PartialMatch => write!(f, "Partial Match"),
            Self::ExactMatch => write!(f, "Exact Match"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub status: MatchStatus,
    /// Set only for [`MatchStatus::ExactMatch`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_name: Option<String>,
    pub attempts: Vec<SearchAttempt>,
    /// Union of every attempt's candidates, first-seen order.
    pub candidates: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl MatchResult {
    pub fn no_match() -> Self {
        Self {
            status: MatchStatus::NoMatch,
            resolved_name: None,
            attempts: Vec::new(),
            candidates: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// File comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Normalized base names equal.
    BaseName,
    /// `base.tag` of one side equals the other's base name.
    TypedName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Matched,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDetail {
    pub source_file: String,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_destination_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_kind: Option<MatchKind>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub potential_matches: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileComparisonResult {
    pub matched_count: usize,
    pub total_source: usize,
    pub missing: Vec<String>,
    pub extra: Vec<String>,
    /// One entry per source file, in source order.
    pub detail: Vec<FileDetail>,
    /// Source files excluded by skip rules before comparison.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
    /// Compared source files whose name lacks a date prefix.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub undated: Vec<UndatedFile>,
}

/// A source file missing its `YYMMDD ` name prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UndatedFile {
    pub source_file: String,
    /// Name with the prefix taken from the modification time, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_name: Option<String>,
}

impl FileComparisonResult {
    pub fn detail_for(&self, source_file: &str) -> Option<&FileDetail> {
        self.detail.iter().find(|d| d.source_file == source_file)
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// Window over the account population.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSlice {
    pub offset: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
}

impl BatchSlice {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(offset: usize, size: Option<usize>) -> Self {
        Self { offset, size }
    }

    /// Borrow the selected window. Out-of-range offsets give an empty slice.
    pub fn apply<'a, T>(&self, population: &'a [T]) -> &'a [T] {
        let start = self.offset.min(population.len());
        let end = match self.size {
            Some(size) => start.saturating_add(size).min(population.len()),
            None => population.len(),
        };
        &population[start..end]
    }
}

/// Failure marker on a report entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountFailure {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    /// Position in the full (filtered) population.
    pub index: usize,
    pub raw_identifier: String,
    pub identity: ParsedIdentity,
    /// `None` when the account failed before matching finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_result: Option<MatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_comparison: Option<FileComparisonResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<AccountFailure>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

impl ReportEntry {
    pub fn status(&self) -> Option<MatchStatus> {
        self.match_result.as_ref().map(|m| m.status)
    }

    pub fn resolved_name(&self) -> Option<&str> {
        self.match_result.as_ref().and_then(|m| m.resolved_name.as_deref())
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total_accounts: usize,
    pub exact_matches: usize,
    pub partial_matches: usize,
    pub no_matches: usize,
    pub failures: usize,
    pub accounts_compared: usize,
    pub files_matched: usize,
    pub files_missing: usize,
    pub files_extra: usize,
    pub files_undated: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMeta {
    pub engine_version: String,
    pub run_at: String,
    pub population: usize,
    pub slice: BatchSlice,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationReport {
    pub meta: ReportMeta,
    pub summary: ReportSummary,
    pub entries: Vec<ReportEntry>,
}

impl ReconciliationReport {
    pub fn to_json(&self) -> Result<String, ReconError> {
        serde_json::to_string_pretty(self).map_err(|e| ReconError::Serialize(e.to_string()))
    }

    /// Entries that need attention: not exact, failed, or with file differences.
    pub fn unresolved(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|e| {
            e.is_failure()
                || e.status() != Some(MatchStatus::ExactMatch)
                || e.file_comparison.as_ref().is_some_and(|fc| !fc.is_complete())
        })
    }
}

//! Per-account file-set reconciliation.

use regex::Regex;

use crate::error::ReconError;
use crate::filename::{has_date_prefix, normalize, NormalizedFile};
use crate::model::{FileComparisonResult, FileDetail, FileStatus, MatchKind, UndatedFile};
use crate::store::SourceFile;

/// Source files to leave out of the comparison (e.g. `.DS_Store`).
#[derive(Debug, Clone, Default)]
pub struct SkipRules {
    patterns: Vec<Regex>,
}

impl SkipRules {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ReconError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p.as_ref()).map_err(|e| ReconError::BadPattern {
                    pattern: p.as_ref().to_string(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_skipped(&self, name: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(name))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn exact_kind(src: &NormalizedFile, dst: &NormalizedFile) -> Option<MatchKind> {
    if src.base_name == dst.base_name {
        return Some(MatchKind::BaseName);
    }
    if src.typed_name() == dst.base_name || src.base_name == dst.typed_name() {
        return Some(MatchKind::TypedName);
    }
    None
}

fn is_potential(src: &NormalizedFile, dst: &NormalizedFile) -> bool {
    if src.base_name.is_empty() || dst.base_name.is_empty() {
        return false;
    }
    src.base_name.contains(&dst.base_name) || dst.base_name.contains(&src.base_name)
}

/// Compare one account's source files against its destination files.
///
/// Matching is one-to-one: each destination file satisfies at most one
/// source file. Base-name equality is tried across all remaining
/// destination files before the typed-name form.
pub fn compare<S: AsRef<str>, D: AsRef<str>>(
    source_files: &[S],
    destination_files: &[D],
) -> FileComparisonResult {
    let sources: Vec<NormalizedFile> = source_files.iter().map(|s| normalize(s.as_ref())).collect();
    let destinations: Vec<NormalizedFile> =
        destination_files.iter().map(|d| normalize(d.as_ref())).collect();

    let mut consumed = vec![false; destinations.len()];
    let mut result = FileComparisonResult {
        total_source: sources.len(),
        ..Default::default()
    };

    for src in &sources {
        let found = [MatchKind::BaseName, MatchKind::TypedName]
            .into_iter()
            .find_map(|wanted| {
                destinations
                    .iter()
                    .enumerate()
                    .filter(|(di, _)| !consumed[*di])
                    .find(|(_, dst)| exact_kind(src, dst) == Some(wanted))
                    .map(|(di, _)| (di, wanted))
            });

        match found {
            Some((di, kind)) => {
                consumed[di] = true;
                result.matched_count += 1;
                log::debug!("matched '{}' -> '{}' ({kind:?})", src.raw_name, destinations[di].raw_name);
                result.detail.push(FileDetail {
                    source_file: src.raw_name.clone(),
                    status: FileStatus::Matched,
                    matched_destination_file: Some(destinations[di].raw_name.clone()),
                    match_kind: Some(kind),
                    potential_matches: Vec::new(),
                });
            }
            None => {
                let potential_matches: Vec<String> = destinations
                    .iter()
                    .filter(|dst| is_potential(src, dst))
                    .map(|dst| dst.raw_name.clone())
                    .collect();
                log::debug!(
                    "missing '{}' ({} potential matches)",
                    src.raw_name,
                    potential_matches.len()
                );
                result.missing.push(src.raw_name.clone());
                result.detail.push(FileDetail {
                    source_file: src.raw_name.clone(),
                    status: FileStatus::Missing,
                    matched_destination_file: None,
                    match_kind: None,
                    potential_matches,
                });
            }
        }
    }

    result.extra = destinations
        .iter()
        .zip(&consumed)
        .filter(|(_, used)| !**used)
        .map(|(dst, _)| dst.raw_name.clone())
        .collect();

    result
}

/// [`compare`] after dropping source files that match `skip`.
pub fn compare_filtered<S: AsRef<str>, D: AsRef<str>>(
    source_files: &[S],
    destination_files: &[D],
    skip: &SkipRules,
) -> FileComparisonResult {
    let (skipped, kept): (Vec<&str>, Vec<&str>) = source_files
        .iter()
        .map(|s| s.as_ref())
        .partition(|name| skip.is_skipped(name));

    let mut result = compare(&kept, destination_files);
    result.skipped = skipped.into_iter().map(str::to_string).collect();
    result
}

/// Source files that are compared but carry no date prefix.
///
/// The expected name prefixes `YYMMDD ` from the modification time.
pub fn undated_files(source_files: &[SourceFile], skip: &SkipRules) -> Vec<UndatedFile> {
    source_files
        .iter()
        .filter(|f| !skip.is_skipped(&f.name) && !has_date_prefix(&f.name))
        .map(|f| UndatedFile {
            source_file: f.name.clone(),
            expected_name: f
                .modified_at
                .map(|t| format!("{} {}", t.format("%y%m%d"), f.name)),
        })
        .collect()
}

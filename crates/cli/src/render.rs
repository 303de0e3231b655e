//! Human-readable report lines (stderr).

use acctsync_recon::model::{FileComparisonResult, ReportSummary, UndatedFile};
use acctsync_recon::{MatchStatus, ReportEntry};

/// One line per account: folder, match outcome, file counts.
pub fn entry_line(entry: &ReportEntry) -> String {
    let mut line = format!("[{}] folder: {}", entry.index, entry.raw_identifier);

    match &entry.match_result {
        Some(m) => {
            line.push_str(&format!(" | match: {}", m.status));
            match m.status {
                MatchStatus::ExactMatch => {
                    if let Some(name) = &m.resolved_name {
                        line.push_str(&format!(" -> {name}"));
                    }
                }
                MatchStatus::PartialMatch => {
                    line.push_str(&format!(" ({} candidate(s))", m.candidates.len()));
                }
                MatchStatus::NoMatch => {}
            }
        }
        None if entry.failure.is_none() => line.push_str(" | match: not attempted"),
        None => {}
    }

    if let Some(fc) = &entry.file_comparison {
        line.push_str(&format!(" | files: {}", file_counts(fc)));
    }

    if let Some(failure) = &entry.failure {
        line.push_str(&format!(" | failed ({}): {}", failure.kind, failure.message));
    }

    line
}

fn file_counts(fc: &FileComparisonResult) -> String {
    format!(
        "{}/{} matched, {} missing, {} extra",
        fc.matched_count,
        fc.total_source,
        fc.missing.len(),
        fc.extra.len()
    )
}

/// `W2.pdf (expected 230612 W2.pdf)`, or just the name without a timestamp.
pub fn undated_label(u: &UndatedFile) -> String {
    match &u.expected_name {
        Some(expected) => format!("{} (expected {expected})", u.source_file),
        None => u.source_file.clone(),
    }
}

/// Indented follow-up lines: matcher warnings, diagnostics, file gaps.
pub fn entry_notes(entry: &ReportEntry) -> Vec<String> {
    let mut notes = Vec::new();
    if let Some(m) = &entry.match_result {
        notes.extend(m.warnings.iter().map(|w| format!("    warning: {w}")));
    }
    notes.extend(entry.diagnostics.iter().map(|d| format!("    note: {d}")));
    if let Some(fc) = &entry.file_comparison {
        notes.extend(fc.missing.iter().map(|f| format!("    missing: {f}")));
        notes.extend(fc.extra.iter().map(|f| format!("    extra: {f}")));
        notes.extend(fc.undated.iter().map(|u| format!("    undated: {}", undated_label(u))));
    }
    notes
}

pub fn totals_lines(s: &ReportSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "recon: {} account(s), {} exact, {} partial, {} no match, {} failed",
        s.total_accounts, s.exact_matches, s.partial_matches, s.no_matches, s.failures
    )];
    if s.accounts_compared > 0 {
        let mut line = format!(
            "files: {} account(s) compared, {} matched, {} missing, {} extra",
            s.accounts_compared, s.files_matched, s.files_missing, s.files_extra
        );
        if s.files_undated > 0 {
            line.push_str(&format!(", {} undated", s.files_undated));
        }
        lines.push(line);
    }
    lines
}

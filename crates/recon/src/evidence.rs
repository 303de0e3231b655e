use crate::model::{MatchStatus, ReportEntry, ReportSummary};

/// Compute summary counts from report entries.
pub fn compute_summary(entries: &[ReportEntry]) -> ReportSummary {
    let mut summary = ReportSummary {
        total_accounts: entries.len(),
        ..Default::default()
    };

    for e in entries {
        if e.is_failure() {
            summary.failures += 1;
        }

        match e.status() {
            Some(MatchStatus::ExactMatch) => summary.exact_matches += 1,
            Some(MatchStatus::PartialMatch) => summary.partial_matches += 1,
            Some(MatchStatus::NoMatch) => summary.no_matches += 1,
            None => {}
        }

        if let Some(fc) = &e.file_comparison {
            summary.accounts_compared += 1;
            summary.files_matched += fc.matched_count;
            summary.files_missing += fc.missing.len();
            summary.files_extra += fc.extra.len();
            summary.files_undated += fc.undated.len();
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::compare;
    use crate::identity::parse;
    use crate::model::{AccountFailure, MatchResult, UndatedFile};

    fn entry(status: Option<MatchStatus>) -> ReportEntry {
        ReportEntry {
            index: 0,
            raw_identifier: "Smith, John".into(),
            identity: parse("Smith, John"),
            match_result: status.map(|status| MatchResult {
                status,
                ..MatchResult::no_match()
            }),
            file_comparison: None,
            failure: None,
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn summary_counts() {
        let mut compared = entry(Some(MatchStatus::ExactMatch));
        let mut fc = compare(
            &["230101 W2.pdf", "Lease.pdf"],
            &["1. W2 [PDF]", "2. Old Lease [PDF]"],
        );
        fc.undated = vec![UndatedFile {
            source_file: "Lease.pdf".into(),
            expected_name: None,
        }];
        compared.file_comparison = Some(fc);

        let mut failed = entry(None);
        failed.failure = Some(AccountFailure {
            kind: "timeout".into(),
            message: "search".into(),
        });

        let entries = vec![
            compared,
            entry(Some(MatchStatus::ExactMatch)),
            entry(Some(MatchStatus::PartialMatch)),
            entry(Some(MatchStatus::NoMatch)),
            failed,
        ];
        let summary = compute_summary(&entries);
        assert_eq!(summary.total_accounts, 5);
        assert_eq!(summary.exact_matches, 2);
        assert_eq!(summary.partial_matches, 1);
        assert_eq!(summary.no_matches, 1);
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.accounts_compared, 1);
        assert_eq!(summary.files_matched, 1);
        assert_eq!(summary.files_missing, 1);
        assert_eq!(summary.files_extra, 1);
        assert_eq!(summary.files_undated, 1);
    }

    #[test]
    fn empty_report() {
        assert_eq!(compute_summary(&[]), ReportSummary::default());
    }
}

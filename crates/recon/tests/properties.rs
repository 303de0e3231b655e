// Property-based tests for identity parsing, date stripping, file
// conservation and matcher ordering.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::HashSet;

use proptest::prelude::*;

use acctsync_recon::error::StoreError;
use acctsync_recon::filename::{has_date_prefix, normalize, strip_date_prefix};
use acctsync_recon::files::compare;
use acctsync_recon::identity::parse;
use acctsync_recon::matcher::{resolve, SearchCapability};
use acctsync_recon::model::{FileStatus, MatchStatus};
use acctsync_recon::store::SearchHits;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Folder-name-like text: names, commas, parentheses, ampersands, stray spaces.
fn arb_account_name() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => r"[A-Z][a-z]{1,8}( [A-Z][a-z]{1,8}){0,3}",
        2 => r"[A-Z][a-z]{1,8}, ?[A-Z][a-z]{1,8}( [A-Z][a-z]{0,6})?",
        1 => r"[A-Z][a-z]{1,8} & [A-Z][a-z]{1,8} [A-Z][a-z]{1,8}",
        1 => r"[A-Za-z ,]{0,12}\([A-Za-z ]{0,10}\)?",
        1 => r"\PC{0,20}",
    ]
}

fn arb_date_prefix() -> impl Strategy<Value = String> {
    prop_oneof![
        r"(19|20)[0-9]{2}(0[1-9]|1[0-2])(0[1-9]|[12][0-9]|3[01])",
        r"(19|20)[0-9]{2}(0[1-9]|1[0-2])(0[1-9]|[12][0-9])[ _][0-9]{6}",
        r"[0-9]{2}(0[1-9]|1[0-2])(0[1-9]|[12][0-9]|3[01])",
    ]
}

/// Small vocabulary so source and destination names collide often.
fn arb_stem() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("W2".to_string()),
        Just("Tax Return".to_string()),
        Just("Lease".to_string()),
        Just("Smith_DL".to_string()),
        Just("Bank Statement".to_string()),
        Just("Bank Statement March".to_string()),
    ]
}

fn arb_source_file() -> impl Strategy<Value = String> {
    (
        proptest::option::of(arb_date_prefix()),
        arb_stem(),
        prop_oneof![Just("pdf"), Just("jpeg"), Just("docx"), Just("zip")],
    )
        .prop_map(|(date, stem, ext)| match date {
            Some(d) => format!("{d} {stem}.{ext}"),
            None => format!("{stem}.{ext}"),
        })
}

fn arb_destination_file() -> impl Strategy<Value = String> {
    (
        1u32..20,
        arb_stem(),
        prop_oneof![Just("PDF"), Just("IMG"), Just("DOC")],
        prop::bool::ANY,
    )
        .prop_map(|(n, stem, tag, keep_ext)| {
            if keep_ext {
                format!("{n}. {stem}.pdf [{tag}]")
            } else {
                format!("{n}. {stem} [{tag}]")
            }
        })
}

// ---------------------------------------------------------------------------
// Fake directory for matcher properties
// ---------------------------------------------------------------------------

struct Directory {
    names: Vec<String>,
}

impl SearchCapability for Directory {
    fn search(&mut self, query: &str) -> Result<SearchHits, StoreError> {
        let q = query.to_lowercase();
        let candidate_names: Vec<String> = self
            .names
            .iter()
            .filter(|n| n.to_lowercase().contains(&q))
            .cloned()
            .collect();
        Ok(SearchHits {
            count: candidate_names.len(),
            candidate_names,
        })
    }

    fn exists(&mut self, name: &str) -> Result<bool, StoreError> {
        Ok(self.names.iter().any(|n| n.eq_ignore_ascii_case(name)))
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn parse_is_total_and_deterministic(raw in arb_account_name()) {
        let a = parse(&raw);
        let b = parse(&raw);
        prop_assert_eq!(&a, &b);
        if !raw.trim().is_empty() {
            prop_assert!(!a.last_name.is_empty(), "empty last name for {:?}", raw);
        }
        prop_assert_eq!(a.last_name.trim(), a.last_name.as_str());
        prop_assert_eq!(a.first_name.trim(), a.first_name.as_str());
    }

    #[test]
    fn stripped_names_have_no_date_prefix(
        prefix in arb_date_prefix(),
        sep in prop_oneof![Just(" "), Just("_"), Just("-"), Just("  ")],
        rest in r"[A-Za-z][A-Za-z0-9 _.]{0,20}",
    ) {
        let name = format!("{prefix}{sep}{rest}");
        prop_assert!(has_date_prefix(&name));
        let once = strip_date_prefix(&name);
        prop_assert!(!has_date_prefix(once));
        prop_assert_eq!(strip_date_prefix(once), once);
        prop_assert!(once.starts_with(&rest[..1]));
    }

    #[test]
    fn strip_is_idempotent_on_any_input(raw in r"\PC{0,30}") {
        let once = strip_date_prefix(&raw);
        prop_assert!(!has_date_prefix(once));
        prop_assert_eq!(strip_date_prefix(once), once);
    }

    #[test]
    fn normalized_base_is_lowercase_and_trimmed(raw in r"[ -~]{0,30}") {
        let f = normalize(&raw);
        prop_assert_eq!(f.base_name.to_lowercase(), f.base_name.clone());
        prop_assert_eq!(f.base_name.trim(), f.base_name.as_str());
    }

    #[test]
    fn file_comparison_conserves_sources(
        sources in proptest::collection::vec(arb_source_file(), 0..8),
        destinations in proptest::collection::vec(arb_destination_file(), 0..8),
    ) {
        let out = compare(&sources, &destinations);

        prop_assert_eq!(out.total_source, sources.len());
        prop_assert_eq!(out.matched_count + out.missing.len(), sources.len());
        prop_assert_eq!(out.detail.len(), sources.len());
        prop_assert_eq!(out.matched_count + out.extra.len(), destinations.len());

        let matched: Vec<&String> = out
            .detail
            .iter()
            .filter(|d| d.status == FileStatus::Matched)
            .filter_map(|d| d.matched_destination_file.as_ref())
            .collect();
        prop_assert_eq!(matched.len(), out.matched_count);

        // Each destination entry satisfies at most one source
        let mut remaining = destinations.clone();
        for m in &matched {
            let pos = remaining.iter().position(|d| d == *m);
            prop_assert!(pos.is_some(), "{} matched twice", m);
            remaining.remove(pos.unwrap());
        }
        let mut extra = out.extra.clone();
        extra.sort();
        remaining.sort();
        prop_assert_eq!(extra, remaining);
    }

    #[test]
    fn matcher_stops_at_first_exact_attempt(
        raw in arb_account_name(),
        names in proptest::collection::vec(arb_account_name(), 0..6),
    ) {
        let identity = parse(&raw);
        let mut dir = Directory { names };
        let out = resolve(&identity, &mut dir).unwrap();

        let exact_at: Vec<usize> = out
            .attempts
            .iter()
            .enumerate()
            .filter(|(_, a)| a.exact_name.is_some())
            .map(|(i, _)| i)
            .collect();

        match out.status {
            MatchStatus::ExactMatch => {
                prop_assert_eq!(exact_at.len(), 1);
                prop_assert_eq!(exact_at[0], out.attempts.len() - 1);
                prop_assert!(out.resolved_name.is_some());
            }
            MatchStatus::PartialMatch => {
                prop_assert!(exact_at.is_empty());
                prop_assert!(out.attempts.iter().any(|a| a.match_count > 0));
            }
            MatchStatus::NoMatch => {
                prop_assert!(exact_at.is_empty());
                prop_assert!(out.candidates.is_empty());
            }
        }
        prop_assert!(out.attempts.len() <= 3);

        let unique: HashSet<&String> = out.candidates.iter().collect();
        prop_assert_eq!(unique.len(), out.candidates.len());
    }
}

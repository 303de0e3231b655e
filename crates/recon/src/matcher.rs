//! Multi-strategy identity resolution against the destination.
//!
//! Strategies run in a fixed order and stop at the first exact match:
//! last name, full name, last name plus extra info. Special cases replace
//! that sequence with one search per expected record.

use crate::error::StoreError;
use crate::identity::ParsedIdentity;
use crate::model::{MatchResult, MatchStatus, SearchAttempt, StrategyKind};
use crate::store::SearchHits;

/// The two destination queries the matcher needs.
pub trait SearchCapability {
    fn search(&mut self, query: &str) -> Result<SearchHits, StoreError>;
    fn exists(&mut self, name: &str) -> Result<bool, StoreError>;
}

/// Accumulates attempts in protocol order.
#[derive(Default)]
struct Resolution {
    attempts: Vec<SearchAttempt>,
    candidates: Vec<String>,
    warnings: Vec<String>,
    resolved: Option<String>,
}

impl Resolution {
    fn record(&mut self, kind: StrategyKind, query: String, hits: SearchHits, exact: Option<String>) {
        for name in &hits.candidate_names {
            if !self.candidates.contains(name) {
                self.candidates.push(name.clone());
            }
        }
        if self.resolved.is_none() {
            self.resolved = exact.clone();
        }
        log::debug!(
            "{kind} '{query}': {} hit(s){}",
            hits.count,
            exact.as_deref().map(|e| format!(", exact '{e}'")).unwrap_or_default()
        );
        self.attempts.push(SearchAttempt {
            strategy_kind: kind,
            query,
            match_count: hits.count,
            candidate_names: hits.candidate_names,
            exact_name: exact,
        });
    }

    fn warn(&mut self, message: String) {
        log::warn!("{message}");
        self.warnings.push(message);
    }

    fn finish(self) -> MatchResult {
        let status = if self.resolved.is_some() {
            MatchStatus::ExactMatch
        } else if self.attempts.iter().any(|a| a.match_count > 0) {
            MatchStatus::PartialMatch
        } else {
            MatchStatus::NoMatch
        };
        MatchResult {
            status,
            resolved_name: self.resolved,
            attempts: self.attempts,
            candidates: self.candidates,
            warnings: self.warnings,
        }
    }
}

/// Resolve `identity` against the destination.
///
/// Store errors propagate unchanged; the caller decides whether they end the
/// account or the batch.
pub fn resolve<S: SearchCapability + ?Sized>(
    identity: &ParsedIdentity,
    search: &mut S,
) -> Result<MatchResult, StoreError> {
    let mut res = Resolution::default();

    if identity.is_blank() {
        res.warn("malformed identity: nothing to search for".to_string());
        return Ok(res.finish());
    }

    if identity.is_special_case() {
        for expected in &identity.expected_matches {
            let hits = search.search(expected)?;
            let listed = hits
                .candidate_names
                .iter()
                .any(|c| c.eq_ignore_ascii_case(expected));
            let confirmed = listed || search.exists(expected)?;
            let exact = confirmed.then(|| expected.clone());
            if !confirmed {
                res.warn(format!("expected record '{expected}' not found"));
            }
            res.record(StrategyKind::ExpectedMatch, expected.clone(), hits, exact);
        }
        return Ok(res.finish());
    }

    // 1. Last name
    let last = identity.last_name.clone();
    let full = identity.full_name();
    let hits = search.search(&last)?;
    let found_any = hits.count > 0;
    let exact = match &full {
        Some(name) if search.exists(name)? => Some(name.clone()),
        _ => None,
    };
    res.record(StrategyKind::LastName, last, hits, exact);
    if res.resolved.is_some() {
        return Ok(res.finish());
    }

    // 2. Full name, only when the last name turned something up
    if let (true, Some(full)) = (found_any, full) {
        let hits = search.search(&full)?;
        let exact: Vec<&String> = hits
            .candidate_names
            .iter()
            .filter(|c| identity.is_variant(c))
            .collect();
        if exact.len() > 1 {
            let names: Vec<&str> = exact.iter().map(|s| s.as_str()).collect();
            res.warn(format!(
                "{} exact candidates for '{full}', using '{}': {names:?}",
                exact.len(),
                names[0],
            ));
        }
        let exact = exact.first().map(|s| (*s).clone());
        res.record(StrategyKind::FullName, full, hits, exact);
        if res.resolved.is_some() {
            return Ok(res.finish());
        }
    }

    // 3. Last name plus parenthesised extra info
    if !identity.extra_info.is_empty() {
        let query = format!("{} {}", identity.last_name, identity.extra_info);
        let hits = search.search(&query)?;
        let exact = search.exists(&query)?.then(|| query.clone());
        res.record(StrategyKind::WithExtraInfo, query, hits, exact);
    }

    Ok(res.finish())
}

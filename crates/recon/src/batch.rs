//! Batch orchestration over a slice of the account population.
//!
//! Accounts run one at a time. Each holds an [`AccountLease`] on the
//! session while it is processed. A non-fatal error ends only that account
//! (recorded on its entry); a fatal error ends the batch and hands back the
//! entries produced so far in a [`BatchAbort`].

use std::fmt;
use std::time::Duration;

use crate::error::StoreError;
use crate::evidence::compute_summary;
use crate::files::{compare_filtered, undated_files, SkipRules};
use crate::identity::{parse_with, ParsedIdentity, SpecialCases};
use crate::matcher::{resolve, SearchCapability};
use crate::model::{
    AccountFailure, BatchSlice, FileComparisonResult, MatchResult, MatchStatus,
    ReconciliationReport, ReportEntry, ReportMeta,
};
use crate::resilience::{OpClass, ProbeError, Resilience, Strategy};
use crate::store::{AccountLease, DestinationStore, Lookup, SearchHits, Session, SourceStore};

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Reconcile files for accounts that resolve exactly.
    pub compare_files: bool,
    pub skip: SkipRules,
    /// Folder names removed from the population before slicing.
    pub ignored: Vec<String>,
    pub special_cases: SpecialCases,
}

/// A fatal error stopped the batch.
#[derive(Debug)]
pub struct BatchAbort {
    pub cause: StoreError,
    /// Account being processed when the batch stopped.
    pub account: String,
    /// Offset to pass on the next run to resume at `account`.
    pub next_offset: usize,
    /// Entries completed before the abort.
    pub partial: ReconciliationReport,
}

impl fmt::Display for BatchAbort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "batch aborted at '{}' (offset {}): {}",
            self.account, self.next_offset, self.cause
        )
    }
}

impl std::error::Error for BatchAbort {}

/// List the source population, retrying as a network call.
pub fn load_population<S: SourceStore>(
    source: &mut S,
    resilience: &mut Resilience,
) -> Result<Vec<String>, StoreError> {
    resilience.retry(
        "list source accounts",
        OpClass::Network,
        source,
        |s| s.list_accounts(),
        None,
    )
}

/// Reconcile `population[slice]`.
pub fn run<S: SourceStore, D: DestinationStore>(
    session: &mut Session<D>,
    source: &mut S,
    population: &[String],
    slice: BatchSlice,
    options: &RunOptions,
    resilience: &mut Resilience,
) -> Result<ReconciliationReport, BatchAbort> {
    let filtered: Vec<&String> = population
        .iter()
        .filter(|name| !options.ignored.contains(name))
        .collect();
    if filtered.len() < population.len() {
        log::info!(
            "ignoring {} folder(s) by configuration",
            population.len() - filtered.len()
        );
    }

    let selected = slice.apply(&filtered);
    let meta = ReportMeta {
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        run_at: chrono::Utc::now().to_rfc3339(),
        population: filtered.len(),
        slice,
    };
    log::info!(
        "processing {} of {} account(s) from offset {}",
        selected.len(),
        filtered.len(),
        slice.offset
    );

    let mut entries = Vec::with_capacity(selected.len());
    for (i, raw) in selected.iter().enumerate() {
        let index = slice.offset + i;
        log::info!("[{}/{}] {raw}", i + 1, selected.len());

        match process_account(session, source, raw, index, options, resilience) {
            Ok(entry) => entries.push(entry),
            Err(cause) => {
                log::error!("fatal error on '{raw}', stopping batch: {cause}");
                let summary = compute_summary(&entries);
                return Err(BatchAbort {
                    cause,
                    account: raw.to_string(),
                    next_offset: index,
                    partial: ReconciliationReport {
                        meta,
                        summary,
                        entries,
                    },
                });
            }
        }
    }

    Ok(ReconciliationReport {
        meta,
        summary: compute_summary(&entries),
        entries,
    })
}

fn failure(err: &StoreError) -> AccountFailure {
    AccountFailure {
        kind: err.kind().to_string(),
        message: err.message().to_string(),
    }
}

/// One account. `Err` only for fatal errors.
fn process_account<S: SourceStore, D: DestinationStore>(
    session: &mut Session<D>,
    source: &mut S,
    raw: &str,
    index: usize,
    options: &RunOptions,
    resilience: &mut Resilience,
) -> Result<ReportEntry, StoreError> {
    let identity = parse_with(raw, &options.special_cases);
    let mut entry = ReportEntry {
        index,
        raw_identifier: raw.to_string(),
        identity: identity.clone(),
        match_result: None,
        file_comparison: None,
        failure: None,
        diagnostics: Vec::new(),
    };
    if identity.is_blank() {
        entry.diagnostics.push("malformed identity: blank folder name".into());
    }

    let mut lease = session.checkout(raw);

    let matched = {
        let mut search = ResilientSearch {
            lease: &mut lease,
            resilience: &mut *resilience,
        };
        resolve(&identity, &mut search)
    };
    let matched = match matched {
        Ok(m) => m,
        Err(e) if e.is_fatal() => return Err(e),
        Err(StoreError::NotFound(msg)) => {
            entry
                .diagnostics
                .push(format!("destination search found nothing: {msg}"));
            MatchResult::no_match()
        }
        Err(e) => {
            log::warn!("'{raw}': matching failed: {e}");
            entry.failure = Some(failure(&e));
            return Ok(entry);
        }
    };

    log::info!(
        "'{raw}': {}{}",
        matched.status,
        matched
            .resolved_name
            .as_deref()
            .map(|n| format!(" -> {n}"))
            .unwrap_or_default()
    );
    let resolved = matched.resolved_name.clone();
    let exact = matched.status == MatchStatus::ExactMatch;
    entry.match_result = Some(matched);

    if !(options.compare_files && exact) {
        return Ok(entry);
    }
    let Some(resolved) = resolved else {
        return Ok(entry);
    };

    match reconcile_files(
        &mut lease,
        source,
        raw,
        &identity,
        &resolved,
        &options.skip,
        resilience,
        &mut entry.diagnostics,
    ) {
        Ok(fc) => entry.file_comparison = Some(fc),
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            log::warn!("'{raw}': file reconciliation failed: {e}");
            entry.failure = Some(failure(&e));
        }
    }

    Ok(entry)
}

/// Naming strategies for opening the resolved record.
fn navigation_strategies(identity: &ParsedIdentity, resolved: &str) -> Vec<Strategy<String>> {
    let mut strategies = vec![Strategy::new("resolved name", resolved.to_string())];
    if !identity.first_name.is_empty() {
        let comma = format!("{}, {}", identity.last_name, identity.first_name);
        if !comma.eq_ignore_ascii_case(resolved) {
            strategies.push(Strategy::new("last, first", comma));
        }
    }
    strategies
}

#[allow(clippy::too_many_arguments)]
fn reconcile_files<S: SourceStore, D: DestinationStore>(
    lease: &mut AccountLease<'_, D>,
    source: &mut S,
    raw: &str,
    identity: &ParsedIdentity,
    resolved: &str,
    skip: &SkipRules,
    resilience: &mut Resilience,
    diagnostics: &mut Vec<String>,
) -> Result<FileComparisonResult, StoreError> {
    let source_files = match resilience.retry(
        &format!("list source files for '{raw}'"),
        OpClass::Network,
        source,
        |s| s.list_files(raw),
        None,
    ) {
        Ok(files) => files,
        Err(StoreError::NotFound(msg)) => {
            diagnostics.push(format!("source folder not found: {msg}"));
            Vec::new()
        }
        Err(e) => return Err(e),
    };
    let undated = undated_files(&source_files, skip);
    let source_names: Vec<String> = source_files.into_iter().map(|f| f.name).collect();

    let strategies = navigation_strategies(identity, resolved);
    let probed = resilience.probe(lease.destination(), &strategies, |d, name, timeout| {
        d.navigate_to_account(name, timeout)
    });
    let (account_id, nav_name) = match probed {
        Ok(p) => {
            if p.index > 0 {
                diagnostics.push(format!("opened record via '{}'", p.strategy));
            }
            (p.value, strategies[p.index].target.clone())
        }
        Err(ProbeError::Fatal(e)) => return Err(e),
        Err(exhausted) => {
            return Err(StoreError::NotFound(format!(
                "could not open record '{resolved}': {exhausted}"
            )));
        }
    };

    let timeout = resilience.call_timeout();
    let mut renavigate = |d: &mut D| -> Result<(), StoreError> {
        match d.navigate_to_account(&nav_name, timeout)? {
            Lookup::Found(_) => Ok(()),
            Lookup::NotFound => Err(StoreError::StaleState(format!(
                "record '{nav_name}' disappeared during navigation"
            ))),
        }
    };
    let destination_files = resilience.retry(
        &format!("list destination files for '{resolved}'"),
        OpClass::Interaction,
        lease.destination(),
        |d| d.list_files(&account_id, timeout),
        Some(&mut renavigate),
    )?;

    let mut fc = compare_filtered(&source_names, &destination_files, skip);
    fc.undated = undated;
    Ok(fc)
}

// ---------------------------------------------------------------------------
// Matcher adapter
// ---------------------------------------------------------------------------

/// Routes matcher queries through the leased destination with retries.
struct ResilientSearch<'a, 's, D: DestinationStore> {
    lease: &'a mut AccountLease<'s, D>,
    resilience: &'a mut Resilience,
}

impl<D: DestinationStore> ResilientSearch<'_, '_, D> {
    fn timeout(&self) -> Duration {
        self.resilience.call_timeout()
    }
}

impl<D: DestinationStore> SearchCapability for ResilientSearch<'_, '_, D> {
    fn search(&mut self, query: &str) -> Result<SearchHits, StoreError> {
        let timeout = self.timeout();
        let mut reset = |d: &mut D| d.reset_view(timeout);
        self.resilience.retry(
            &format!("search '{query}'"),
            OpClass::Interaction,
            self.lease.destination(),
            |d| d.search_accounts(query, timeout),
            Some(&mut reset),
        )
    }

    fn exists(&mut self, name: &str) -> Result<bool, StoreError> {
        let timeout = self.timeout();
        let mut reset = |d: &mut D| d.reset_view(timeout);
        self.resilience.retry(
            &format!("exists '{name}'"),
            OpClass::Interaction,
            self.lease.destination(),
            |d| d.account_exists(name, timeout),
            Some(&mut reset),
        )
    }
}

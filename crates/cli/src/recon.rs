//! `acctsync run | parse | files | validate`: batch reconciliation and the
//! single-step tools around it.

use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;

use acctsync_config::Settings;
use acctsync_recon::batch::{self, load_population};
use acctsync_recon::files::{compare_filtered, undated_files};
use acctsync_recon::identity::{parse_with, ParsedIdentity};
use acctsync_recon::model::{FileComparisonResult, FileStatus, MatchKind};
use acctsync_recon::store::Session;
use acctsync_recon::{BatchSlice, ReconConfig, ReconciliationReport, RunOptions};

use crate::adapters::{read_files, FsSource, SnapshotDestination};
use crate::exit_codes::{
    store_exit_code, EXIT_RECON_ABORTED, EXIT_RECON_INVALID_CONFIG, EXIT_RECON_RUNTIME,
    EXIT_RECON_UNRESOLVED,
};
use crate::render;
use crate::CliError;

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError {
        code,
        message: msg.into(),
        hint: None,
    }
}

/// Engine config from `path`, or the built-in defaults when none is given.
fn load_config(path: Option<&Path>) -> Result<ReconConfig, CliError> {
    let Some(path) = path else {
        return Ok(ReconConfig::default());
    };
    let config_str = std::fs::read_to_string(path).map_err(|e| {
        recon_err(
            EXIT_RECON_RUNTIME,
            format!("cannot read config {}: {e}", path.display()),
        )
    })?;
    ReconConfig::from_toml(&config_str)
        .map_err(|e| recon_err(EXIT_RECON_INVALID_CONFIG, format!("{}: {e}", path.display())))
}

fn run_options(config: &ReconConfig) -> Result<RunOptions, CliError> {
    config
        .run_options()
        .map_err(|e| recon_err(EXIT_RECON_INVALID_CONFIG, e.to_string()))
}

// ============================================================================
// run
// ============================================================================

#[derive(Args)]
pub struct RunArgs {
    /// Folder-per-account source directory (default: "source.root" setting)
    #[arg(long, env = "ACCTSYNC_SOURCE")]
    pub source: Option<PathBuf>,

    /// Destination JSON export (default: "destination.snapshot" setting)
    #[arg(long, env = "ACCTSYNC_DESTINATION")]
    pub destination: Option<PathBuf>,

    /// Engine config TOML (default: "engine.config" setting, else built-in defaults)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// First account to process, counted after ignored folders are removed
    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    /// Number of accounts to process (default: "batch.size" setting, else all)
    #[arg(long)]
    pub size: Option<usize>,

    /// Reconcile files for exact matches even if the config disables it
    #[arg(long)]
    pub files: bool,

    /// Output JSON report to stdout
    #[arg(long)]
    pub json: bool,

    /// Write JSON report to file (default: a timestamped file in "report.directory")
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn cmd_run(args: RunArgs, settings: &Settings, quiet: bool) -> Result<(), CliError> {
    let settings_path = Settings::config_path_display();

    let source_root = args
        .source
        .or_else(|| settings.source_root.clone())
        .ok_or_else(|| {
            CliError::args("no source directory given").with_hint(format!(
                "pass --source DIR or set \"source.root\" in {settings_path}"
            ))
        })?;
    let snapshot_path = args
        .destination
        .or_else(|| settings.destination_snapshot.clone())
        .ok_or_else(|| {
            CliError::args("no destination snapshot given").with_hint(format!(
                "pass --destination FILE or set \"destination.snapshot\" in {settings_path}"
            ))
        })?;

    let config_path = args.config.or_else(|| settings.engine_config.clone());
    let config = load_config(config_path.as_deref())?;
    let mut options = run_options(&config)?;
    if args.files {
        options.compare_files = true;
    }
    let slice = BatchSlice::new(args.offset, args.size.or(settings.batch_size));
    let mut resilience = config.resilience();

    let destination = SnapshotDestination::load(&snapshot_path).map_err(|e| {
        recon_err(
            store_exit_code(&e),
            format!("cannot load destination snapshot: {e}"),
        )
    })?;
    if destination.is_empty() {
        log::warn!("destination snapshot {} has no accounts", snapshot_path.display());
    } else {
        log::info!(
            "destination snapshot {}: {} account(s)",
            snapshot_path.display(),
            destination.len()
        );
    }

    let mut source = FsSource::new(&source_root);
    let population = load_population(&mut source, &mut resilience).map_err(|e| {
        recon_err(
            store_exit_code(&e),
            format!("cannot list accounts under {}: {e}", source.root().display()),
        )
    })?;

    let mut session = Session::new(destination);
    let outcome = batch::run(
        &mut session,
        &mut source,
        &population,
        slice,
        &options,
        &mut resilience,
    );

    let output_file = args.output.or_else(|| {
        settings
            .report_directory
            .as_ref()
            .map(|dir| dir.join(report_file_name()))
    });

    match outcome {
        Ok(report) => {
            emit_report(&report, args.json, output_file.as_deref(), quiet)?;
            let unresolved = report.unresolved().count();
            if unresolved > 0 {
                return Err(recon_err(
                    EXIT_RECON_UNRESOLVED,
                    format!("{unresolved} account(s) need attention"),
                ));
            }
            Ok(())
        }
        Err(abort) => {
            emit_report(&abort.partial, args.json, output_file.as_deref(), quiet)?;
            Err(recon_err(EXIT_RECON_ABORTED, abort.to_string()).with_hint(format!(
                "re-authenticate, then resume with --offset {}",
                abort.next_offset
            )))
        }
    }
}

fn report_file_name() -> String {
    chrono::Utc::now()
        .format("report-%Y%m%d-%H%M%S.json")
        .to_string()
}

fn emit_report(
    report: &ReconciliationReport,
    json_output: bool,
    output_file: Option<&Path>,
    quiet: bool,
) -> Result<(), CliError> {
    let json_str = report
        .to_json()
        .map_err(|e| recon_err(EXIT_RECON_RUNTIME, e.to_string()))?;

    if let Some(path) = output_file {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                recon_err(
                    EXIT_RECON_RUNTIME,
                    format!("cannot create {}: {e}", parent.display()),
                )
            })?;
        }
        std::fs::write(path, &json_str)
            .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    // Human summary to stderr
    if !quiet {
        for entry in &report.entries {
            eprintln!("{}", render::entry_line(entry));
            for note in render::entry_notes(entry) {
                eprintln!("{note}");
            }
        }
    }
    for line in render::totals_lines(&report.summary) {
        eprintln!("{line}");
    }
    Ok(())
}

// ============================================================================
// parse
// ============================================================================

#[derive(Serialize)]
struct ParsedName<'a> {
    raw: &'a str,
    #[serde(flatten)]
    identity: &'a ParsedIdentity,
}

pub fn cmd_parse(names: Vec<String>, config: Option<PathBuf>, json: bool) -> Result<(), CliError> {
    let options = run_options(&load_config(config.as_deref())?)?;
    let parsed: Vec<ParsedIdentity> = names
        .iter()
        .map(|name| parse_with(name, &options.special_cases))
        .collect();

    if json {
        let out: Vec<ParsedName<'_>> = names
            .iter()
            .zip(&parsed)
            .map(|(raw, identity)| ParsedName { raw, identity })
            .collect();
        let json_str = serde_json::to_string_pretty(&out)
            .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
        return Ok(());
    }

    for (raw, id) in names.iter().zip(&parsed) {
        println!("{raw}");
        if id.is_blank() {
            println!("  (blank: nothing to search for)");
            continue;
        }
        println!("  last:   {}", id.last_name);
        println!("  first:  {}", id.first_name);
        println!("  middle: {}", id.middle_name);
        println!("  extra:  {}", id.extra_info);
        if id.is_special_case() {
            println!("  expected: {}", id.expected_matches.join("; "));
        }
    }
    Ok(())
}

// ============================================================================
// files
// ============================================================================

/// Destination listing: one file name per line, blank lines ignored.
fn parse_listing(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn cmd_files(
    source_dir: PathBuf,
    destination_files: PathBuf,
    config: Option<PathBuf>,
    json: bool,
) -> Result<(), CliError> {
    let options = run_options(&load_config(config.as_deref())?)?;

    let source_files = read_files(&source_dir)
        .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("cannot read source folder: {e}")))?;
    let undated = undated_files(&source_files, &options.skip);
    let source_names: Vec<String> = source_files.into_iter().map(|f| f.name).collect();
    let listing = std::fs::read_to_string(&destination_files).map_err(|e| {
        recon_err(
            EXIT_RECON_RUNTIME,
            format!("cannot read {}: {e}", destination_files.display()),
        )
    })?;
    let destination_names = parse_listing(&listing);

    let mut result = compare_filtered(&source_names, &destination_names, &options.skip);
    result.undated = undated;

    if json {
        let json_str = serde_json::to_string_pretty(&result)
            .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    for line in file_lines(&result) {
        eprintln!("{line}");
    }

    if !result.is_complete() {
        return Err(recon_err(
            EXIT_RECON_UNRESOLVED,
            format!(
                "{} missing, {} extra file(s)",
                result.missing.len(),
                result.extra.len()
            ),
        ));
    }
    Ok(())
}

fn file_lines(result: &FileComparisonResult) -> Vec<String> {
    let mut lines = Vec::new();
    for d in &result.detail {
        match d.status {
            FileStatus::Matched => {
                let kind = match d.match_kind {
                    Some(MatchKind::TypedName) => "typed name",
                    _ => "base name",
                };
                lines.push(format!(
                    "  matched  {} -> {} ({kind})",
                    d.source_file,
                    d.matched_destination_file.as_deref().unwrap_or_default()
                ));
            }
            FileStatus::Missing if d.potential_matches.is_empty() => {
                lines.push(format!("  missing  {}", d.source_file));
            }
            FileStatus::Missing => {
                lines.push(format!(
                    "  missing  {} (similar: {})",
                    d.source_file,
                    d.potential_matches.join(", ")
                ));
            }
        }
    }
    lines.extend(result.extra.iter().map(|f| format!("  extra    {f}")));
    lines.extend(result.skipped.iter().map(|f| format!("  skipped  {f}")));
    lines.extend(
        result
            .undated
            .iter()
            .map(|u| format!("  undated  {}", render::undated_label(u))),
    );
    lines.push(format!(
        "files: {}/{} matched, {} missing, {} extra",
        result.matched_count,
        result.total_source,
        result.missing.len(),
        result.extra.len()
    ));
    lines
}

// ============================================================================
// validate
// ============================================================================

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(Some(&config_path))?;
    eprintln!(
        "valid: config '{}' with {} special case(s), {} ignored folder(s), file comparison {}",
        config.name.as_deref().unwrap_or("unnamed"),
        config.special_cases.len(),
        config.accounts.ignored.len(),
        if config.files.enabled { "on" } else { "off" },
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use acctsync_recon::model::UndatedFile;

    #[test]
    fn listing_ignores_blank_lines_and_padding() {
        assert_eq!(
            parse_listing("1. W2 [PDF]\n\n  2. Lease [DOC]  \r\n"),
            vec!["1. W2 [PDF]", "2. Lease [DOC]"]
        );
    }

    #[test]
    fn missing_config_uses_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.retry.interaction_tries, 3);
    }

    #[test]
    fn unreadable_and_invalid_configs_have_distinct_codes() {
        let err = load_config(Some(Path::new("/nonexistent/acctsync.toml"))).unwrap_err();
        assert_eq!(err.code, EXIT_RECON_RUNTIME);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[retry]\ninteraction_tries = 0\n").unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert_eq!(err.code, EXIT_RECON_INVALID_CONFIG);
    }

    #[test]
    fn file_lines_end_with_counts() {
        let result = compare_filtered(
            &["20230612 Smith_DL.jpeg", "Lease.pdf", ".DS_Store"],
            &["2. Smith_DL [IMG]", "3. Notes [DOC]"],
            &run_options(&ReconConfig::default()).unwrap().skip,
        );
        let lines = file_lines(&result);
        assert_eq!(lines.last().unwrap(), "files: 1/2 matched, 1 missing, 1 extra");
        assert!(lines.contains(&"  skipped  .DS_Store".to_string()));
        assert!(lines.contains(&"  extra    3. Notes [DOC]".to_string()));
    }

    #[test]
    fn file_lines_list_undated_sources() {
        let mut result = compare_filtered(&["W2.pdf"], &["1. W2 [PDF]"], &Default::default());
        result.undated = vec![UndatedFile {
            source_file: "W2.pdf".into(),
            expected_name: Some("230131 W2.pdf".into()),
        }];
        let lines = file_lines(&result);
        assert!(lines.contains(&"  undated  W2.pdf (expected 230131 W2.pdf)".to_string()));
        assert_eq!(lines.last().unwrap(), "files: 1/1 matched, 0 missing, 0 extra");
    }
}

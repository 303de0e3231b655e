// End-to-end tests for the `acctsync` binary.
// Run with: cargo test -p acctsync-cli --test cli_tests -- --nocapture
//
// Each test builds a throwaway source tree, destination snapshot and
// settings directory, so nothing is read from the real user config.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const SNAPSHOT: &str = r#"{
  "accounts": [
    {"id": "001A", "name": "John Smith", "files": ["2. Smith_DL [IMG]", "1. W2 [PDF]"]},
    {"id": "001B", "name": "Kathleen Andrews", "files": []},
    {"id": "001C", "name": "Jane Smithers", "files": []}
  ]
}"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    /// Source tree with two resolvable accounts.
    fn new() -> Self {
        let f = Fixture {
            dir: tempfile::tempdir().unwrap(),
        };
        f.account("Smith, John", &["20230612 Smith_DL.jpeg", "W2.pdf", ".DS_Store"]);
        f.account("Andrews, Kathleen", &[]);
        fs::write(f.path("export.json"), SNAPSHOT).unwrap();
        fs::create_dir_all(f.path("config")).unwrap();
        f
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    fn account(&self, name: &str, files: &[&str]) {
        let dir = self.path("accounts").join(name);
        fs::create_dir_all(&dir).unwrap();
        for file in files {
            fs::write(dir.join(file), "x").unwrap();
        }
    }

    fn acctsync(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_acctsync"));
        cmd.current_dir(self.dir.path());
        cmd.env("ACCTSYNC_CONFIG_DIR", self.path("config"));
        cmd.env_remove("ACCTSYNC_SOURCE");
        cmd.env_remove("ACCTSYNC_DESTINATION");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// `acctsync run` against the fixture's source and snapshot.
    fn run(&self, extra: &[&str]) -> Output {
        self.acctsync()
            .arg("run")
            .arg("--source")
            .arg(self.path("accounts"))
            .arg("--destination")
            .arg(self.path("export.json"))
            .args(extra)
            .output()
            .unwrap()
    }
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn json(out: &Output) -> serde_json::Value {
    serde_json::from_slice(&out.stdout).expect("stdout is JSON")
}

fn write(path: &Path, contents: &str) {
    fs::write(path, contents).unwrap();
}

// ============================================================================
// run
// ============================================================================

#[test]
fn run_all_resolved_exits_zero() {
    let f = Fixture::new();
    let out = f.run(&["--files"]);
    let err = stderr(&out);
    assert_eq!(out.status.code(), Some(0), "stderr: {err}");
    assert!(err.contains("folder: Smith, John | match: Exact Match -> John Smith"), "{err}");
    assert!(err.contains("files: 2/2 matched, 0 missing, 0 extra"), "{err}");
    assert!(err.contains("recon: 2 account(s), 2 exact, 0 partial, 0 no match, 0 failed"), "{err}");
    // W2.pdf has no date prefix; it is flagged but does not fail the run
    assert!(err.contains("    undated: W2.pdf (expected "), "{err}");
    assert!(err.contains("0 extra, 1 undated"), "{err}");
}

#[test]
fn run_json_report_to_stdout() {
    let f = Fixture::new();
    let out = f.run(&["--files", "--json"]);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));

    let report = json(&out);
    assert_eq!(report["summary"]["exact_matches"], 2);
    assert_eq!(report["summary"]["accounts_compared"], 2);
    assert_eq!(report["meta"]["population"], 2);

    let smith = &report["entries"][1];
    assert_eq!(smith["raw_identifier"], "Smith, John");
    assert_eq!(smith["identity"]["last_name"], "Smith");
    assert_eq!(smith["match_result"]["resolved_name"], "John Smith");
    assert_eq!(smith["file_comparison"]["skipped"][0], ".DS_Store");
    let undated = &smith["file_comparison"]["undated"][0];
    assert_eq!(undated["source_file"], "W2.pdf");
    let expected = undated["expected_name"].as_str().unwrap();
    assert_eq!(expected.len(), "YYMMDD W2.pdf".len());
    assert!(expected.ends_with(" W2.pdf"), "{expected}");
    assert!(expected[..6].bytes().all(|b| b.is_ascii_digit()), "{expected}");
    assert_eq!(report["summary"]["files_undated"], 1);
}

#[test]
fn run_unresolved_account_exits_62() {
    let f = Fixture::new();
    f.account("Doe, Jane", &[]);
    let out = f.run(&[]);
    let err = stderr(&out);
    assert_eq!(out.status.code(), Some(62), "stderr: {err}");
    assert!(err.contains("folder: Doe, Jane | match: No Match"), "{err}");
    assert!(err.contains("error: 1 account(s) need attention"), "{err}");
}

#[test]
fn run_offset_and_size_select_a_window() {
    let f = Fixture::new();
    f.account("Doe, Jane", &[]);
    // Sorted population: Andrews, Doe, Smith
    let out = f.run(&["--offset", "1", "--size", "1", "--json"]);
    assert_eq!(out.status.code(), Some(62));

    let report = json(&out);
    let entries = report["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["index"], 1);
    assert_eq!(entries[0]["raw_identifier"], "Doe, Jane");
    assert_eq!(report["meta"]["slice"]["offset"], 1);
}

#[test]
fn run_ignored_folder_from_config() {
    let f = Fixture::new();
    f.account("Doe, Jane", &[]);
    write(
        &f.path("audit.toml"),
        "[accounts]\nignored = [\"Doe, Jane\"]\n",
    );
    let out = f.run(&["--config", f.path("audit.toml").to_str().unwrap(), "--json"]);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert_eq!(json(&out)["summary"]["total_accounts"], 2);
}

#[test]
fn run_missing_files_exit_62() {
    let f = Fixture::new();
    f.account("Andrews, Kathleen", &["Lease.pdf"]);
    let out = f.run(&["--files"]);
    let err = stderr(&out);
    assert_eq!(out.status.code(), Some(62), "stderr: {err}");
    assert!(err.contains("    missing: Lease.pdf"), "{err}");
}

#[test]
fn run_quiet_keeps_totals_only() {
    let f = Fixture::new();
    let out = f.run(&["-q"]);
    let err = stderr(&out);
    assert_eq!(out.status.code(), Some(0));
    assert!(!err.contains("folder:"), "{err}");
    assert!(err.contains("recon: 2 account(s)"), "{err}");
}

#[test]
fn run_writes_output_file() {
    let f = Fixture::new();
    let report_path = f.path("out/report.json");
    let out = f.run(&["--output", report_path.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("wrote "));

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["summary"]["total_accounts"], 2);
}

#[test]
fn run_without_source_is_usage_error() {
    let f = Fixture::new();
    let out = f
        .acctsync()
        .args(["run", "--destination", "export.json"])
        .output()
        .unwrap();
    let err = stderr(&out);
    assert_eq!(out.status.code(), Some(2), "stderr: {err}");
    assert!(err.contains("error: no source directory given"), "{err}");
    assert!(err.contains("hint:  pass --source DIR"), "{err}");
}

#[test]
fn run_uses_settings_defaults() {
    let f = Fixture::new();
    let reports = f.path("reports");
    let settings = serde_json::json!({
        "source.root": f.path("accounts"),
        "destination.snapshot": f.path("export.json"),
        "report.directory": reports,
        "log.level": "warn",
    });
    write(&f.path("config/settings.json"), &settings.to_string());

    let out = f.acctsync().arg("run").output().unwrap();
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));

    let written: Vec<String> = fs::read_dir(&reports)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(written.len(), 1);
    assert!(written[0].starts_with("report-") && written[0].ends_with(".json"));
}

#[test]
fn first_run_creates_settings_file() {
    let f = Fixture::new();
    let out = f.acctsync().args(["parse", "Smith"]).output().unwrap();
    assert_eq!(out.status.code(), Some(0));
    let settings = fs::read_to_string(f.path("config/settings.json")).unwrap();
    assert!(settings.contains("\"source.root\""));
}

#[test]
fn run_missing_snapshot_is_runtime_error() {
    let f = Fixture::new();
    fs::remove_file(f.path("export.json")).unwrap();
    let out = f.run(&[]);
    let err = stderr(&out);
    assert_eq!(out.status.code(), Some(61), "stderr: {err}");
    assert!(err.contains("cannot load destination snapshot"), "{err}");
}

// ============================================================================
// parse
// ============================================================================

#[test]
fn parse_json_shows_name_parts() {
    let f = Fixture::new();
    let out = f
        .acctsync()
        .args(["parse", "John Michael Smith", "Smith, John (Trust)", "--json"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0));

    let parsed = json(&out);
    assert_eq!(parsed[0]["raw"], "John Michael Smith");
    assert_eq!(parsed[0]["last_name"], "Smith");
    assert_eq!(parsed[0]["first_name"], "John");
    assert_eq!(parsed[0]["middle_name"], "Michael");
    assert_eq!(parsed[1]["extra_info"], "Trust");
}

#[test]
fn parse_honours_special_cases() {
    let f = Fixture::new();
    write(
        &f.path("audit.toml"),
        r#"
[[special_cases]]
folder_name = "Smith Family"
last_name = "Smith"
expected_matches = ["John Smith", "Mary Smith"]
"#,
    );
    let out = f
        .acctsync()
        .args(["parse", "Smith Family", "--config", "audit.toml"])
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert!(stdout.contains("expected: John Smith; Mary Smith"), "{stdout}");
}

// ============================================================================
// files
// ============================================================================

#[test]
fn files_complete_listing() {
    let f = Fixture::new();
    write(&f.path("listing.txt"), "2. Smith_DL [IMG]\n1. W2 [PDF]\n");
    let out = f
        .acctsync()
        .args(["files", "--source-dir", "accounts/Smith, John"])
        .args(["--destination-files", "listing.txt"])
        .output()
        .unwrap();
    let err = stderr(&out);
    assert_eq!(out.status.code(), Some(0), "stderr: {err}");
    assert!(err.contains("matched  20230612 Smith_DL.jpeg -> 2. Smith_DL [IMG]"), "{err}");
    assert!(err.contains("skipped  .DS_Store"), "{err}");
    assert!(err.contains("undated  W2.pdf (expected "), "{err}");
}

#[test]
fn files_differences_exit_62() {
    let f = Fixture::new();
    write(&f.path("listing.txt"), "1. W2 [PDF]\n3. Notes [DOC]\n");
    let out = f
        .acctsync()
        .args(["files", "--source-dir", "accounts/Smith, John"])
        .args(["--destination-files", "listing.txt", "--json"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(62), "stderr: {}", stderr(&out));

    let result = json(&out);
    assert_eq!(result["matched_count"], 1);
    assert_eq!(result["missing"][0], "20230612 Smith_DL.jpeg");
    assert_eq!(result["extra"][0], "3. Notes [DOC]");
}

// ============================================================================
// validate
// ============================================================================

#[test]
fn validate_good_and_bad_configs() {
    let f = Fixture::new();
    write(
        &f.path("good.toml"),
        "name = \"Weekly audit\"\n[files]\nenabled = true\n",
    );
    write(
        &f.path("bad.toml"),
        "[retry]\nbackoff_initial_ms = 9000\nbackoff_max_ms = 1000\n",
    );

    let out = f.acctsync().args(["validate", "good.toml"]).output().unwrap();
    assert_eq!(out.status.code(), Some(0));
    assert!(stderr(&out).contains("valid: config 'Weekly audit'"));

    let out = f.acctsync().args(["validate", "bad.toml"]).output().unwrap();
    assert_eq!(out.status.code(), Some(60));
    assert!(stderr(&out).contains("exceeds backoff_max_ms"));

    let out = f.acctsync().args(["validate", "missing.toml"]).output().unwrap();
    assert_eq!(out.status.code(), Some(61));
}

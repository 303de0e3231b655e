// acctsync CLI - verify that folder-per-account records made it into the
// destination system, account by account and file by file.

mod adapters;
mod exit_codes;
mod recon;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use acctsync_config::Settings;

use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "acctsync")]
#[command(about = "Reconcile source account folders against a destination record store")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Only warnings and totals on stderr
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a batch of source accounts against the destination
    #[command(after_help = "\
Examples:
  acctsync run --source ~/Accounts --destination export.json
  acctsync run --source ~/Accounts --destination export.json --offset 50 --size 25
  acctsync run --config audit.toml --files --output report.json
  acctsync run --json | jq '.summary'
  ACCTSYNC_SOURCE=~/Accounts acctsync run --destination export.json")]
    Run(recon::RunArgs),

    /// Show how account folder names split into name parts
    #[command(after_help = "\
Examples:
  acctsync parse 'Andrews, Kathleen'
  acctsync parse 'John Michael Smith' 'Smith, John (Trust)' --json
  acctsync parse 'Smith Family' --config audit.toml")]
    Parse {
        /// Folder names to parse
        #[arg(required = true)]
        names: Vec<String>,

        /// Engine config with special cases
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare one account folder against a destination file listing
    #[command(after_help = "\
Examples:
  acctsync files --source-dir '~/Accounts/Smith, John' --destination-files smith.txt
  acctsync files --source-dir ./Smith --destination-files smith.txt --json")]
    Files {
        /// Account folder whose files are compared
        #[arg(long)]
        source_dir: PathBuf,

        /// Destination listing, one file name per line
        #[arg(long)]
        destination_files: PathBuf,

        /// Engine config (skip patterns)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate an engine config without running
    #[command(after_help = "\
Examples:
  acctsync validate audit.toml")]
    Validate {
        /// Engine config TOML
        config: PathBuf,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  acctsync-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  acctsync-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

/// RUST_LOG wins; otherwise the settings level, or warn with --quiet.
fn init_logging(settings: &Settings, quiet: bool) {
    let default_filter = if quiet {
        "warn"
    } else {
        settings.log_level.as_filter()
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = Settings::load();
    init_logging(&settings, cli.quiet);

    let result = match cli.command {
        Commands::Run(args) => recon::cmd_run(args, &settings, cli.quiet),
        Commands::Parse { names, config, json } => recon::cmd_parse(names, config, json),
        Commands::Files {
            source_dir,
            destination_files,
            config,
            json,
        } => recon::cmd_files(source_dir, destination_files, config, json),
        Commands::Validate { config } => recon::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self {
            code: EXIT_USAGE,
            message: msg.into(),
            hint: None,
        }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

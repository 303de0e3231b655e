// User settings
// Loaded from ~/.config/acctsync/settings.json (ACCTSYNC_CONFIG_DIR overrides the directory)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Log verbosity used when RUST_LOG is not set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Filter string for env_logger
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Stores
    #[serde(rename = "source.root")]
    pub source_root: Option<PathBuf>,

    #[serde(rename = "destination.snapshot")]
    pub destination_snapshot: Option<PathBuf>,

    // Engine
    #[serde(rename = "engine.config")]
    pub engine_config: Option<PathBuf>,

    // Batch
    #[serde(rename = "batch.size")]
    pub batch_size: Option<usize>,

    // Reports
    #[serde(rename = "report.directory")]
    pub report_directory: Option<PathBuf>,

    // Logging
    #[serde(rename = "log.level")]
    pub log_level: LogLevel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_root: None,
            destination_snapshot: None,
            engine_config: None,
            batch_size: None, // None = whole population
            report_directory: None,
            log_level: LogLevel::Info,
        }
    }
}

const DEFAULT_FILE: &str = r#"{
    // Folder-per-account source directory
    "source.root": null,

    // JSON export of the destination store
    "destination.snapshot": null,

    // Engine config (TOML): retry budgets, file rules, special cases
    "engine.config": null,

    // Accounts per run; null = all
    "batch.size": null,

    // Where `acctsync run` writes JSON reports when --output is not given
    "report.directory": null,

    // "error", "warn", "info", "debug", "trace" (RUST_LOG wins when set)
    "log.level": "info"
}
"#;

impl Settings {
    /// Directory holding settings.json
    pub fn config_dir() -> PathBuf {
        if let Some(dir) = std::env::var_os("ACCTSYNC_CONFIG_DIR") {
            return PathBuf::from(dir);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("acctsync")
    }

    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("settings.json")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path`; a missing file is created with commented defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            create_default_file(path);
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    eprintln!("Error parsing {}: {}", path.display(), e);
                    eprintln!("Using default settings");
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON, ignoring `//` comment lines
    pub fn parse(contents: &str) -> Result<Self, String> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        serde_json::from_str(&cleaned).map_err(|e| e.to_string())
    }

    /// Save current settings to disk
    pub fn save(&self) -> Result<(), String> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;

        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Get the config file path for display
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}

fn create_default_file(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Error creating config directory: {}", e);
            return;
        }
    }

    if let Err(e) = fs::write(path, DEFAULT_FILE) {
        eprintln!("Error writing default settings.json: {}", e);
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use acctsync_recon::store::{SourceFile, SourceStore};
use acctsync_recon::StoreError;

use super::io_error;

/// Local directory: each immediate sub-directory is an account.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Regular files directly under `dir`, sorted by name.
pub fn read_files(dir: &Path) -> Result<Vec<SourceFile>, StoreError> {
    let context = dir.display().to_string();
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| io_error(&context, e))? {
        let entry = entry.map_err(|e| io_error(&context, e))?;
        let meta = entry.metadata().map_err(|e| io_error(&context, e))?;
        if !meta.is_file() {
            continue;
        }
        files.push(SourceFile {
            name: entry.file_name().to_string_lossy().into_owned(),
            modified_at: meta.modified().ok().map(DateTime::<Utc>::from),
        });
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

impl SourceStore for FsSource {
    fn list_accounts(&mut self) -> Result<Vec<String>, StoreError> {
        let context = self.root.display().to_string();
        let mut accounts = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(|e| io_error(&context, e))? {
            let entry = entry.map_err(|e| io_error(&context, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            // Hidden folders (.git, .Trash) are never accounts
            if name.starts_with('.') {
                continue;
            }
            if entry.file_type().map_err(|e| io_error(&context, e))?.is_dir() {
                accounts.push(name);
            }
        }
        accounts.sort();
        log::debug!("{} account folder(s) under {context}", accounts.len());
        Ok(accounts)
    }

    fn list_files(&mut self, account: &str) -> Result<Vec<SourceFile>, StoreError> {
        read_files(&self.root.join(account))
    }
}

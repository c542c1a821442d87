//! Persisted list of release versions the user chose to skip.
//!
//! The list lives in a small JSON file holding a flat array of version
//! strings. It is read once at startup and rewritten wholesale every time a
//! version is added.

use std::path::{Path, PathBuf};

use crate::error::IgnoreStoreError;

/// File name of the ignored-versions list
pub const IGNORE_FILE_NAME: &str = "ignored-updates.json";

/// In-memory ignored versions backed by a JSON file
#[derive(Debug)]
pub struct IgnoreStore {
    path: PathBuf,
    versions: Vec<String>,
}

impl IgnoreStore {
    /// Resolve where the ignore file lives.
    ///
    /// Development runs keep it in the working directory, installed builds
    /// in the per-user data directory.
    pub fn resolve_path(is_dev: bool) -> Result<PathBuf, IgnoreStoreError> {
        if is_dev {
            let cwd = std::env::current_dir().map_err(|source| IgnoreStoreError::Read {
                path: PathBuf::from("."),
                source,
            })?;
            return Ok(cwd.join(IGNORE_FILE_NAME));
        }

        let dirs = directories::ProjectDirs::from("com", "shell-updater", "ShellUpdater")
            .ok_or(IgnoreStoreError::NoDataDir)?;
        Ok(dirs.data_dir().join(IGNORE_FILE_NAME))
    }

    /// Load the list from `path`. A missing file yields an empty list.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, IgnoreStoreError> {
        let path = path.into();

        if !path.exists() {
            tracing::debug!("No ignored versions file at {:?}", path);
            return Ok(Self {
                path,
                versions: Vec::new(),
            });
        }

        let content = std::fs::read_to_string(&path).map_err(|source| IgnoreStoreError::Read {
            path: path.clone(),
            source,
        })?;
        let versions: Vec<String> =
            serde_json::from_str(&content).map_err(|source| IgnoreStoreError::Parse {
                path: path.clone(),
                source,
            })?;

        tracing::info!("Loaded {} ignored version(s) from {:?}", versions.len(), path);
        Ok(Self { path, versions })
    }

    /// Record `version` and flush the whole list to disk.
    ///
    /// A version already in the list is not added twice. The in-memory list
    /// keeps the version even when the write fails.
    pub fn append(&mut self, version: &str) -> Result<(), IgnoreStoreError> {
        if !self.contains(version) {
            self.versions.push(version.to_string());
        }
        self.flush()
    }

    /// Forget all ignored versions for this session. The file is untouched.
    pub fn clear(&mut self) {
        self.versions.clear();
    }

    pub fn contains(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v == version)
    }

    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), IgnoreStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| IgnoreStoreError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = serde_json::to_string(&self.versions)?;
        std::fs::write(&self.path, content).map_err(|source| IgnoreStoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!("Saved {} ignored version(s) to {:?}", self.versions.len(), self.path);
        Ok(())
    }
}

//! Host environment facts the updater branches on.
//!
//! These are read once at startup and never change for the life of the
//! process: whether this is a development run, whether the app was started
//! from a portable executable, and which platform we are on.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Environment variable set by the portable launcher to the directory holding the executable
pub const PORTABLE_EXECUTABLE_DIR: &str = "PORTABLE_EXECUTABLE_DIR";

/// Development override file; its presence enables automatic checks in development
pub const DEV_UPDATE_CONFIG: &str = "dev-app-update.yml";

/// Environment variable that marks a development run
pub const DEV_MODE_VAR: &str = "SHELL_UPDATER_DEV";

/// Whether the development marker is set for this process
pub fn is_dev_run() -> bool {
    std::env::var_os(DEV_MODE_VAR).is_some_and(|v| !v.is_empty() && v != "0")
}

/// Operating system family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    /// Platform this binary was compiled for
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// Whether quit-and-install reliably relaunches the app on this platform.
    ///
    /// On macOS the relaunch after install is not dependable, so the update is
    /// left to be applied on the next launch instead.
    pub fn supports_relaunch_install(&self) -> bool {
        !matches!(self, Platform::MacOs)
    }
}

/// Facts about the running host process
#[derive(Debug, Clone, Serialize)]
pub struct Environment {
    /// Application display name used in dialogs
    pub app_name: String,
    /// Currently running version
    pub app_version: String,
    /// Running from a development checkout rather than an installed build
    pub is_dev: bool,
    /// Directory of the portable executable, when started as one
    pub portable_dir: Option<PathBuf>,
    /// Whether `dev-app-update.yml` exists next to the app
    pub dev_update_config_present: bool,
    pub platform: Platform,
}

impl Environment {
    /// Read the environment of the current process.
    ///
    /// `app_dir` is where the development override file is looked up.
    pub fn detect(app_name: impl Into<String>, app_version: impl Into<String>, app_dir: &Path) -> Self {
        let is_dev = is_dev_run();
        let portable_dir = std::env::var_os(PORTABLE_EXECUTABLE_DIR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let dev_update_config_present = app_dir.join(DEV_UPDATE_CONFIG).exists();

        let env = Self {
            app_name: app_name.into(),
            app_version: app_version.into(),
            is_dev,
            portable_dir,
            dev_update_config_present,
            platform: Platform::current(),
        };
        tracing::debug!(
            "Detected environment: dev={}, portable={}, dev_update_config={}, platform={:?}",
            env.is_dev,
            env.is_portable(),
            env.dev_update_config_present,
            env.platform
        );
        env
    }

    /// Whether the app is running from a portable executable
    pub fn is_portable(&self) -> bool {
        self.portable_dir.is_some()
    }

    /// Whether an automatic (non user-initiated) check should be skipped.
    ///
    /// Development runs without an override file would only produce noisy
    /// failures against a feed that does not know about them.
    pub fn skips_automatic_checks(&self) -> bool {
        self.is_dev && !self.dev_update_config_present
    }

    /// Whether downloads must be done by hand from the release page
    pub fn requires_manual_download(&self) -> bool {
        self.is_dev || self.is_portable()
    }
}

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::UpdaterError;

/// Environment override for `electron.releaseUrl`
pub const RELEASE_URL_VAR: &str = "SHELL_UPDATER_RELEASE_URL";
/// Environment override for `electron.releaseNotesUrl`
pub const RELEASE_NOTES_URL_VAR: &str = "SHELL_UPDATER_RELEASE_NOTES_URL";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub electron: ElectronConfig,
    #[serde(default)]
    pub updates: UpdateConfig,
}

/// Release page locations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElectronConfig {
    /// Page where users can download a new version by hand
    #[serde(
        default,
        rename = "releaseUrl",
        alias = "release_url",
        skip_serializing_if = "Option::is_none"
    )]
    pub release_url: Option<String>,
    /// Page describing what changed in a release
    #[serde(
        default,
        rename = "releaseNotesUrl",
        alias = "release_notes_url",
        skip_serializing_if = "Option::is_none"
    )]
    pub release_notes_url: Option<String>,
}

/// Update behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// Check for updates on startup
    #[serde(default = "default_true")]
    pub check_on_startup: bool,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            check_on_startup: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("com", "shell-updater", "ShellUpdater")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        let config_dir = dirs.config_dir();
        std::fs::create_dir_all(config_dir)?;

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from file, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from file only
    pub fn load_file() -> Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {:?}", path))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse {:?}", path))?;
            tracing::info!("Loaded configuration from {:?}", path);
            Ok(config)
        } else {
            tracing::info!("No configuration file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Layer environment values over what the file provided
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(RELEASE_URL_VAR) {
            tracing::debug!("Release URL overridden by {}", RELEASE_URL_VAR);
            self.electron.release_url = Some(url);
        }
        if let Some(url) = lookup(RELEASE_NOTES_URL_VAR) {
            tracing::debug!("Release notes URL overridden by {}", RELEASE_NOTES_URL_VAR);
            self.electron.release_notes_url = Some(url);
        }
    }

    /// Read-only view consumed by the update controller
    pub fn release(&self) -> Result<ReleaseConfig, UpdaterError> {
        ReleaseConfig::new(
            self.electron.release_url.as_deref(),
            self.electron.release_notes_url.as_deref(),
        )
    }

    /// Read a value by dotted key
    pub fn get(&self, key: &str) -> Result<String> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["electron", "releaseUrl" | "release_url"] => Ok(self
                .electron
                .release_url
                .clone()
                .unwrap_or_else(|| "<not set>".to_string())),
            ["electron", "releaseNotesUrl" | "release_notes_url"] => Ok(self
                .electron
                .release_notes_url
                .clone()
                .unwrap_or_else(|| "<not set>".to_string())),
            ["updates", "check_on_startup"] => Ok(self.updates.check_on_startup.to_string()),
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
    }

    /// Write a value by dotted key. An empty value clears optional URLs.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();
        let optional = || (!value.trim().is_empty()).then(|| value.trim().to_string());

        match parts.as_slice() {
            ["electron", "releaseUrl" | "release_url"] => {
                self.electron.release_url = optional();
            }
            ["electron", "releaseNotesUrl" | "release_notes_url"] => {
                self.electron.release_notes_url = optional();
            }
            ["updates", "check_on_startup"] => {
                self.updates.check_on_startup = value.parse()?;
            }
            _ => anyhow::bail!("Unknown or read-only config key: {}", key),
        }

        Ok(())
    }
}

/// Release locations, validated. Absent means the feature is disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseConfig {
    pub release_url: Option<Url>,
    pub release_notes_url: Option<Url>,
}

impl ReleaseConfig {
    /// Build from raw strings; blank strings count as absent
    pub fn new(
        release_url: Option<&str>,
        release_notes_url: Option<&str>,
    ) -> Result<Self, UpdaterError> {
        Ok(Self {
            release_url: parse_optional_url(release_url)?,
            release_notes_url: parse_optional_url(release_notes_url)?,
        })
    }
}

fn parse_optional_url(raw: Option<&str>) -> Result<Option<Url>, UpdaterError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    Url::parse(raw)
        .map(Some)
        .map_err(|e| UpdaterError::InvalidReleaseUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_electron_section() {
        let config: Config = toml::from_str(
            r#"
            [electron]
            release_url = "https://example.com/releases"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.electron.release_url.as_deref(),
            Some("https://example.com/releases")
        );
        assert!(config.electron.release_notes_url.is_none());
        assert!(config.updates.check_on_startup);
    }

    #[test]
    fn test_parse_camel_case_release_keys() {
        let config: Config = toml::from_str(
            r#"
            [electron]
            releaseUrl = "https://example.com/releases"
            releaseNotesUrl = "https://example.com/notes"
            "#,
        )
        .unwrap();
        let release = config.release().unwrap();
        assert_eq!(
            release.release_url.map(|u| u.to_string()),
            Some("https://example.com/releases".to_string())
        );
        assert_eq!(
            release.release_notes_url.map(|u| u.to_string()),
            Some("https://example.com/notes".to_string())
        );

        let saved = toml::to_string_pretty(&config).unwrap();
        assert!(saved.contains("releaseUrl = "));
        assert!(saved.contains("releaseNotesUrl = "));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = Config::default();
        config.electron.release_url = Some("https://file.example.com".to_string());
        config.apply_env_overrides(|key| match key {
            RELEASE_URL_VAR => Some("https://env.example.com".to_string()),
            _ => None,
        });
        assert_eq!(
            config.electron.release_url.as_deref(),
            Some("https://env.example.com")
        );
        assert!(config.electron.release_notes_url.is_none());
    }

    #[test]
    fn test_blank_urls_are_absent() {
        let release = ReleaseConfig::new(Some("  "), None).unwrap();
        assert_eq!(release, ReleaseConfig::default());
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let err = ReleaseConfig::new(Some("not a url"), None).unwrap_err();
        assert!(matches!(err, UpdaterError::InvalidReleaseUrl { .. }));
    }

    #[test]
    fn test_get_and_set_dotted_keys() {
        let mut config = Config::default();
        assert_eq!(config.get("electron.release_url").unwrap(), "<not set>");

        config
            .set("electron.release_url", "https://example.com/download")
            .unwrap();
        assert_eq!(
            config.get("electron.release_url").unwrap(),
            "https://example.com/download"
        );

        config.set("electron.release_url", "").unwrap();
        assert!(config.electron.release_url.is_none());

        config
            .set("electron.releaseNotesUrl", "https://example.com/notes")
            .unwrap();
        assert_eq!(
            config.get("electron.release_notes_url").unwrap(),
            "https://example.com/notes"
        );

        config.set("updates.check_on_startup", "false").unwrap();
        assert!(!config.updates.check_on_startup);

        assert!(config.set("launcher.theme", "dark").is_err());
        assert!(config.get("nope").is_err());
    }
}

//! Ignored version commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use crate::cli::output::{OutputFormat, print_formatted, print_success};
use shell_updater::IgnoreStore;
use shell_updater::environment::is_dev_run;

#[derive(Subcommand, Debug)]
pub enum IgnoredCommands {
    /// List ignored versions
    List,

    /// Stop prompting for a version
    Add {
        /// Version string as reported by the release feed
        version: String,
    },

    /// Forget all ignored versions
    Clear,

    /// Show the ignored versions file path
    Path,
}

#[derive(Serialize)]
struct IgnoredListResult {
    path: String,
    versions: Vec<String>,
}

pub async fn run(command: IgnoredCommands, format: OutputFormat, quiet: bool) -> Result<()> {
    match command {
        IgnoredCommands::List => list(format).await,
        IgnoredCommands::Add { version } => add(&version, quiet).await,
        IgnoredCommands::Clear => clear(quiet).await,
        IgnoredCommands::Path => path(format).await,
    }
}

fn open_store() -> Result<IgnoreStore> {
    let path = IgnoreStore::resolve_path(is_dev_run())?;
    Ok(IgnoreStore::load(path)?)
}

async fn list(format: OutputFormat) -> Result<()> {
    let store = open_store()?;
    let result = IgnoredListResult {
        path: store.path().to_string_lossy().to_string(),
        versions: store.versions().to_vec(),
    };

    print_formatted(&result, format, |r| {
        if r.versions.is_empty() {
            "No ignored versions".to_string()
        } else {
            r.versions.join("\n")
        }
    });

    Ok(())
}

async fn add(version: &str, quiet: bool) -> Result<()> {
    let version = version.trim();
    if version.is_empty() {
        anyhow::bail!("Version must not be empty");
    }

    let mut store = open_store()?;
    store.append(version)?;
    print_success(&format!("Ignoring version {}", version), quiet);
    Ok(())
}

async fn clear(quiet: bool) -> Result<()> {
    // Also works when the file is corrupt and cannot be loaded
    let path = IgnoreStore::resolve_path(is_dev_run())?;
    if path.exists() {
        std::fs::remove_file(&path)?;
        tracing::info!("Removed {:?}", path);
    }
    print_success("Cleared ignored versions", quiet);
    Ok(())
}

async fn path(format: OutputFormat) -> Result<()> {
    let path = IgnoreStore::resolve_path(is_dev_run())?;
    let path = path.to_string_lossy().to_string();

    print_formatted(&path, format, |p| p.clone());
    Ok(())
}

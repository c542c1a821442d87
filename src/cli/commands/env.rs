//! Host environment report

use anyhow::Result;
use serde::Serialize;

use crate::cli::output::{OutputFormat, or_not_set, print_formatted};
use shell_updater::{Config, Environment};

#[derive(Serialize)]
struct EnvResult {
    environment: Environment,
    release_url: Option<String>,
    release_notes_url: Option<String>,
    automatic_checks: bool,
    manual_download: bool,
    install_on_download: bool,
}

pub async fn run(format: OutputFormat) -> Result<()> {
    let app_dir = std::env::current_exe()?
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| ".".into());
    let environment = Environment::detect("shell-updater", env!("CARGO_PKG_VERSION"), &app_dir);
    let release = Config::load()?.release()?;

    let result = EnvResult {
        automatic_checks: !environment.skips_automatic_checks(),
        manual_download: environment.requires_manual_download(),
        install_on_download: environment.platform.supports_relaunch_install(),
        release_url: release.release_url.map(|u| u.to_string()),
        release_notes_url: release.release_notes_url.map(|u| u.to_string()),
        environment,
    };

    print_formatted(&result, format, |r| {
        let portable = r
            .environment
            .portable_dir
            .as_ref()
            .map(|p| p.display().to_string());
        [
            format!("Platform:           {:?}", r.environment.platform),
            format!("Development run:    {}", r.environment.is_dev),
            format!("Portable dir:       {}", or_not_set(portable.as_deref())),
            format!("Dev update config:  {}", r.environment.dev_update_config_present),
            format!("Release URL:        {}", or_not_set(r.release_url.as_deref())),
            format!("Release notes URL:  {}", or_not_set(r.release_notes_url.as_deref())),
            format!("Automatic checks:   {}", r.automatic_checks),
            format!("Manual download:    {}", r.manual_download),
            format!("Install on restart: {}", r.install_on_download),
        ]
        .join("\n")
    });

    Ok(())
}

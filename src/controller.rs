//! Update state machine.
//!
//! The controller owns everything with state: whether the current cycle is
//! visible to the user, the ignored versions, and the cookie-copy latch. It
//! reacts to one event at a time (see [`UpdateEvent`]) and talks to the
//! outside world only through the collaborator traits in [`UpdateServices`].
//!
//! ```text
//! Idle -> Checking -> Available -> Downloading -> Downloaded -> (install | Idle)
//!                  \-> Idle (not available / error / ignored / dismissed)
//! ```

use std::path::PathBuf;
use std::sync::{Arc, Weak};

use crate::config::{Config, ReleaseConfig};
use crate::cookies::{CookieSink, SessionCookieBridge};
use crate::environment::Environment;
use crate::error::UpdaterError;
use crate::ignore_store::IgnoreStore;
use crate::presenter::{
    ConfirmRequest, DialogKind, ExternalOpener, MessageRequest, Presenter, target_window,
};
use crate::progress::{Progress, ProgressBroadcaster};
use crate::provider::{ProgressInfo, ProviderEvent, ProviderLogger, UpdateInfo, UpdateProvider};
use crate::window::{AppWindow, WindowHost};

const DONT_ASK_AGAIN: &str = "Don't ask again for this version";

/// Coarse phase of the current update cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdatePhase {
    #[default]
    Idle,
    Checking,
    Available,
    Downloading,
    Downloaded,
}

impl UpdatePhase {
    /// Get a human-readable description of the current phase
    pub fn description(&self) -> &'static str {
        match self {
            UpdatePhase::Idle => "Ready",
            UpdatePhase::Checking => "Checking for updates...",
            UpdatePhase::Available => "Update available",
            UpdatePhase::Downloading => "Downloading update...",
            UpdatePhase::Downloaded => "Update ready to install",
        }
    }
}

/// Everything the controller reacts to, processed in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateEvent {
    /// Menu command or startup check
    CheckForUpdates { user_initiated: bool },
    /// "Request update check" sent by the embedded web content
    CheckRequested,
    Provider(ProviderEvent),
}

/// Host collaborators the controller drives
#[derive(Clone)]
pub struct UpdateServices {
    pub windows: Arc<dyn WindowHost>,
    pub presenter: Arc<dyn Presenter>,
    pub provider: Arc<dyn UpdateProvider>,
    /// Session the provider uses for feed requests
    pub update_session: Arc<dyn CookieSink>,
    pub opener: Arc<dyn ExternalOpener>,
}

/// The update state machine
pub struct UpdateController {
    env: Environment,
    release: ReleaseConfig,
    ignored: IgnoreStore,
    cookies: SessionCookieBridge,
    /// True while the user is waiting on the outcome of this cycle
    updating: bool,
    phase: UpdatePhase,
    check_on_startup: bool,
    main_window: Option<Weak<dyn AppWindow>>,
    progress: ProgressBroadcaster,
    services: UpdateServices,
}

impl UpdateController {
    pub fn new(
        env: Environment,
        release: ReleaseConfig,
        ignored: IgnoreStore,
        services: UpdateServices,
    ) -> Self {
        Self {
            env,
            release,
            ignored,
            cookies: SessionCookieBridge::new(),
            updating: false,
            phase: UpdatePhase::Idle,
            check_on_startup: false,
            main_window: None,
            progress: ProgressBroadcaster::new(services.windows.clone()),
            services,
        }
    }

    /// Build from user configuration, loading the ignored versions from
    /// their default location. An unreadable ignore file is fatal.
    pub fn from_config(
        env: Environment,
        config: &Config,
        services: UpdateServices,
    ) -> Result<Self, UpdaterError> {
        let path = IgnoreStore::resolve_path(env.is_dev)?;
        Self::from_config_with_ignore_file(env, config, services, path)
    }

    pub fn from_config_with_ignore_file(
        env: Environment,
        config: &Config,
        services: UpdateServices,
        ignore_file: PathBuf,
    ) -> Result<Self, UpdaterError> {
        let release = config.release()?;
        let ignored = IgnoreStore::load(ignore_file)?;
        let mut controller = Self::new(env, release, ignored, services);
        controller.check_on_startup = config.updates.check_on_startup;
        Ok(controller)
    }

    /// Remember the main window, route provider logs and switch the
    /// provider to manual downloads
    pub fn attach(&mut self, main_window: &Arc<dyn AppWindow>) {
        self.main_window = Some(Arc::downgrade(main_window));
        self.services.provider.set_logger(ProviderLogger);
        self.services.provider.set_auto_download(false);
        tracing::info!("Updater attached to {}", main_window.id());
    }

    /// Forget the main window
    pub fn detach(&mut self) {
        self.main_window = None;
    }

    pub fn is_updating(&self) -> bool {
        self.updating
    }

    pub fn phase(&self) -> UpdatePhase {
        self.phase
    }

    pub fn ignored_versions(&self) -> &[String] {
        self.ignored.versions()
    }

    pub fn cookies_copied(&self) -> bool {
        self.cookies.is_copied()
    }

    pub fn check_on_startup(&self) -> bool {
        self.check_on_startup
    }

    pub fn provider(&self) -> Arc<dyn UpdateProvider> {
        self.services.provider.clone()
    }

    /// React to one event
    pub async fn handle(&mut self, event: UpdateEvent) {
        match event {
            UpdateEvent::CheckForUpdates { user_initiated } => {
                self.check_for_updates(user_initiated).await
            }
            UpdateEvent::CheckRequested => self.on_check_requested().await,
            UpdateEvent::Provider(event) => {
                tracing::debug!("Provider event: {}", event.name());
                match event {
                    ProviderEvent::UpdateAvailable(info) => self.on_update_available(info).await,
                    ProviderEvent::UpdateNotAvailable(info) => {
                        self.on_update_not_available(info).await
                    }
                    ProviderEvent::Error(error) => self.on_error(&error).await,
                    ProviderEvent::DownloadProgress(progress) => {
                        self.on_download_progress(&progress)
                    }
                    ProviderEvent::UpdateDownloaded(info) => self.on_update_downloaded(info).await,
                }
            }
        }
    }

    /// Start a check. A user-initiated check forgets ignored versions for this
    /// session and reports every outcome.
    pub async fn check_for_updates(&mut self, user_initiated: bool) {
        if user_initiated {
            self.ignored.clear();
            self.updating = true;
        }

        if !user_initiated && self.env.skips_automatic_checks() {
            tracing::debug!("Skipping update check in development without an update config");
            return;
        }

        tracing::info!("Checking for updates (user initiated: {})", user_initiated);
        self.phase = UpdatePhase::Checking;
        if let Err(e) = self.services.provider.check_for_updates().await {
            self.on_error(&format!("{:#}", e)).await;
        }
    }

    /// Check requested by the web content; the feed may need the session cookies
    pub async fn on_check_requested(&mut self) {
        let main_window = self.main_window();
        self.cookies
            .sync(
                self.release.release_url.as_ref(),
                main_window.as_ref(),
                self.services.update_session.as_ref(),
            )
            .await;
        self.check_for_updates(false).await;
    }

    pub async fn on_update_available(&mut self, info: UpdateInfo) {
        if self.ignored.contains(&info.version) {
            tracing::info!("Update {} is ignored, not prompting", info.version);
            self.finish_cycle();
            return;
        }

        let Some(window) = target_window(self.services.windows.as_ref()) else {
            tracing::debug!("No window to show update {} in", info.version);
            self.finish_cycle();
            return;
        };

        if self.env.is_portable() && self.release.release_url.is_none() {
            tracing::info!(
                "Update {} available, but portable builds need a release URL to update",
                info.version
            );
            self.finish_cycle();
            return;
        }

        tracing::info!("Update available: {}", info.version);
        self.phase = UpdatePhase::Available;

        let Some(notes_url) = self.release.release_notes_url.clone() else {
            self.prompt_download(window.as_ref(), &info).await;
            return;
        };

        let request = ConfirmRequest::new(
            DialogKind::Question,
            "Update available",
            format!(
                "{} {} is available. Would you like to see what's new?",
                self.env.app_name, info.version
            ),
        )
        .buttons(&["What's New", "Download", "Cancel"])
        .cancel_id(2)
        .checkbox(DONT_ASK_AGAIN);
        let request = self.with_portable_detail(request);
        let answer = self.services.presenter.confirm(window.as_ref(), request).await;

        match answer.response {
            0 => {
                self.services.opener.open(notes_url.as_str());
                self.prompt_download(window.as_ref(), &info).await;
            }
            1 => self.download(window.as_ref(), &info).await,
            _ => self.dismiss(&info, answer.checkbox_checked),
        }
    }

    pub fn on_download_progress(&self, progress: &ProgressInfo) {
        match progress.percent.and_then(Progress::from_percent) {
            Some(value) => self.progress.set_progress(value),
            None => tracing::trace!("Ignoring progress event without a percentage"),
        }
    }

    /// Provider failure during a check or download
    pub async fn on_error(&mut self, error: &str) {
        tracing::error!("Update failed: {}", error);
        self.phase = UpdatePhase::Idle;

        if !self.updating {
            return;
        }

        self.progress.set_progress(Progress::None);
        if let Some(window) = target_window(self.services.windows.as_ref()) {
            let message = format!("{} could not be updated.", self.env.app_name);
            match self.release.release_url.clone() {
                Some(release_url) => {
                    let request = ConfirmRequest::new(
                        DialogKind::Error,
                        "Update failed",
                        format!("{} Would you like to download the new version manually?", message),
                    )
                    .detail(error)
                    .buttons(&["Yes", "No"])
                    .default_id(0)
                    .cancel_id(1);
                    let answer = self.services.presenter.confirm(window.as_ref(), request).await;
                    if answer.response == 0 {
                        self.services.opener.open(release_url.as_str());
                    }
                }
                None => {
                    let request = ConfirmRequest::new(DialogKind::Error, "Update failed", message)
                        .detail(error);
                    self.services.presenter.confirm(window.as_ref(), request).await;
                }
            }
        }

        self.updating = false;
    }

    pub async fn on_update_not_available(&mut self, info: UpdateInfo) {
        self.phase = UpdatePhase::Idle;

        if !self.updating {
            tracing::debug!("No update available (latest is {})", info.version);
            return;
        }

        if let Some(window) = target_window(self.services.windows.as_ref()) {
            self.services.presenter.notify(
                window.as_ref(),
                MessageRequest::new(
                    DialogKind::Info,
                    "No update available",
                    format!(
                        "You are running the latest version of {} ({}).",
                        self.env.app_name, self.env.app_version
                    ),
                ),
            );
        }
        self.updating = false;
    }

    pub async fn on_update_downloaded(&mut self, info: UpdateInfo) {
        self.updating = false;
        self.progress.set_progress(Progress::None);
        self.phase = UpdatePhase::Downloaded;
        tracing::info!("Update {} downloaded", info.version);

        let Some(window) = target_window(self.services.windows.as_ref()) else {
            tracing::debug!("No window to offer installing {} in", info.version);
            return;
        };

        if !self.env.platform.supports_relaunch_install() {
            let request = ConfirmRequest::new(
                DialogKind::Info,
                "Update downloaded",
                format!(
                    "{} {} has been downloaded and will be installed the next time you start the app.",
                    self.env.app_name, info.version
                ),
            );
            self.services.presenter.confirm(window.as_ref(), request).await;
            return;
        }

        let request = ConfirmRequest::new(
            DialogKind::Question,
            "Update downloaded",
            format!(
                "{} {} has been downloaded. Install it now? The app will restart.",
                self.env.app_name, info.version
            ),
        )
        .buttons(&["Install", "Wait"])
        .default_id(0)
        .cancel_id(1);
        let answer = self.services.presenter.confirm(window.as_ref(), request).await;

        if answer.response == 0 {
            tracing::info!("Quitting to install {}", info.version);
            self.services.provider.quit_and_install();
        } else {
            tracing::info!("Install of {} deferred", info.version);
        }
    }

    /// Two-button prompt used when there are no release notes to show, or
    /// after the user has looked at them
    async fn prompt_download(&mut self, window: &dyn AppWindow, info: &UpdateInfo) {
        let request = ConfirmRequest::new(
            DialogKind::Question,
            "Update available",
            format!(
                "{} {} is available. Would you like to download it now?",
                self.env.app_name, info.version
            ),
        )
        .buttons(&["Download", "Cancel"])
        .cancel_id(1)
        .checkbox(DONT_ASK_AGAIN);
        let request = self.with_portable_detail(request);
        let answer = self.services.presenter.confirm(window, request).await;

        if answer.response == 0 {
            self.download(window, info).await;
        } else {
            self.dismiss(info, answer.checkbox_checked);
        }
    }

    /// Download through the provider, or send the user to the release page
    /// when this build cannot update itself
    async fn download(&mut self, window: &dyn AppWindow, info: &UpdateInfo) {
        if self.env.requires_manual_download() {
            match &self.release.release_url {
                Some(url) => {
                    tracing::info!("Opening release page for manual download of {}", info.version);
                    self.services.opener.open(url.as_str());
                }
                None => tracing::debug!("No release URL configured for manual download"),
            }
            self.finish_cycle();
            return;
        }

        self.updating = true;
        self.phase = UpdatePhase::Downloading;
        self.services.presenter.notify(
            window,
            MessageRequest::new(
                DialogKind::Info,
                "Downloading update",
                format!(
                    "{} {} is being downloaded. You will be notified when it is ready to install.",
                    self.env.app_name, info.version
                ),
            ),
        );

        tracing::info!("Downloading update {}", info.version);
        if let Err(e) = self.services.provider.download_update().await {
            self.on_error(&format!("{:#}", e)).await;
        }
    }

    fn dismiss(&mut self, info: &UpdateInfo, dont_ask_again: bool) {
        self.finish_cycle();
        if !dont_ask_again {
            tracing::debug!("Update {} dismissed", info.version);
            return;
        }

        tracing::info!("Ignoring version {} from now on", info.version);
        if let Err(e) = self.ignored.append(&info.version) {
            tracing::warn!("Failed to save ignored version {}: {}", info.version, e);
        }
    }

    /// The cycle ended without a download; later background outcomes stay quiet
    fn finish_cycle(&mut self) {
        self.updating = false;
        self.phase = UpdatePhase::Idle;
    }

    fn with_portable_detail(&self, request: ConfirmRequest) -> ConfirmRequest {
        match &self.env.portable_dir {
            Some(dir) => request.detail(format!(
                "Running the portable build from {}. The new version has to be downloaded from the release page.",
                dir.display()
            )),
            None => request,
        }
    }

    fn main_window(&self) -> Option<Arc<dyn AppWindow>> {
        self.main_window.as_ref().and_then(Weak::upgrade)
    }
}

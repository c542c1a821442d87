//! Update provider boundary.
//!
//! The provider talks to the remote release feed, downloads and verifies
//! artifacts, and can relaunch the app into the installer. The controller
//! drives it through [`UpdateProvider`] commands and hears back through a
//! stream of [`ProviderEvent`]s.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A candidate release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInfo {
    /// Version string, compared by equality only
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_notes_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}

impl UpdateInfo {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            release_notes_url: None,
            release_name: None,
            release_date: None,
        }
    }
}

/// Download progress reported by the provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressInfo {
    /// Percent complete (0 - 100), when the provider knows it
    #[serde(default)]
    pub percent: Option<f64>,
    #[serde(default)]
    pub bytes_per_second: u64,
    #[serde(default)]
    pub transferred: u64,
    #[serde(default)]
    pub total: u64,
}

/// Events emitted by the provider
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    UpdateAvailable(UpdateInfo),
    UpdateNotAvailable(UpdateInfo),
    /// A check or download failed
    Error(String),
    DownloadProgress(ProgressInfo),
    UpdateDownloaded(UpdateInfo),
}

impl ProviderEvent {
    /// Short event name for logging
    pub fn name(&self) -> &'static str {
        match self {
            ProviderEvent::UpdateAvailable(_) => "update-available",
            ProviderEvent::UpdateNotAvailable(_) => "update-not-available",
            ProviderEvent::Error(_) => "error",
            ProviderEvent::DownloadProgress(_) => "download-progress",
            ProviderEvent::UpdateDownloaded(_) => "update-downloaded",
        }
    }
}

/// Handle returned by a subscription, used to detach it again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Allocate a process-unique id
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Callback half of a subscription. Events handed to it are queued for the
/// controller in the order they are emitted.
pub struct EventSink<T> {
    send: Arc<dyn Fn(T) -> bool + Send + Sync>,
}

impl<T> EventSink<T> {
    pub fn new<F>(send: F) -> Self
    where
        F: Fn(T) -> bool + Send + Sync + 'static,
    {
        Self {
            send: Arc::new(send),
        }
    }

    /// Deliver an event. Returns `false` once the receiving side is gone.
    pub fn emit(&self, event: T) -> bool {
        (self.send)(event)
    }
}

impl<T> Clone for EventSink<T> {
    fn clone(&self) -> Self {
        Self {
            send: self.send.clone(),
        }
    }
}

/// Log target for messages reported by the update provider
pub const PROVIDER_LOG_TARGET: &str = "update_provider";

/// Logger handed to the provider at init. Messages land in `tracing` under
/// [`PROVIDER_LOG_TARGET`], so `RUST_LOG=update_provider=debug` shows them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderLogger;

impl ProviderLogger {
    pub fn debug(&self, message: &str) {
        tracing::debug!(target: PROVIDER_LOG_TARGET, "{}", message);
    }

    pub fn info(&self, message: &str) {
        tracing::info!(target: PROVIDER_LOG_TARGET, "{}", message);
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(target: PROVIDER_LOG_TARGET, "{}", message);
    }

    pub fn error(&self, message: &str) {
        tracing::error!(target: PROVIDER_LOG_TARGET, "{}", message);
    }
}

/// Commands the controller issues to the update provider
#[async_trait]
pub trait UpdateProvider: Send + Sync {
    /// Whether the provider downloads on its own as soon as an update is found
    fn set_auto_download(&self, enabled: bool);

    /// Route the provider's own log output. Providers that already log
    /// through `tracing` can ignore this.
    fn set_logger(&self, _logger: ProviderLogger) {}

    /// Start delivering events to `events`
    fn subscribe(&self, events: EventSink<ProviderEvent>) -> SubscriptionId;

    /// Stop delivering events for `id`
    fn unsubscribe(&self, id: SubscriptionId);

    /// Ask the feed whether a newer version exists. The answer arrives as an
    /// event; an error returned here is not also emitted as an event.
    async fn check_for_updates(&self) -> Result<()>;

    /// Download the update found by the last check. Progress and completion
    /// arrive as events; an error returned here is not also emitted.
    async fn download_update(&self) -> Result<()>;

    /// Quit the app and run the installer. Does not return in a real host.
    fn quit_and_install(&self);
}

/// Source of the "request update check" trigger sent by the embedded web content
pub trait CheckTrigger: Send + Sync {
    fn subscribe(&self, requests: EventSink<()>) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);
}

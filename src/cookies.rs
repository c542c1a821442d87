//! Copies authentication cookies from the main window's session into the
//! dedicated session the update provider uses for feed requests.
//!
//! Update providers issue their own HTTP requests and cannot attach
//! arbitrary credentials, so a release feed behind a login only works if the
//! provider's session already holds the user's cookies. The copy runs once
//! per process.

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Url;
use reqwest::cookie::Jar;
use std::sync::Arc;

use crate::window::AppWindow;

/// Name of the network session reserved for update-feed requests
pub const UPDATE_SESSION_PARTITION: &str = "updater";

/// SameSite attribute of a cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    #[default]
    Unspecified,
    NoRestriction,
    Lax,
    Strict,
}

/// A cookie as reported by a browser session
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    /// Expiry as seconds since the UNIX epoch; `None` for session cookies
    pub expiration_date: Option<f64>,
    pub same_site: SameSite,
}

impl Cookie {
    /// Copy of this cookie with domain and path removed, so the receiving
    /// session derives them from the URL it is set against
    pub fn without_scope(&self) -> Self {
        Self {
            domain: None,
            path: None,
            ..self.clone()
        }
    }

    /// Render as a `Set-Cookie` header value
    pub fn to_set_cookie(&self, now: i64) -> Result<String> {
        if self.name.is_empty() || self.name.contains([';', '=', ' ']) {
            anyhow::bail!("Invalid cookie name '{}'", self.name);
        }
        if self.value.contains(';') {
            anyhow::bail!("Invalid value for cookie '{}'", self.name);
        }

        let mut header = format!("{}={}", self.name, self.value);
        if let Some(domain) = &self.domain {
            header.push_str(&format!("; Domain={}", domain));
        }
        if let Some(path) = &self.path {
            header.push_str(&format!("; Path={}", path));
        }
        // A non-finite expiry cannot be honoured; keep it as a session cookie
        if let Some(expires) = self.expiration_date.filter(|e| e.is_finite()) {
            let max_age = (expires as i64).saturating_sub(now).max(0);
            header.push_str(&format!("; Max-Age={}", max_age));
        }
        if self.secure {
            header.push_str("; Secure");
        }
        if self.http_only {
            header.push_str("; HttpOnly");
        }
        match self.same_site {
            SameSite::Unspecified => {}
            SameSite::NoRestriction => header.push_str("; SameSite=None"),
            SameSite::Lax => header.push_str("; SameSite=Lax"),
            SameSite::Strict => header.push_str("; SameSite=Strict"),
        }
        Ok(header)
    }
}

/// A session cookies can be read from
#[async_trait]
pub trait CookieSource: Send + Sync {
    /// All cookies that would be sent to `url`
    async fn cookies(&self, url: &Url) -> Result<Vec<Cookie>>;
}

/// A session cookies can be written to
#[async_trait]
pub trait CookieSink: Send + Sync {
    async fn set_cookie(&self, url: &Url, cookie: Cookie) -> Result<()>;
}

/// Cookie session dedicated to update-feed requests
pub struct UpdateSession {
    jar: Arc<Jar>,
}

impl UpdateSession {
    pub fn new() -> Self {
        Self {
            jar: Arc::new(Jar::default()),
        }
    }

    /// Session name, for hosts that key sessions by partition
    pub fn partition(&self) -> &'static str {
        UPDATE_SESSION_PARTITION
    }

    /// HTTP client whose requests carry this session's cookies
    pub fn client(&self) -> Result<reqwest::Client> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("shell-updater/", env!("CARGO_PKG_VERSION")))
            .cookie_provider(self.jar.clone())
            .build()?;
        Ok(client)
    }

    pub fn jar(&self) -> Arc<Jar> {
        self.jar.clone()
    }
}

impl Default for UpdateSession {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CookieSink for UpdateSession {
    async fn set_cookie(&self, url: &Url, cookie: Cookie) -> Result<()> {
        let header = cookie.to_set_cookie(chrono::Utc::now().timestamp())?;
        self.jar.add_cookie_str(&header, url);
        Ok(())
    }
}

/// Outcome of a cookie sync attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No release URL or no main window
    Skipped,
    /// A previous attempt already copied the cookies
    AlreadyCopied,
    /// Reading the main window's cookies failed; a later sync will retry
    SourceFailed,
    Copied { copied: usize, failed: usize },
}

/// One-shot cookie copy into the update session
#[derive(Debug, Default)]
pub struct SessionCookieBridge {
    copied: bool,
}

impl SessionCookieBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the copy has already been attempted
    pub fn is_copied(&self) -> bool {
        self.copied
    }

    /// Copy cookies scoped to `release_url` from the main window into `target`.
    ///
    /// Resolves once every cookie set has settled. Individual failures are
    /// logged and do not fail the sync.
    pub async fn sync(
        &mut self,
        release_url: Option<&Url>,
        main_window: Option<&Arc<dyn AppWindow>>,
        target: &dyn CookieSink,
    ) -> SyncOutcome {
        if self.copied {
            return SyncOutcome::AlreadyCopied;
        }
        let (Some(url), Some(window)) = (release_url, main_window) else {
            tracing::debug!("Skipping cookie sync: no release URL or main window");
            return SyncOutcome::Skipped;
        };

        let cookies = match window.cookie_session().cookies(url).await {
            Ok(cookies) => cookies,
            Err(e) => {
                tracing::warn!("Failed to read cookies for {}: {:#}", url, e);
                return SyncOutcome::SourceFailed;
            }
        };

        let results = join_all(
            cookies
                .iter()
                .map(|cookie| target.set_cookie(url, cookie.without_scope())),
        )
        .await;

        let mut failed = 0;
        for (cookie, result) in cookies.iter().zip(&results) {
            if let Err(e) = result {
                failed += 1;
                tracing::warn!("Failed to copy cookie '{}' to update session: {:#}", cookie.name, e);
            }
        }
        self.copied = true;

        let copied = results.len() - failed;
        tracing::info!("Copied {} cookie(s) into the update session ({} failed)", copied, failed);
        SyncOutcome::Copied { copied, failed }
    }
}

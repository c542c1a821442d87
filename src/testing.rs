//! Recording fakes of the host collaborators, for unit tests.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Url;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::cookies::{Cookie, CookieSink, CookieSource};
use crate::presenter::{ConfirmRequest, ConfirmResponse, ExternalOpener, MessageRequest, Presenter};
use crate::progress::Progress;
use crate::provider::{
    CheckTrigger, EventSink, ProviderEvent, ProviderLogger, SubscriptionId, UpdateProvider,
};
use crate::window::{AppWindow, WindowHost, WindowId};

pub struct FakeCookieSource {
    cookies: Vec<Cookie>,
    fail: bool,
    reads: AtomicUsize,
}

impl FakeCookieSource {
    pub fn new(cookies: Vec<Cookie>) -> Arc<Self> {
        Arc::new(Self {
            cookies,
            fail: false,
            reads: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            cookies: Vec::new(),
            fail: true,
            reads: AtomicUsize::new(0),
        })
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CookieSource for FakeCookieSource {
    async fn cookies(&self, _url: &Url) -> Result<Vec<Cookie>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("session unavailable");
        }
        Ok(self.cookies.clone())
    }
}

#[derive(Default)]
pub struct RecordingCookieSink {
    cookies: Mutex<Vec<(Url, Cookie)>>,
    reject: Option<String>,
}

impl RecordingCookieSink {
    pub fn rejecting(name: &str) -> Self {
        Self {
            cookies: Mutex::new(Vec::new()),
            reject: Some(name.to_string()),
        }
    }

    pub fn cookies(&self) -> Vec<(Url, Cookie)> {
        self.cookies.lock().unwrap().clone()
    }
}

#[async_trait]
impl CookieSink for RecordingCookieSink {
    async fn set_cookie(&self, url: &Url, cookie: Cookie) -> Result<()> {
        if self.reject.as_deref() == Some(cookie.name.as_str()) {
            anyhow::bail!("cookie rejected");
        }
        self.cookies.lock().unwrap().push((url.clone(), cookie));
        Ok(())
    }
}

pub struct FakeWindow {
    id: WindowId,
    focused: AtomicBool,
    progress: Mutex<Option<Progress>>,
    session: Arc<FakeCookieSource>,
}

impl FakeWindow {
    pub fn new(id: u64) -> Arc<Self> {
        Self::with_session(id, FakeCookieSource::new(Vec::new()))
    }

    pub fn with_session(id: u64, session: Arc<FakeCookieSource>) -> Arc<Self> {
        Arc::new(Self {
            id: WindowId(id),
            focused: AtomicBool::new(false),
            progress: Mutex::new(None),
            session,
        })
    }

    pub fn set_focused(&self, focused: bool) {
        self.focused.store(focused, Ordering::SeqCst);
    }

    /// Last value set on the progress indicator
    pub fn progress(&self) -> Option<Progress> {
        *self.progress.lock().unwrap()
    }
}

impl AppWindow for FakeWindow {
    fn id(&self) -> WindowId {
        self.id
    }

    fn is_focused(&self) -> bool {
        self.focused.load(Ordering::SeqCst)
    }

    fn set_progress_bar(&self, progress: Progress) {
        *self.progress.lock().unwrap() = Some(progress);
    }

    fn cookie_session(&self) -> Arc<dyn CookieSource> {
        self.session.clone()
    }
}

pub struct FakeWindowHost {
    windows: Mutex<Vec<Arc<dyn AppWindow>>>,
}

impl FakeWindowHost {
    pub fn new(windows: Vec<Arc<FakeWindow>>) -> Arc<Self> {
        Arc::new(Self {
            windows: Mutex::new(
                windows
                    .into_iter()
                    .map(|w| w as Arc<dyn AppWindow>)
                    .collect(),
            ),
        })
    }

    pub fn open(&self, window: Arc<FakeWindow>) {
        self.windows.lock().unwrap().push(window);
    }

    pub fn close_all(&self) {
        self.windows.lock().unwrap().clear();
    }
}

impl WindowHost for FakeWindowHost {
    fn windows(&self) -> Vec<Arc<dyn AppWindow>> {
        self.windows.lock().unwrap().clone()
    }
}

/// Presenter that answers confirms from a script and records everything shown
#[derive(Default)]
pub struct ScriptedPresenter {
    answers: Mutex<VecDeque<ConfirmResponse>>,
    confirms: Mutex<Vec<ConfirmRequest>>,
    notices: Mutex<Vec<MessageRequest>>,
}

impl ScriptedPresenter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue the answer for the next confirm
    pub fn answer(&self, response: usize, checkbox_checked: bool) {
        self.answers.lock().unwrap().push_back(ConfirmResponse {
            response,
            checkbox_checked,
        });
    }

    pub fn confirms(&self) -> Vec<ConfirmRequest> {
        self.confirms.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<MessageRequest> {
        self.notices.lock().unwrap().clone()
    }

    pub fn dialog_count(&self) -> usize {
        self.confirms.lock().unwrap().len() + self.notices.lock().unwrap().len()
    }
}

#[async_trait]
impl Presenter for ScriptedPresenter {
    async fn confirm(&self, _window: &dyn AppWindow, request: ConfirmRequest) -> ConfirmResponse {
        // Unscripted dialogs are dismissed
        let answer = self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ConfirmResponse {
                response: request.cancel_id,
                checkbox_checked: false,
            });
        self.confirms.lock().unwrap().push(request);
        answer
    }

    fn notify(&self, _window: &dyn AppWindow, request: MessageRequest) {
        self.notices.lock().unwrap().push(request);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderCommand {
    Check,
    Download,
    QuitAndInstall,
}

#[derive(Default)]
pub struct FakeProvider {
    commands: Mutex<Vec<ProviderCommand>>,
    auto_download: Mutex<Option<bool>>,
    logger: Mutex<Option<ProviderLogger>>,
    subscribers: Mutex<HashMap<SubscriptionId, EventSink<ProviderEvent>>>,
    fail_commands: AtomicBool,
}

impl FakeProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make check and download commands return an error
    pub fn fail_commands(&self) {
        self.fail_commands.store(true, Ordering::SeqCst);
    }

    pub fn emit(&self, event: ProviderEvent) {
        for sink in self.subscribers.lock().unwrap().values() {
            sink.emit(event.clone());
        }
    }

    pub fn commands(&self) -> Vec<ProviderCommand> {
        self.commands.lock().unwrap().clone()
    }

    pub fn auto_download(&self) -> Option<bool> {
        *self.auto_download.lock().unwrap()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }

    pub fn has_logger(&self) -> bool {
        self.logger.lock().unwrap().is_some()
    }

    fn record(&self, command: ProviderCommand) -> Result<()> {
        self.commands.lock().unwrap().push(command);
        if self.fail_commands.load(Ordering::SeqCst) {
            anyhow::bail!("feed unreachable");
        }
        Ok(())
    }
}

#[async_trait]
impl UpdateProvider for FakeProvider {
    fn set_auto_download(&self, enabled: bool) {
        *self.auto_download.lock().unwrap() = Some(enabled);
    }

    fn set_logger(&self, logger: ProviderLogger) {
        logger.debug("fake provider attached");
        *self.logger.lock().unwrap() = Some(logger);
    }

    fn subscribe(&self, events: EventSink<ProviderEvent>) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.subscribers.lock().unwrap().insert(id, events);
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.lock().unwrap().remove(&id);
    }

    async fn check_for_updates(&self) -> Result<()> {
        self.record(ProviderCommand::Check)
    }

    async fn download_update(&self) -> Result<()> {
        self.record(ProviderCommand::Download)
    }

    fn quit_and_install(&self) {
        self.commands
            .lock()
            .unwrap()
            .push(ProviderCommand::QuitAndInstall);
    }
}

#[derive(Default)]
pub struct FakeTrigger {
    subscribers: Mutex<HashMap<SubscriptionId, EventSink<()>>>,
}

impl FakeTrigger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fire(&self) {
        for sink in self.subscribers.lock().unwrap().values() {
            sink.emit(());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }
}

impl CheckTrigger for FakeTrigger {
    fn subscribe(&self, requests: EventSink<()>) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.subscribers.lock().unwrap().insert(id, requests);
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.lock().unwrap().remove(&id);
    }
}

#[derive(Default)]
pub struct RecordingOpener {
    urls: Mutex<Vec<String>>,
}

impl RecordingOpener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

impl ExternalOpener for RecordingOpener {
    fn open(&self, url: &str) {
        self.urls.lock().unwrap().push(url.to_string());
    }
}

//! Modal dialog capability used by the controller.
//!
//! Rendering belongs to the host shell. The controller only describes what
//! to ask and which window should host the dialog.

use async_trait::async_trait;
use std::sync::Arc;

use crate::window::{AppWindow, WindowHost};

/// Icon / severity of a dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Info,
    Question,
    Error,
}

/// A question with one or more buttons
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmRequest {
    pub kind: DialogKind,
    pub title: String,
    pub message: String,
    pub detail: Option<String>,
    pub buttons: Vec<String>,
    /// Button activated by Enter
    pub default_id: usize,
    /// Button reported when the dialog is dismissed
    pub cancel_id: usize,
    /// Label of the "don't ask again" checkbox, if shown
    pub checkbox_label: Option<String>,
}

impl ConfirmRequest {
    pub fn new(kind: DialogKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            detail: None,
            buttons: vec!["OK".to_string()],
            default_id: 0,
            cancel_id: 0,
            checkbox_label: None,
        }
    }

    pub fn buttons(mut self, buttons: &[&str]) -> Self {
        self.buttons = buttons.iter().map(|b| b.to_string()).collect();
        self
    }

    pub fn default_id(mut self, id: usize) -> Self {
        self.default_id = id;
        self
    }

    pub fn cancel_id(mut self, id: usize) -> Self {
        self.cancel_id = id;
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn checkbox(mut self, label: impl Into<String>) -> Self {
        self.checkbox_label = Some(label.into());
        self
    }
}

/// The user's answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfirmResponse {
    /// Index into [`ConfirmRequest::buttons`]
    pub response: usize,
    pub checkbox_checked: bool,
}

/// A message with a single acknowledgement button
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRequest {
    pub kind: DialogKind,
    pub title: String,
    pub message: String,
}

impl MessageRequest {
    pub fn new(kind: DialogKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Host capability for modal dialogs
#[async_trait]
pub trait Presenter: Send + Sync {
    /// Show a modal question and wait for the answer
    async fn confirm(&self, window: &dyn AppWindow, request: ConfirmRequest) -> ConfirmResponse;

    /// Show a message without waiting for it to be dismissed
    fn notify(&self, window: &dyn AppWindow, request: MessageRequest);
}

/// Window that should host a dialog: the focused one, else the first opened
pub fn target_window(host: &dyn WindowHost) -> Option<Arc<dyn AppWindow>> {
    host.focused_window()
        .or_else(|| host.windows().into_iter().next())
}

/// Opens URLs outside the app
pub trait ExternalOpener: Send + Sync {
    fn open(&self, url: &str);
}

/// Opens URLs in the system browser
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl ExternalOpener for SystemOpener {
    fn open(&self, url: &str) {
        if let Err(e) = open::that(url) {
            tracing::warn!("Failed to open {}: {}", url, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeWindow, FakeWindowHost};

    #[test]
    fn test_target_prefers_focused_window() {
        let first = FakeWindow::new(1);
        let second = FakeWindow::new(2);
        second.set_focused(true);
        let host = FakeWindowHost::new(vec![first, second]);

        assert_eq!(target_window(host.as_ref()).unwrap().id().0, 2);
    }

    #[test]
    fn test_target_falls_back_to_first_window() {
        let host = FakeWindowHost::new(vec![FakeWindow::new(7), FakeWindow::new(8)]);
        assert_eq!(target_window(host.as_ref()).unwrap().id().0, 7);
    }

    #[test]
    fn test_no_target_without_windows() {
        let host = FakeWindowHost::new(Vec::new());
        assert!(target_window(host.as_ref()).is_none());
    }

    #[test]
    fn test_confirm_request_builder() {
        let request = ConfirmRequest::new(DialogKind::Question, "Update", "New version")
            .buttons(&["Download", "Cancel"])
            .cancel_id(1)
            .checkbox("Don't ask again");
        assert_eq!(request.buttons, vec!["Download", "Cancel"]);
        assert_eq!(request.default_id, 0);
        assert_eq!(request.cancel_id, 1);
        assert_eq!(request.checkbox_label.as_deref(), Some("Don't ask again"));
    }
}

//! Window boundary. Windows are created and destroyed by the host shell;
//! the updater only looks at them.

use std::sync::Arc;

use crate::cookies::CookieSource;
use crate::progress::Progress;

/// Opaque identifier of a host window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u64);

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

/// A window owned by the host shell
pub trait AppWindow: Send + Sync {
    fn id(&self) -> WindowId;

    fn is_focused(&self) -> bool;

    /// Set the OS-level progress indicator (taskbar / dock)
    fn set_progress_bar(&self, progress: Progress);

    /// The network session the window's web content uses
    fn cookie_session(&self) -> Arc<dyn CookieSource>;
}

/// Registry of currently open windows
pub trait WindowHost: Send + Sync {
    /// Open windows in the order they were opened
    fn windows(&self) -> Vec<Arc<dyn AppWindow>>;

    /// The window with keyboard focus, if any
    fn focused_window(&self) -> Option<Arc<dyn AppWindow>> {
        self.windows().into_iter().find(|w| w.is_focused())
    }
}

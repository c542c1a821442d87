//! Mirrors download progress onto every open window's progress indicator.

use std::sync::Arc;

use crate::window::WindowHost;

/// Value shown by an OS progress indicator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    /// Determinate progress as a fraction (0.0 - 1.0)
    Fraction(f64),
    /// Hide the indicator
    None,
}

impl Progress {
    /// Convert a provider percentage (0 - 100). Non-finite input yields `None`.
    pub fn from_percent(percent: f64) -> Option<Self> {
        percent
            .is_finite()
            .then(|| Progress::Fraction((percent / 100.0).clamp(0.0, 1.0)))
    }

    /// Raw value as understood by window toolkits, where -1 hides the bar
    pub fn as_raw(&self) -> f64 {
        match self {
            Progress::Fraction(value) => *value,
            Progress::None => -1.0,
        }
    }
}

/// Fans a progress value out to all windows the host reports
#[derive(Clone)]
pub struct ProgressBroadcaster {
    host: Arc<dyn WindowHost>,
}

impl ProgressBroadcaster {
    pub fn new(host: Arc<dyn WindowHost>) -> Self {
        Self { host }
    }

    pub fn set_progress(&self, progress: Progress) {
        let windows = self.host.windows();
        tracing::trace!("Setting progress {:?} on {} window(s)", progress, windows.len());
        for window in windows {
            window.set_progress_bar(progress);
        }
    }
}

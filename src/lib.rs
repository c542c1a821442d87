//! Auto-update orchestration for a desktop application shell.
//!
//! This crate decides when to check the release feed, mirrors the session
//! cookies the feed may need, asks the user what to do with a new version,
//! drives the download and installation, and remembers versions the user
//! chose to skip.
//!
//! The host shell supplies windows, dialogs and the update provider through
//! the traits in [`window`], [`presenter`], [`provider`] and [`cookies`];
//! [`UpdateRuntime`] runs the [`UpdateController`] on a single event loop.

pub mod config;
pub mod controller;
pub mod cookies;
pub mod environment;
pub mod error;
pub mod ignore_store;
pub mod logging;
pub mod presenter;
pub mod progress;
pub mod provider;
pub mod runtime;
pub mod window;

#[cfg(test)]
mod testing;

pub use config::{Config, ReleaseConfig};
pub use controller::{UpdateController, UpdateEvent, UpdatePhase, UpdateServices};
pub use environment::{Environment, Platform};
pub use error::{IgnoreStoreError, UpdaterError};
pub use ignore_store::IgnoreStore;
pub use runtime::UpdateRuntime;

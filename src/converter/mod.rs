//! # Converter Module
//!
//! Browser automation for the third-party conversion service that turns a
//! media link into an audio download. The service is the most fragile
//! dependency of the tool: its backend fails intermittently and its download
//! control opens ad windows. This module isolates all of it.
//!
//! ## Components
//!
//! - [`browser`] - The [`BrowserSession`] capability trait and [`Locator`]
//! - [`chromium`] - [`ChromiumSession`], the headless Chromium implementation
//! - [`automator`] - [`ConversionAutomator`], the per-job state machine
//! - [`queue`] - Sequential processing of a job list into a [`DownloadReport`]
//!
//! ## Job Lifecycle
//!
//! ```text
//! Idle → Submitted → (ErrorRecovery)* → AwaitingResult → Downloading → Idle
//! ```
//!
//! Every wait is bounded. A job that runs out of time fails alone; the
//! session is kept and the next job starts from the home window.

pub mod automator;
pub mod browser;
pub mod chromium;
pub mod queue;

pub use automator::{
    AutomatorState, AutomatorTimings, BACKEND_ERROR_MESSAGE, ConversionAutomator,
    ConversionError, ConverterPage, JobOutcome,
};
pub use browser::{BrowserError, BrowserSession, Locator};
pub use chromium::{ChromiumSession, download_behavior};
pub use queue::{DownloadReport, FailedJob, process_jobs};

use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, sleep};

use crate::{
    converter::browser::{BrowserError, BrowserSession, Locator},
    info,
    types::WindowHandle,
    warning,
};

/// Transient failure rendered by the conversion backend. A page reload
/// usually clears it.
pub const BACKEND_ERROR_MESSAGE: &str = "An backend error occurred. Error code (p:3 / e:0).";

/// Bounded waits of a conversion job.
#[derive(Debug, Clone)]
pub struct AutomatorTimings {
    /// Total time spent looking for the backend error after a submission.
    pub error_window: Duration,
    /// Wait for the backend error to show up before assuming it won't.
    pub error_check: Duration,
    /// Pause after reloading an errored page.
    pub reload_settle: Duration,
    /// Wait for the download control. Expiry fails the job.
    pub download_wait: Duration,
    /// Pause after the download started, before the next navigation.
    pub download_settle: Duration,
    pub poll_interval: Duration,
}

impl Default for AutomatorTimings {
    fn default() -> Self {
        Self {
            error_window: Duration::from_secs(50),
            error_check: Duration::from_secs(10),
            reload_settle: Duration::from_secs(3),
            download_wait: Duration::from_secs(60),
            download_settle: Duration::from_secs(6),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Where things live on the converter page.
#[derive(Debug, Clone)]
pub struct ConverterPage {
    pub entry_url: String,
    pub input: Locator,
    pub convert: Locator,
    pub backend_error: Locator,
    pub download: Locator,
}

impl ConverterPage {
    pub fn new(entry_url: impl Into<String>) -> Self {
        Self {
            entry_url: entry_url.into(),
            input: Locator::id("url"),
            convert: Locator::css(r#"input[type="submit"][value="Convert"]"#),
            backend_error: Locator::text(BACKEND_ERROR_MESSAGE),
            download: Locator::link_text("Download"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutomatorState {
    Idle,
    Submitted,
    ErrorRecovery,
    AwaitingResult,
    Downloading,
}

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("timed out after {after:?} waiting for {what}")]
    Timeout { what: String, after: Duration },
    #[error("automation fault: {0}")]
    Fault(#[from] BrowserError),
}

impl ConversionError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ConversionError::Timeout { .. })
    }
}

#[derive(Debug)]
pub enum JobOutcome {
    Downloaded { reloads: u32, closed_windows: usize },
    Failed(ConversionError),
}

impl JobOutcome {
    pub fn is_downloaded(&self) -> bool {
        matches!(self, JobOutcome::Downloaded { .. })
    }
}

/// Drives the conversion service through one persistent browser session.
///
/// Each job runs `Idle → Submitted → (ErrorRecovery)* → AwaitingResult →
/// Downloading → Idle` against the home window. Whatever happens, a job
/// ends with every other window closed and the home window focused, so the
/// next job starts from a known context.
pub struct ConversionAutomator<S: BrowserSession> {
    session: S,
    page: ConverterPage,
    timings: AutomatorTimings,
    home: WindowHandle,
    state: AutomatorState,
}

impl<S: BrowserSession> ConversionAutomator<S> {
    /// Takes ownership of the session; its focused window becomes home.
    pub async fn new(
        mut session: S,
        page: ConverterPage,
        timings: AutomatorTimings,
    ) -> Result<Self, BrowserError> {
        let home = session.current_window().await?;
        Ok(Self {
            session,
            page,
            timings,
            home,
            state: AutomatorState::Idle,
        })
    }

    pub fn state(&self) -> AutomatorState {
        self.state
    }

    pub fn home(&self) -> &WindowHandle {
        &self.home
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Converts and downloads a single media URL.
    ///
    /// Failures are contained: they are logged and returned as
    /// [`JobOutcome::Failed`], and the session stays usable for the next job.
    pub async fn process_one(&mut self, media_url: &str) -> JobOutcome {
        let result = self.convert(media_url).await;

        let closed_windows = match self.restore_home().await {
            Ok(closed) => closed,
            Err(e) => {
                warning!("Failed to restore the home window: {}", e);
                0
            }
        };

        let outcome = match result {
            Ok(reloads) => {
                sleep(self.timings.download_settle).await;
                JobOutcome::Downloaded {
                    reloads,
                    closed_windows,
                }
            }
            Err(e) => {
                warning!("An error occurred while processing {}: {}", media_url, e);
                JobOutcome::Failed(e)
            }
        };

        self.state = AutomatorState::Idle;
        outcome
    }

    /// Tears the browser session down.
    pub async fn shutdown(mut self) -> Result<(), BrowserError> {
        self.session.shutdown().await
    }

    async fn convert(&mut self, media_url: &str) -> Result<u32, ConversionError> {
        self.submit(media_url).await?;
        let reloads = self.recover_from_backend_error().await;
        self.await_result().await?;

        self.state = AutomatorState::Downloading;
        self.session.click(&self.page.download).await?;

        Ok(reloads)
    }

    async fn submit(&mut self, media_url: &str) -> Result<(), ConversionError> {
        self.session.switch_window(&self.home).await?;
        self.session.navigate(&self.page.entry_url).await?;
        self.session.type_text(&self.page.input, media_url).await?;
        self.session.click(&self.page.convert).await?;
        self.state = AutomatorState::Submitted;
        Ok(())
    }

    /// Reloads the page while the backend error keeps showing up, for at
    /// most `error_window`. Returns the number of reloads.
    ///
    /// A failing check counts as "no error", so this never blocks past its
    /// window.
    async fn recover_from_backend_error(&mut self) -> u32 {
        let started = Instant::now();
        let mut reloads = 0;
        let backend_error = self.page.backend_error.clone();

        while started.elapsed() < self.timings.error_window {
            match self.wait_for(&backend_error, self.timings.error_check).await {
                Ok(true) => {
                    self.state = AutomatorState::ErrorRecovery;
                    warning!("Encountered backend error. Refreshing the page...");
                    if let Err(e) = self.session.reload().await {
                        warning!("Error refreshing browser: {}", e);
                        break;
                    }
                    reloads += 1;
                    sleep(self.timings.reload_settle).await;
                    self.state = AutomatorState::Submitted;
                }
                Ok(false) => {
                    info!("No backend error found.");
                    break;
                }
                Err(e) => {
                    warning!("Backend error check failed: {}", e);
                    break;
                }
            }
        }

        reloads
    }

    async fn await_result(&mut self) -> Result<(), ConversionError> {
        self.state = AutomatorState::AwaitingResult;
        let download = self.page.download.clone();

        if self.wait_for(&download, self.timings.download_wait).await? {
            Ok(())
        } else {
            Err(ConversionError::Timeout {
                what: download.to_string(),
                after: self.timings.download_wait,
            })
        }
    }

    /// Polls for `locator` until it shows up or `timeout` passes.
    async fn wait_for(&mut self, locator: &Locator, timeout: Duration) -> Result<bool, BrowserError> {
        let deadline = Instant::now() + timeout;

        loop {
            if self.session.is_present(locator).await? {
                return Ok(true);
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            sleep(self.timings.poll_interval.min(deadline - now)).await;
        }
    }

    /// Closes every window except home and focuses home again.
    async fn restore_home(&mut self) -> Result<usize, BrowserError> {
        let mut closed = 0;

        for handle in self.session.list_windows().await? {
            if handle == self.home {
                continue;
            }
            match self.session.close_window(&handle).await {
                Ok(()) => closed += 1,
                Err(e) => warning!("Failed to close window {}: {}", handle, e),
            }
        }

        self.session.switch_window(&self.home).await?;
        Ok(closed)
    }
}

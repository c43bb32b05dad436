use std::path::Path;

use tabled::Table;

use crate::{
    config,
    converter::{
        AutomatorTimings, ChromiumSession, ConversionAutomator, ConverterPage, process_jobs,
    },
    error, info,
    management::{FailureLogManager, TrackListManager},
    success, warning,
};

pub async fn download(input: &Path, headed: bool, download_dir: &Path) {
    let jobs = match TrackListManager::new(input).load_jobs().await {
        Ok(jobs) => jobs,
        Err(e) => {
            error!("Failed to read {}. Err: {}", input.display(), e);
        }
    };

    if jobs.iter().all(|job| job.media_url.is_none()) {
        warning!("No YouTube links in {}. Run sporldl resolve first.", input.display());
        return;
    }

    let session = match ChromiumSession::launch(headed, download_dir).await {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to launch browser session. Err: {}", e);
        }
    };

    let page = ConverterPage::new(config::converter_url());
    let mut automator =
        match ConversionAutomator::new(session, page, AutomatorTimings::default()).await {
            Ok(a) => a,
            Err(e) => {
                error!("Failed to attach to browser session. Err: {}", e);
            }
        };

    let report = process_jobs(&mut automator, &jobs).await;

    if let Err(e) = automator.shutdown().await {
        warning!("Failed to close browser session. Err: {}", e);
    }

    println!("{}", Table::new(report.table_rows()));

    if !report.failed.is_empty() {
        let log = FailureLogManager::for_track_list(input);
        match log.persist(&report.failed).await {
            Ok(()) => info!("Failed jobs written to {}", log.path().display()),
            Err(e) => warning!("Failed to write failure log. Err: {}", e),
        }
    }

    success!(
        "Downloaded {} of {} tracks to {}",
        report.downloaded,
        jobs.len(),
        download_dir.display()
    );
}

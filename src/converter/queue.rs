use chrono::{DateTime, Utc};

use crate::{
    converter::{
        automator::{ConversionAutomator, JobOutcome},
        browser::BrowserSession,
    },
    info,
    types::{DownloadJob, ReportTableRow},
    warning,
};

#[derive(Debug, Clone)]
pub struct FailedJob {
    pub job: DownloadJob,
    pub reason: String,
    pub timed_out: bool,
    pub failed_at: DateTime<Utc>,
}

/// Result of a download phase, one entry per job.
#[derive(Debug, Default)]
pub struct DownloadReport {
    pub downloaded: usize,
    /// Jobs that never had a media link.
    pub unresolved: Vec<DownloadJob>,
    pub failed: Vec<FailedJob>,
}

impl DownloadReport {
    pub fn timed_out(&self) -> usize {
        self.failed.iter().filter(|f| f.timed_out).count()
    }

    pub fn faulted(&self) -> usize {
        self.failed.iter().filter(|f| !f.timed_out).count()
    }

    pub fn table_rows(&self) -> Vec<ReportTableRow> {
        vec![
            ReportTableRow {
                outcome: "downloaded".to_string(),
                count: self.downloaded,
            },
            ReportTableRow {
                outcome: "no link found".to_string(),
                count: self.unresolved.len(),
            },
            ReportTableRow {
                outcome: "timed out".to_string(),
                count: self.timed_out(),
            },
            ReportTableRow {
                outcome: "failed".to_string(),
                count: self.faulted(),
            },
        ]
    }
}

/// Runs every job through the automator, one at a time.
///
/// Jobs without a media link are skipped. A failed job is recorded and the
/// next one starts from a clean session.
pub async fn process_jobs<S: BrowserSession>(
    automator: &mut ConversionAutomator<S>,
    jobs: &[DownloadJob],
) -> DownloadReport {
    let mut report = DownloadReport::default();
    let total = jobs.len();

    for (idx, job) in jobs.iter().enumerate() {
        let title = &job.track.title;
        let artists = job.track.artist_line();

        let Some(media_url) = job.media_url.as_deref() else {
            warning!(
                "No YouTube URL found for: {} by {}. Skipping download.",
                title,
                artists
            );
            report.unresolved.push(job.clone());
            continue;
        };

        info!(
            "[{}/{}] Downloading MP3 for: {} by {} - {}",
            idx + 1,
            total,
            title,
            artists,
            media_url
        );

        match automator.process_one(media_url).await {
            JobOutcome::Downloaded { reloads, .. } => {
                if reloads > 0 {
                    info!("Recovered from {} backend error(s) for {}", reloads, title);
                }
                report.downloaded += 1;
            }
            JobOutcome::Failed(e) => report.failed.push(FailedJob {
                job: job.clone(),
                reason: e.to_string(),
                timed_out: e.is_timeout(),
                failed_at: Utc::now(),
            }),
        }
    }

    report
}

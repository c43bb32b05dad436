use std::path::{Path, PathBuf};

use crate::{
    converter::FailedJob,
    management::tracks::{COLUMN_ARTISTS, COLUMN_LINK, COLUMN_TRACK_NAME, StoreError, write_csv},
};

/// Writes failed conversion jobs next to the track list so they can be
/// reprocessed by hand.
pub struct FailureLogManager {
    path: PathBuf,
}

impl FailureLogManager {
    /// `playlist.csv` logs to `playlist.failed.csv` in the same directory.
    pub fn for_track_list(track_list: &Path) -> Self {
        let stem = track_list
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "tracks".to_string());
        Self {
            path: track_list.with_file_name(format!("{}.failed.csv", stem)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn persist(&self, failed: &[FailedJob]) -> Result<(), StoreError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            COLUMN_TRACK_NAME,
            COLUMN_ARTISTS,
            COLUMN_LINK,
            "Reason",
            "Failed At",
        ])?;

        for entry in failed {
            writer.write_record([
                entry.job.track.title.as_str(),
                entry.job.track.artist_line().as_str(),
                entry.job.media_url.as_deref().unwrap_or_default(),
                entry.reason.as_str(),
                entry.failed_at.to_rfc3339().as_str(),
            ])?;
        }

        write_csv(&self.path, writer).await
    }
}

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::{DownloadJob, Track};

pub const COLUMN_TRACK_NAME: &str = "Track Name";
pub const COLUMN_ARTISTS: &str = "Artists";
pub const COLUMN_LINK: &str = "YouTube Link";

const ARTIST_SEPARATOR: &str = ", ";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing column '{0}'")]
    MissingColumn(&'static str),
}

/// Reads and writes the intermediate track list.
///
/// The file has the columns `Track Name, Artists` after fetching and gains
/// `YouTube Link` once links are resolved. An empty link cell means no link
/// was found.
pub struct TrackListManager {
    path: PathBuf,
}

impl TrackListManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn save_tracks(&self, tracks: &[Track]) -> Result<(), StoreError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([COLUMN_TRACK_NAME, COLUMN_ARTISTS])?;
        for track in tracks {
            writer.write_record([track.title.as_str(), track.artist_line().as_str()])?;
        }
        write_csv(&self.path, writer).await
    }

    pub async fn save_jobs(&self, jobs: &[DownloadJob]) -> Result<(), StoreError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([COLUMN_TRACK_NAME, COLUMN_ARTISTS, COLUMN_LINK])?;
        for job in jobs {
            writer.write_record([
                job.track.title.as_str(),
                job.track.artist_line().as_str(),
                job.media_url.as_deref().unwrap_or_default(),
            ])?;
        }
        write_csv(&self.path, writer).await
    }

    pub async fn load_tracks(&self) -> Result<Vec<Track>, StoreError> {
        Ok(self
            .load_jobs()
            .await?
            .into_iter()
            .map(|job| job.track)
            .collect())
    }

    /// Loads every row; files without a link column yield jobs without links.
    ///
    /// The artists cell is split on `", "`, so a name that itself contains
    /// one ("Tyler, The Creator") comes back as two entries. The joined
    /// artist line, which is all the later phases use, is unchanged.
    pub async fn load_jobs(&self) -> Result<Vec<DownloadJob>, StoreError> {
        let content = async_fs::read(&self.path).await?;
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_slice());

        let headers = reader.headers()?.clone();
        let column = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or(StoreError::MissingColumn(name))
        };
        let title_idx = column(COLUMN_TRACK_NAME)?;
        let artists_idx = column(COLUMN_ARTISTS)?;
        let link_idx = column(COLUMN_LINK).ok();

        let mut jobs = Vec::new();
        for record in reader.records() {
            let record = record?;
            let title = record.get(title_idx).unwrap_or_default();
            let artists = split_artists(record.get(artists_idx).unwrap_or_default());
            let media_url = link_idx
                .and_then(|idx| record.get(idx))
                .map(str::trim)
                .filter(|link| !link.is_empty())
                .map(str::to_string);

            jobs.push(DownloadJob::new(Track::new(title, artists), media_url));
        }

        Ok(jobs)
    }
}

/// Inverse of [`Track::artist_line`] except for names containing `", "`.
fn split_artists(line: &str) -> Vec<String> {
    line.split(ARTIST_SEPARATOR)
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) async fn write_csv(path: &Path, writer: csv::Writer<Vec<u8>>) -> Result<(), StoreError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| StoreError::Io(e.into_error()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        async_fs::create_dir_all(parent).await?;
    }

    async_fs::write(path, bytes).await?;
    Ok(())
}

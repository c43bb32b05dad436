mod failures;
mod tracks;

pub use failures::FailureLogManager;
pub use tracks::StoreError;
pub use tracks::TrackListManager;
pub use tracks::{COLUMN_ARTISTS, COLUMN_LINK, COLUMN_TRACK_NAME};

use std::path::Path;

use crate::cli::{download, fetch, resolve};

pub async fn run(playlist_id: &str, output: &Path, headed: bool, download_dir: &Path) {
    fetch(playlist_id, output).await;
    resolve(output).await;
    download(output, headed, download_dir).await;
}

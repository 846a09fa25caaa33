//! Media download to local disk.

use crate::error::{ClientError, Result};
use futures_util::StreamExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Download client for creative media.
///
/// Media URLs are absolute and usually point at a CDN, so no bearer token is sent.
pub struct DownloadClient<'a> {
    http: &'a Client,
}

impl<'a> DownloadClient<'a> {
    pub(crate) fn new(http: &'a Client) -> Self {
        Self { http }
    }

    /// Download `url` into `dest_path`.
    ///
    /// The body is streamed into a `.part` sibling and renamed into place only
    /// once complete and non-empty, so `dest_path` never holds a partial file.
    ///
    /// # Returns
    /// Number of bytes written.
    pub async fn download(&self, url: &str, dest_path: &Path) -> Result<u64> {
        debug!(url = %url, dest = %dest_path.display(), "Downloading media");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(ClientError::from_send)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::from_response(response).await);
        }

        if let Some(parent) = dest_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let part_path = part_path(dest_path);
        let written = match write_stream(response, &part_path).await {
            Ok(written) => written,
            Err(e) => {
                let _ = tokio::fs::remove_file(&part_path).await;
                return Err(e);
            }
        };

        if written == 0 {
            let _ = tokio::fs::remove_file(&part_path).await;
            return Err(ClientError::EmptyBody(url.to_string()));
        }

        tokio::fs::rename(&part_path, dest_path).await?;

        info!(
            url = %url,
            dest = %dest_path.display(),
            size = written,
            "Media downloaded"
        );

        Ok(written)
    }
}

fn part_path(dest_path: &Path) -> PathBuf {
    let mut name = dest_path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

async fn write_stream(response: reqwest::Response, path: &Path) -> Result<u64> {
    let mut file = File::create(path).await?;
    let mut written: u64 = 0;

    let mut stream = response.bytes_stream();
    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(ClientError::from_send)?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_path_is_sibling() {
        let part = part_path(Path::new("/data/media/c1.mp4"));
        assert_eq!(part, PathBuf::from("/data/media/c1.mp4.part"));
    }
}

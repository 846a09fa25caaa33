use crate::error::{Result, SyncError};
use marquee_client::AssetDownloader;
use marquee_core::{is_valid, url_extension, CreativeRef, MediaType, Playlist};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of a localize or repair pass over a playlist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    /// Already had a valid local copy
    pub healthy: usize,
    /// Freshly downloaded during this pass
    pub repaired: usize,
    /// Still without a valid local copy
    pub failed: usize,
    /// Not cached at all (placeholder, or caching disabled)
    pub skipped: usize,
}

/// Maps remote creative URLs to validated local copies.
///
/// Files are keyed by creative id, not by content: a creative whose media changes
/// upstream while keeping its id keeps playing the old local copy.
pub struct AssetCache {
    downloader: Arc<dyn AssetDownloader>,
    media_dir: PathBuf,
    enabled: bool,
}

impl AssetCache {
    /// Cache storing media under `media_dir`.
    ///
    /// With `enabled == false` (no durable storage) nothing is downloaded and
    /// creatives play straight from their remote URL.
    pub fn new(downloader: Arc<dyn AssetDownloader>, media_dir: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            downloader,
            media_dir: media_dir.into(),
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    /// Deterministic local path for a creative
    pub fn cache_path(&self, creative: &CreativeRef) -> PathBuf {
        let ext = url_extension(&creative.url)
            .filter(|ext| ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or_else(|| {
                let ext = match creative.media_type.unwrap_or(MediaType::Image) {
                    MediaType::Video => "mp4",
                    MediaType::Image => "img",
                };
                ext.to_string()
            });

        self.media_dir
            .join(format!("{}.{}", sanitize_file_stem(&creative.creative_id), ext))
    }

    fn should_cache(&self, creative: &CreativeRef) -> bool {
        self.enabled && !creative.is_placeholder()
    }

    /// Ensure a local copy of `creative` exists and return the ref pointing at it.
    ///
    /// A valid file already at the derived path is reused without any network
    /// traffic. On download failure the error is returned and the caller keeps the
    /// ref unchanged.
    pub async fn materialize(&self, creative: &CreativeRef) -> Result<CreativeRef> {
        if !self.should_cache(creative) {
            return Ok(creative.clone());
        }

        let path = self.cache_path(creative);
        if is_valid(Some(&path)) {
            debug!(creative_id = %creative.creative_id, path = %path.display(), "Reusing cached asset");
            return Ok(CreativeRef {
                local_path: Some(path),
                ..creative.clone()
            });
        }

        self.downloader
            .download(&creative.url, &path)
            .await
            .map_err(SyncError::Download)?;

        // The downloader guarantees a non-empty file, but only the predicate is trusted.
        if !is_valid(Some(&path)) {
            return Err(SyncError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("downloaded asset failed validation: {}", path.display()),
            )));
        }

        Ok(CreativeRef {
            local_path: Some(path),
            ..creative.clone()
        })
    }

    /// Materialize every creative of the playlist in place.
    pub async fn localize(&self, playlist: &mut Playlist) -> RepairReport {
        let mut report = RepairReport::default();

        for creative in &mut playlist.items {
            if !self.should_cache(creative) {
                report.skipped += 1;
                continue;
            }

            let was_valid = is_valid(creative.local_path.as_deref())
                && creative.local_path.as_deref() == Some(self.cache_path(creative).as_path());

            match self.materialize(creative).await {
                Ok(localized) => {
                    if was_valid {
                        report.healthy += 1;
                    } else {
                        report.repaired += 1;
                    }
                    *creative = localized;
                }
                Err(e) => {
                    warn!(
                        creative_id = %creative.creative_id,
                        url = %creative.url,
                        error = %e,
                        "Asset not cached yet"
                    );
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Re-download every creative whose current local file is invalid.
    ///
    /// Best effort: a failure on one creative never stops the others.
    pub async fn repair(&self, playlist: &mut Playlist) -> RepairReport {
        let mut report = RepairReport::default();

        for creative in &mut playlist.items {
            if !self.should_cache(creative) {
                report.skipped += 1;
                continue;
            }

            if is_valid(creative.local_path.as_deref()) {
                report.healthy += 1;
                continue;
            }

            match self.materialize(creative).await {
                Ok(localized) => {
                    info!(creative_id = %creative.creative_id, "Asset repaired");
                    *creative = localized;
                    report.repaired += 1;
                }
                Err(e) => {
                    warn!(
                        creative_id = %creative.creative_id,
                        error = %e,
                        "Asset repair failed"
                    );
                    report.failed += 1;
                }
            }
        }

        if report.repaired > 0 || report.failed > 0 {
            info!(
                healthy = report.healthy,
                repaired = report.repaired,
                failed = report.failed,
                "Asset repair pass complete"
            );
        }

        report
    }

    /// Delete cached files not referenced by `playlist`.
    ///
    /// Returns how many files were removed.
    pub async fn prune(&self, playlist: &Playlist) -> Result<usize> {
        if !self.enabled {
            return Ok(0);
        }

        let keep: HashSet<PathBuf> = playlist
            .items
            .iter()
            .filter(|c| !c.is_placeholder())
            .map(|c| self.cache_path(c))
            .collect();

        let mut entries = match tokio::fs::read_dir(&self.media_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_file() || keep.contains(&path) {
                continue;
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    debug!(path = %path.display(), "Pruned unreferenced asset");
                    removed += 1;
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to prune asset"),
            }
        }

        if removed > 0 {
            info!(removed, "Pruned unreferenced assets");
        }

        Ok(removed)
    }
}

/// Creative ids come from the server; keep them from escaping the media dir.
fn sanitize_file_stem(id: &str) -> String {
    let stem: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if stem.is_empty() {
        "creative".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_client::ClientError;

    struct NoDownloads;

    #[async_trait::async_trait]
    impl AssetDownloader for NoDownloads {
        async fn download(&self, url: &str, _dest: &Path) -> marquee_client::Result<u64> {
            Err(ClientError::ServerUnreachable(url.to_string()))
        }
    }

    fn cache(dir: &Path) -> AssetCache {
        AssetCache::new(Arc::new(NoDownloads), dir, true)
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("c-1_a"), "c-1_a");
        assert_eq!(sanitize_file_stem("../../etc"), "______etc");
        assert_eq!(sanitize_file_stem("a b/c"), "a_b_c");
        assert_eq!(sanitize_file_stem(""), "creative");
    }

    #[test]
    fn test_cache_path_uses_url_extension() {
        let cache = cache(Path::new("/media"));
        let creative = CreativeRef::new("c1", "https://cdn/x/spot.MP4?sig=abc", 5);
        assert_eq!(cache.cache_path(&creative), PathBuf::from("/media/c1.mp4"));
    }

    #[test]
    fn test_cache_path_defaults_by_media_type() {
        let cache = cache(Path::new("/media"));
        let video = CreativeRef::new("v1", "https://cdn/stream", 5).with_media_type(MediaType::Video);
        let image = CreativeRef::new("i1", "https://cdn/render", 5);
        assert_eq!(cache.cache_path(&video), PathBuf::from("/media/v1.mp4"));
        assert_eq!(cache.cache_path(&image), PathBuf::from("/media/i1.img"));
    }

    #[tokio::test]
    async fn test_reuses_valid_file_without_download() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());
        let creative = CreativeRef::new("c1", "https://cdn/a.png", 5);
        std::fs::write(cache.cache_path(&creative), b"png").unwrap();

        let localized = cache.materialize(&creative).await.unwrap();
        assert_eq!(localized.local_path, Some(dir.path().join("c1.png")));
    }

    #[tokio::test]
    async fn test_failed_download_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());
        let creative = CreativeRef::new("c1", "https://cdn/a.png", 5);

        assert!(matches!(
            cache.materialize(&creative).await,
            Err(SyncError::Download(_))
        ));
    }

    #[tokio::test]
    async fn test_disabled_cache_passes_through() {
        let cache = AssetCache::new(Arc::new(NoDownloads), "/nonexistent", false);
        let creative = CreativeRef::new("c1", "https://cdn/a.png", 5);

        let out = cache.materialize(&creative).await.unwrap();
        assert_eq!(out, creative);
        assert!(out.local_path.is_none());
    }
}

use crate::cache::{AssetCache, RepairReport};
use marquee_client::{PlayerApi, PlaylistFetch};
use marquee_core::{DeviceIdentity, Playlist};
use marquee_storage::{keys, PersistentStore};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Which source the resolved playlist came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOutcome {
    /// Server sent a new revision
    Remote,
    /// Server confirmed the cached revision is current
    Unchanged,
    /// Server unreachable or failing; cached playlist used
    Cached,
    /// Nothing usable anywhere; built-in placeholder used
    Fallback,
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::Remote => write!(f, "remote"),
            SyncOutcome::Unchanged => write!(f, "unchanged"),
            SyncOutcome::Cached => write!(f, "cached"),
            SyncOutcome::Fallback => write!(f, "fallback"),
        }
    }
}

/// Resolved playlist plus how it was obtained
#[derive(Debug, Clone)]
pub struct SyncResult {
    /// Never empty
    pub playlist: Playlist,
    pub outcome: SyncOutcome,
    pub assets: RepairReport,
}

/// Conditional playlist sync with a guaranteed non-empty result.
///
/// Resolution priority: new remote playlist, then the cached local playlist,
/// then the built-in placeholder.
pub struct PlaylistSynchronizer {
    api: Arc<dyn PlayerApi>,
    store: PersistentStore,
    cache: AssetCache,
}

impl PlaylistSynchronizer {
    pub fn new(api: Arc<dyn PlayerApi>, store: PersistentStore, cache: AssetCache) -> Self {
        Self { api, store, cache }
    }

    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    /// Last persisted playlist, ignoring empty ones
    pub async fn cached(&self) -> Option<Playlist> {
        self.store
            .get::<Playlist>(keys::PLAYLIST)
            .await
            .filter(|p| !p.items.is_empty())
    }

    /// Fetch, resolve, localize and persist the screen's playlist.
    ///
    /// Never fails: every error degrades to the next source in priority order.
    pub async fn synchronize(&self, identity: &DeviceIdentity) -> SyncResult {
        let cached = self.cached().await;
        let known_hash = cached.as_ref().and_then(|p| p.config_hash.clone());

        let (resolved, outcome) = match self
            .api
            .fetch_playlist(&identity.token, known_hash.as_deref())
            .await
        {
            Ok(PlaylistFetch::Updated(remote)) if remote.items.is_empty() => {
                warn!(
                    config_hash = ?remote.config_hash,
                    "Server playlist has no creatives, showing placeholder"
                );
                self.persist(&remote).await;
                (None, SyncOutcome::Fallback)
            }
            Ok(PlaylistFetch::Updated(mut remote)) => {
                if let Some(previous) = &cached {
                    carry_over_local_paths(&mut remote, previous);
                }
                (Some(remote), SyncOutcome::Remote)
            }
            Ok(PlaylistFetch::Unchanged) => match cached {
                Some(playlist) => (Some(playlist), SyncOutcome::Unchanged),
                None => {
                    warn!("Server reported playlist unchanged but no local copy exists");
                    (None, SyncOutcome::Fallback)
                }
            },
            Err(e) => {
                warn!(error = %e, "Playlist fetch failed");
                match cached {
                    Some(playlist) => (Some(playlist), SyncOutcome::Cached),
                    None => (None, SyncOutcome::Fallback),
                }
            }
        };

        let Some(mut playlist) = resolved else {
            info!(outcome = %SyncOutcome::Fallback, "Playlist resolved to placeholder");
            return SyncResult {
                playlist: Playlist::fallback(),
                outcome: SyncOutcome::Fallback,
                assets: RepairReport {
                    skipped: 1,
                    ..RepairReport::default()
                },
            };
        };

        playlist.resolve_media_types();
        let assets = self.cache.localize(&mut playlist).await;
        self.persist(&playlist).await;

        if outcome == SyncOutcome::Remote {
            if let Err(e) = self.cache.prune(&playlist).await {
                warn!(error = %e, "Asset pruning failed");
            }
        }

        info!(
            outcome = %outcome,
            config_hash = ?playlist.config_hash,
            items = playlist.items.len(),
            cached_assets = assets.healthy + assets.repaired,
            missing_assets = assets.failed,
            "Playlist resolved"
        );

        SyncResult {
            playlist,
            outcome,
            assets,
        }
    }

    /// Repair invalid assets of the persisted playlist and save the result.
    ///
    /// Returns `None` when there is no persisted playlist.
    pub async fn repair_cached(&self) -> Option<(Playlist, RepairReport)> {
        let mut playlist = self.cached().await?;
        let report = self.cache.repair(&mut playlist).await;
        if report.repaired > 0 {
            self.persist(&playlist).await;
        }
        Some((playlist, report))
    }

    async fn persist(&self, playlist: &Playlist) {
        if let Err(e) = self.store.set(keys::PLAYLIST, playlist).await {
            warn!(error = %e, "Failed to persist playlist");
        }
    }
}

/// Keep local paths known for creatives that survive into a new revision.
fn carry_over_local_paths(remote: &mut Playlist, previous: &Playlist) {
    let known: HashMap<&str, &std::path::Path> = previous
        .items
        .iter()
        .filter_map(|c| Some((c.creative_id.as_str(), c.local_path.as_deref()?)))
        .collect();

    for creative in &mut remote.items {
        if creative.local_path.is_none() {
            if let Some(path) = known.get(creative.creative_id.as_str()) {
                creative.local_path = Some(path.to_path_buf());
            }
        }
    }
}

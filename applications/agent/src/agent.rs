//! Component wiring and the long-running agent loop

use crate::config::{AgentConfig, StorageKind};
use crate::error::{AgentError, Result};
use marquee_client::PlayerApiClient;
use marquee_core::{DeviceIdentity, Playlist};
use marquee_playback::{PlaybackScheduler, Renderer, SchedulerConfig, SystemClock};
use marquee_storage::PersistentStore;
use marquee_sync::{AssetCache, DeviceRegistrar, PlaylistSynchronizer, Provisioning, SyncOutcome};
use marquee_telemetry::{
    DeviceMetricsProvider, FlushReport, HeartbeatBuilder, LocationProvider, LocationSource,
    NoLocationSource, PendingCounts, StaticLocationSource, TelemetryQueue,
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Everything the agent needs, built once from configuration
pub struct Agent {
    config: AgentConfig,
    store: PersistentStore,
    api: Arc<PlayerApiClient>,
    registrar: DeviceRegistrar,
    synchronizer: Arc<PlaylistSynchronizer>,
    queue: Arc<TelemetryQueue>,
    location: Arc<LocationProvider>,
    metrics: Arc<DeviceMetricsProvider>,
}

impl Agent {
    pub fn new(config: AgentConfig) -> Result<Self> {
        let store = match config.storage {
            StorageKind::File => PersistentStore::file(config.state_dir()),
            StorageKind::Memory => PersistentStore::memory(),
        };

        let api = Arc::new(PlayerApiClient::new(config.client_config())?);
        let registrar = DeviceRegistrar::new(api.clone(), store.clone());
        let cache = AssetCache::new(api.clone(), config.media_dir(), store.is_durable());
        let synchronizer = Arc::new(PlaylistSynchronizer::new(api.clone(), store.clone(), cache));
        let queue = Arc::new(TelemetryQueue::new(store.clone()));

        let source: Arc<dyn LocationSource> = match config.location {
            Some(location) => Arc::new(StaticLocationSource(location)),
            None => Arc::new(NoLocationSource),
        };
        let location = Arc::new(LocationProvider::new(source));
        let metrics = Arc::new(DeviceMetricsProvider::new());

        Ok(Self {
            config,
            store,
            api,
            registrar,
            synchronizer,
            queue,
            location,
            metrics,
        })
    }

    fn provisioning(&self) -> Provisioning {
        Provisioning {
            serial_number: self.config.serial_number.clone(),
            screen_id: self.config.screen_id.clone(),
            provisioning_code: self.config.provisioning_code.clone(),
            software_version: self.config.software_version.clone(),
        }
    }

    /// Ensure an identity exists. With `force` the device registers again and
    /// the new identity replaces the persisted one only once the server accepts it.
    pub async fn register(&self, force: bool) -> Result<DeviceIdentity> {
        let provisioning = self.provisioning();
        let identity = if force {
            self.registrar.reregister(&provisioning).await?
        } else {
            self.registrar.ensure_registered(&provisioning).await?
        };
        Ok(identity)
    }

    /// Summary of persisted state. Never touches the network.
    pub async fn status(&self) -> StatusReport {
        StatusReport {
            durable: self.store.is_durable(),
            identity: self.registrar.current().await,
            playlist: self.synchronizer.cached().await.map(PlaylistSummary::from),
            pending: self.queue.pending_counts().await,
        }
    }

    /// Deliver everything queued once
    pub async fn flush(&self) -> Result<FlushReport> {
        let identity = self
            .registrar
            .current()
            .await
            .ok_or(AgentError::NotRegistered)?;

        let report = self
            .queue
            .flush_all(self.api.as_ref(), &identity.token)
            .await?;
        self.metrics.record_flush(&report);
        Ok(report)
    }

    /// Register, sync, then play until Ctrl-C.
    ///
    /// Only a registration failure is fatal; everything after it degrades.
    pub async fn run(self, renderer: Arc<dyn Renderer>) -> Result<()> {
        let identity = self.register(false).await.map_err(|e| {
            error!(error = %e, "Registration failed");
            e
        })?;

        info!(
            player_id = %identity.player_id,
            screen_id = %identity.screen_id,
            durable = self.store.is_durable(),
            "Agent starting"
        );

        self.location.sample_now().await;

        let initial = self.synchronizer.synchronize(&identity).await;
        let (playlist_tx, playlist_rx) = watch::channel(initial.playlist);

        let tasks = vec![
            self.spawn_heartbeats(&identity),
            self.location
                .clone()
                .spawn_sampler(self.config.location_interval()),
            self.spawn_playlist_sync(&identity, playlist_tx),
        ];

        let mut scheduler = PlaybackScheduler::new(
            renderer,
            Arc::new(SystemClock),
            self.queue.clone(),
            self.location.clone(),
            playlist_rx,
            SchedulerConfig::new(identity.screen_id.clone(), self.store.is_durable()),
        );
        let playback = tokio::spawn(async move { scheduler.run().await });

        let outcome = tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                match signal {
                    Ok(()) => {
                        info!("Shutdown requested");
                        Ok(())
                    }
                    Err(e) => Err(AgentError::Io(e)),
                }
            }
            joined = playback => {
                error!(error = ?joined.err(), "Playback loop exited");
                Ok(())
            }
        };

        for task in tasks {
            task.abort();
        }
        outcome
    }

    fn spawn_heartbeats(&self, identity: &DeviceIdentity) -> JoinHandle<()> {
        let builder = HeartbeatBuilder::new(
            identity.clone(),
            self.location.clone(),
            self.metrics.clone(),
        );
        let api = self.api.clone();
        let queue = self.queue.clone();
        let metrics = self.metrics.clone();
        let token = identity.token.clone();
        let every = self.config.heartbeat_interval();

        tokio::spawn(async move {
            let mut ticker = interval(every);
            loop {
                ticker.tick().await;

                let heartbeat = builder.build().await;
                if let Err(e) = queue.enqueue_heartbeat(heartbeat).await {
                    warn!(error = %e, "Failed to queue heartbeat");
                }

                match queue.flush_all(api.as_ref(), &token).await {
                    Ok(report) => metrics.record_flush(&report),
                    Err(e) => warn!(error = %e, "Telemetry flush failed"),
                }
            }
        })
    }

    /// One playlist sync tick: fetch and localize, repair what is still
    /// missing, then publish to the scheduler if anything changed.
    pub async fn sync_playlist(
        &self,
        identity: &DeviceIdentity,
        playlist_tx: &watch::Sender<Playlist>,
    ) -> SyncOutcome {
        refresh_playlist(&self.synchronizer, identity, playlist_tx).await
    }

    fn spawn_playlist_sync(
        &self,
        identity: &DeviceIdentity,
        playlist_tx: watch::Sender<Playlist>,
    ) -> JoinHandle<()> {
        let synchronizer = self.synchronizer.clone();
        let identity = identity.clone();
        let every = self.config.playlist_sync_interval();

        tokio::spawn(async move {
            let mut ticker = interval(every);
            // Startup already synced
            ticker.tick().await;
            loop {
                ticker.tick().await;
                refresh_playlist(&synchronizer, &identity, &playlist_tx).await;
            }
        })
    }
}

async fn refresh_playlist(
    synchronizer: &PlaylistSynchronizer,
    identity: &DeviceIdentity,
    playlist_tx: &watch::Sender<Playlist>,
) -> SyncOutcome {
    let result = synchronizer.synchronize(identity).await;
    let mut playlist = result.playlist;

    if result.outcome != SyncOutcome::Fallback {
        if let Some((repaired, report)) = synchronizer.repair_cached().await {
            if report.repaired > 0 {
                playlist = repaired;
            }
        }
    }

    playlist_tx.send_if_modified(|current| {
        if *current == playlist {
            return false;
        }
        *current = playlist;
        true
    });

    result.outcome
}

fn interval(every: Duration) -> tokio::time::Interval {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Cached playlist at a glance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistSummary {
    pub config_hash: Option<String>,
    pub items: usize,
    pub cached_items: usize,
    pub total_duration_secs: u64,
}

impl From<Playlist> for PlaylistSummary {
    fn from(playlist: Playlist) -> Self {
        Self {
            config_hash: playlist.config_hash.clone(),
            items: playlist.items.len(),
            cached_items: playlist
                .items
                .iter()
                .filter(|c| marquee_core::is_valid(c.local_path.as_deref()))
                .count(),
            total_duration_secs: playlist.total_duration(),
        }
    }
}

/// Output of the `status` command
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub durable: bool,
    pub identity: Option<DeviceIdentity>,
    pub playlist: Option<PlaylistSummary>,
    pub pending: PendingCounts,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.identity {
            Some(identity) => {
                writeln!(f, "Player:    {}", identity.player_id)?;
                writeln!(f, "Screen:    {}", identity.screen_id)?;
                writeln!(f, "Version:   {}", identity.software_version)?;
            }
            None => writeln!(f, "Player:    not registered")?,
        }

        writeln!(
            f,
            "Storage:   {}",
            if self.durable { "file" } else { "memory" }
        )?;

        match &self.playlist {
            Some(playlist) => writeln!(
                f,
                "Playlist:  {} items ({} cached), {}s per pass, hash {}",
                playlist.items,
                playlist.cached_items,
                playlist.total_duration_secs,
                playlist.config_hash.as_deref().unwrap_or("-")
            )?,
            None => writeln!(f, "Playlist:  none cached")?,
        }

        write!(
            f,
            "Pending:   {} playbacks, {} heartbeats",
            self.pending.playbacks, self.pending.heartbeats
        )
    }
}

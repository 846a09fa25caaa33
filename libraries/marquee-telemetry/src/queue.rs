use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_client::PlayerApi;
use marquee_core::{HeartbeatEvent, PlaybackEvent};
use marquee_storage::{keys, PersistentStore};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// The two independent telemetry queues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    Playback,
    Heartbeat,
}

impl QueueKind {
    fn key(self) -> &'static str {
        match self {
            QueueKind::Playback => keys::PENDING_PLAYBACKS,
            QueueKind::Heartbeat => keys::PENDING_HEARTBEATS,
        }
    }
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueKind::Playback => write!(f, "playback"),
            QueueKind::Heartbeat => write!(f, "heartbeat"),
        }
    }
}

/// A persisted queue entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Queued<T> {
    /// Identity of this entry, so a flush removes exactly what it delivered
    pub id: Uuid,
    pub enqueued_at: DateTime<Utc>,
    /// Failed delivery attempts so far
    #[serde(default)]
    pub attempts: u32,
    pub payload: T,
}

impl<T> Queued<T> {
    fn new(payload: T) -> Self {
        Self {
            id: Uuid::new_v4(),
            enqueued_at: Utc::now(),
            attempts: 0,
            payload,
        }
    }
}

/// Result of one flush pass over one queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

impl FlushReport {
    fn merge(self, other: FlushReport) -> FlushReport {
        FlushReport {
            attempted: self.attempted + other.attempted,
            delivered: self.delivered + other.delivered,
            failed: self.failed + other.failed,
        }
    }
}

/// Queue depths
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PendingCounts {
    pub playbacks: usize,
    pub heartbeats: usize,
}

/// Payloads that know which endpoint delivers them.
#[async_trait]
trait Deliverable: Serialize + DeserializeOwned + Send + Sync {
    const KIND: QueueKind;

    async fn deliver(&self, api: &dyn PlayerApi, token: &str) -> marquee_client::Result<()>;
}

#[async_trait]
impl Deliverable for PlaybackEvent {
    const KIND: QueueKind = QueueKind::Playback;

    async fn deliver(&self, api: &dyn PlayerApi, token: &str) -> marquee_client::Result<()> {
        api.send_playback(token, self).await
    }
}

#[async_trait]
impl Deliverable for HeartbeatEvent {
    const KIND: QueueKind = QueueKind::Heartbeat;

    async fn deliver(&self, api: &dyn PlayerApi, token: &str) -> marquee_client::Result<()> {
        api.send_heartbeat(token, self).await
    }
}

/// Two durable FIFO queues with at-least-once delivery.
///
/// Each queue has its own lock around read-modify-write of its document. The
/// lock is never held across network calls, so enqueueing from the playback
/// loop is never blocked by a slow flush.
pub struct TelemetryQueue {
    store: PersistentStore,
    playback_lock: Mutex<()>,
    heartbeat_lock: Mutex<()>,
}

impl TelemetryQueue {
    pub fn new(store: PersistentStore) -> Self {
        Self {
            store,
            playback_lock: Mutex::new(()),
            heartbeat_lock: Mutex::new(()),
        }
    }

    fn lock_for(&self, kind: QueueKind) -> &Mutex<()> {
        match kind {
            QueueKind::Playback => &self.playback_lock,
            QueueKind::Heartbeat => &self.heartbeat_lock,
        }
    }

    /// Append a playback event and persist it immediately
    pub async fn enqueue_playback(&self, event: PlaybackEvent) -> Result<()> {
        self.enqueue(event).await
    }

    /// Append a heartbeat and persist it immediately
    pub async fn enqueue_heartbeat(&self, event: HeartbeatEvent) -> Result<()> {
        self.enqueue(event).await
    }

    /// Attempt delivery of every queued playback event
    pub async fn flush_playbacks(&self, api: &dyn PlayerApi, token: &str) -> Result<FlushReport> {
        self.flush::<PlaybackEvent>(api, token).await
    }

    /// Attempt delivery of every queued heartbeat
    pub async fn flush_heartbeats(&self, api: &dyn PlayerApi, token: &str) -> Result<FlushReport> {
        self.flush::<HeartbeatEvent>(api, token).await
    }

    /// Flush both queues, heartbeats first so health reaches the server even
    /// behind a long playback backlog.
    ///
    /// A storage error on one queue never skips the other; the first error is
    /// returned after both have run.
    pub async fn flush_all(&self, api: &dyn PlayerApi, token: &str) -> Result<FlushReport> {
        let heartbeats = self.flush_heartbeats(api, token).await;
        let playbacks = self.flush_playbacks(api, token).await;

        match (heartbeats, playbacks) {
            (Ok(heartbeats), Ok(playbacks)) => Ok(heartbeats.merge(playbacks)),
            (Err(e), Ok(_)) | (Ok(_), Err(e)) => Err(e),
            (Err(e), Err(other)) => {
                warn!(queue = %QueueKind::Playback, error = %other, "Flush failed");
                Err(e)
            }
        }
    }

    /// Playback events currently queued, oldest first
    pub async fn pending_playbacks(&self) -> Vec<PlaybackEvent> {
        self.pending::<PlaybackEvent>().await
    }

    /// Heartbeats currently queued, oldest first
    pub async fn pending_heartbeats(&self) -> Vec<HeartbeatEvent> {
        self.pending::<HeartbeatEvent>().await
    }

    pub async fn pending_counts(&self) -> PendingCounts {
        PendingCounts {
            playbacks: self.entries::<PlaybackEvent>().await.len(),
            heartbeats: self.entries::<HeartbeatEvent>().await.len(),
        }
    }

    async fn entries<T: Deliverable>(&self) -> Vec<Queued<T>> {
        let _guard = self.lock_for(T::KIND).lock().await;
        self.store.get_list(T::KIND.key()).await
    }

    async fn pending<T: Deliverable>(&self) -> Vec<T> {
        self.entries::<T>()
            .await
            .into_iter()
            .map(|entry| entry.payload)
            .collect()
    }

    async fn enqueue<T: Deliverable>(&self, payload: T) -> Result<()> {
        let _guard = self.lock_for(T::KIND).lock().await;

        let mut entries: Vec<Queued<T>> = self.store.get_list(T::KIND.key()).await;
        entries.push(Queued::new(payload));
        self.store.set_list(T::KIND.key(), &entries).await?;

        debug!(queue = %T::KIND, depth = entries.len(), "Telemetry enqueued");
        Ok(())
    }

    async fn flush<T: Deliverable>(&self, api: &dyn PlayerApi, token: &str) -> Result<FlushReport> {
        let snapshot = self.entries::<T>().await;
        if snapshot.is_empty() {
            return Ok(FlushReport::default());
        }

        let mut report = FlushReport {
            attempted: snapshot.len(),
            ..FlushReport::default()
        };
        let mut delivered: HashSet<Uuid> = HashSet::new();
        let mut failed: HashSet<Uuid> = HashSet::new();

        for entry in &snapshot {
            match entry.payload.deliver(api, token).await {
                Ok(()) => {
                    delivered.insert(entry.id);
                    report.delivered += 1;
                }
                Err(e) => {
                    debug!(queue = %T::KIND, id = %entry.id, error = %e, "Delivery failed, keeping entry");
                    failed.insert(entry.id);
                    report.failed += 1;
                }
            }
        }

        // Entries enqueued while we were delivering are kept behind the failures.
        let _guard = self.lock_for(T::KIND).lock().await;
        let mut current: Vec<Queued<T>> = self.store.get_list(T::KIND.key()).await;
        current.retain(|entry| !delivered.contains(&entry.id));
        for entry in &mut current {
            if failed.contains(&entry.id) {
                entry.attempts = entry.attempts.saturating_add(1);
            }
        }
        self.store.set_list(T::KIND.key(), &current).await?;

        if report.failed > 0 {
            warn!(
                queue = %T::KIND,
                delivered = report.delivered,
                failed = report.failed,
                remaining = current.len(),
                "Telemetry flush incomplete"
            );
        } else {
            info!(queue = %T::KIND, delivered = report.delivered, "Telemetry flushed");
        }

        Ok(report)
    }
}

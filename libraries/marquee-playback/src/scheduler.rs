//! Playlist scheduler - the display loop as an explicit state machine
//!
//! Each pass walks a snapshot of the current playlist in order. Updates
//! published on the watch channel take effect at the next pass boundary.

use crate::clock::Clock;
use crate::error::Result;
use crate::renderer::Renderer;
use chrono::{DateTime, Utc};
use marquee_core::{is_valid, CreativeRef, PlaybackEvent, PlaybackStatus, Playlist};
use marquee_telemetry::{LocationProvider, TelemetryQueue};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Pause after a pass that displayed nothing
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(10);

/// Where the scheduler is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Choosing the next creative, starting a new pass when needed
    Advancing,
    /// About to display the creative under the cursor
    Rendering,
    /// Creative on screen until `until`
    Suspended { until: DateTime<Utc> },
    /// Backing off after a pass with no successful renders
    Cooldown { until: DateTime<Utc> },
}

/// Scheduler settings
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Screen reported in playback events
    pub screen_id: String,
    /// Whether assets must be cached locally before display
    pub caching_enabled: bool,
    pub cooldown: Duration,
}

impl SchedulerConfig {
    pub fn new(screen_id: impl Into<String>, caching_enabled: bool) -> Self {
        Self {
            screen_id: screen_id.into(),
            caching_enabled,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

/// Drives the display loop.
pub struct PlaybackScheduler {
    renderer: Arc<dyn Renderer>,
    clock: Arc<dyn Clock>,
    queue: Arc<TelemetryQueue>,
    location: Arc<LocationProvider>,
    playlist: watch::Receiver<Playlist>,
    config: SchedulerConfig,

    state: SchedulerState,
    pass: Vec<CreativeRef>,
    cursor: usize,
    in_pass: bool,
    rendered_in_pass: usize,
    passes_completed: u64,
}

impl PlaybackScheduler {
    pub fn new(
        renderer: Arc<dyn Renderer>,
        clock: Arc<dyn Clock>,
        queue: Arc<TelemetryQueue>,
        location: Arc<LocationProvider>,
        playlist: watch::Receiver<Playlist>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            renderer,
            clock,
            queue,
            location,
            playlist,
            config,
            state: SchedulerState::Advancing,
            pass: Vec::new(),
            cursor: 0,
            in_pass: false,
            rendered_in_pass: 0,
            passes_completed: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Full passes over the playlist finished so far
    pub fn passes_completed(&self) -> u64 {
        self.passes_completed
    }

    /// Perform exactly one state transition and return the new state.
    pub async fn step(&mut self) -> SchedulerState {
        self.state = match self.state {
            SchedulerState::Advancing => self.advance(),
            SchedulerState::Rendering => self.render_current().await,
            SchedulerState::Suspended { until } | SchedulerState::Cooldown { until } => {
                self.sleep_until(until).await;
                SchedulerState::Advancing
            }
        };
        self.state
    }

    /// Run forever
    pub async fn run(&mut self) {
        info!(screen_id = %self.config.screen_id, "Playback scheduler started");
        loop {
            self.step().await;
        }
    }

    /// Run until `passes` more full passes have completed
    pub async fn run_passes(&mut self, passes: u64) {
        let target = self.passes_completed + passes;
        while self.passes_completed < target {
            self.step().await;
        }
    }

    fn advance(&mut self) -> SchedulerState {
        if self.cursor >= self.pass.len() {
            if self.in_pass {
                self.in_pass = false;
                self.passes_completed += 1;

                if self.rendered_in_pass == 0 {
                    let until = self.deadline(self.config.cooldown);
                    warn!(
                        cooldown_secs = self.config.cooldown.as_secs(),
                        "Nothing displayed this pass, cooling down"
                    );
                    return SchedulerState::Cooldown { until };
                }
            }
            self.begin_pass();
        }
        SchedulerState::Rendering
    }

    fn begin_pass(&mut self) {
        let playlist = self.playlist.borrow_and_update().clone();
        self.pass = if playlist.items.is_empty() {
            Playlist::fallback().items
        } else {
            playlist.items
        };
        self.cursor = 0;
        self.rendered_in_pass = 0;
        self.in_pass = true;
        debug!(items = self.pass.len(), "Starting playlist pass");
    }

    async fn render_current(&mut self) -> SchedulerState {
        let Some(creative) = self.pass.get(self.cursor).cloned() else {
            return SchedulerState::Advancing;
        };
        self.cursor += 1;

        let played_at = self.clock.now();

        if self.requires_local_copy(&creative) && !is_valid(creative.local_path.as_deref()) {
            debug!(creative_id = %creative.creative_id, "Asset not cached, skipping");
            self.record(&creative, played_at, 0, PlaybackStatus::Skipped)
                .await;
            return SchedulerState::Advancing;
        }

        match self.renderer.render(&creative).await {
            Ok(()) => {
                self.rendered_in_pass += 1;
                self.record(
                    &creative,
                    played_at,
                    creative.duration,
                    PlaybackStatus::Success,
                )
                .await;
                SchedulerState::Suspended {
                    until: self.deadline(Duration::from_secs(creative.duration)),
                }
            }
            Err(e) => {
                warn!(creative_id = %creative.creative_id, error = %e, "Render failed");
                self.record(&creative, played_at, 0, PlaybackStatus::Error)
                    .await;
                SchedulerState::Advancing
            }
        }
    }

    fn requires_local_copy(&self, creative: &CreativeRef) -> bool {
        self.config.caching_enabled && !creative.is_placeholder()
    }

    fn deadline(&self, duration: Duration) -> DateTime<Utc> {
        let now = self.clock.now();
        chrono::Duration::from_std(duration)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(now)
    }

    async fn sleep_until(&self, until: DateTime<Utc>) {
        let remaining = (until - self.clock.now()).to_std().unwrap_or(Duration::ZERO);
        if !remaining.is_zero() {
            self.clock.sleep(remaining).await;
        }
    }

    async fn record(
        &self,
        creative: &CreativeRef,
        played_at: DateTime<Utc>,
        duration: u64,
        status: PlaybackStatus,
    ) {
        let event = PlaybackEvent {
            creative_id: creative.creative_id.clone(),
            screen_id: self.config.screen_id.clone(),
            played_at,
            duration,
            status,
            location: self.location.last_known(),
        };

        if let Err(e) = self.enqueue(event).await {
            warn!(creative_id = %creative.creative_id, error = %e, "Failed to queue playback event");
        }
    }

    async fn enqueue(&self, event: PlaybackEvent) -> Result<()> {
        debug!(creative_id = %event.creative_id, status = %event.status, "Playback recorded");
        self.queue.enqueue_playback(event).await?;
        Ok(())
    }
}

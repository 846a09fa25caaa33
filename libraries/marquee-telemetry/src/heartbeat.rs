use crate::location::LocationProvider;
use crate::metrics::DeviceMetricsProvider;
use chrono::Utc;
use marquee_core::{DeviceIdentity, HeartbeatEvent};
use std::sync::Arc;

/// Status string reported by a running agent
pub const HEARTBEAT_STATUS_ONLINE: &str = "online";

/// Assembles heartbeats from the identity and current sensor readings
pub struct HeartbeatBuilder {
    identity: DeviceIdentity,
    location: Arc<LocationProvider>,
    metrics: Arc<DeviceMetricsProvider>,
}

impl HeartbeatBuilder {
    pub fn new(
        identity: DeviceIdentity,
        location: Arc<LocationProvider>,
        metrics: Arc<DeviceMetricsProvider>,
    ) -> Self {
        Self {
            identity,
            location,
            metrics,
        }
    }

    pub async fn build(&self) -> HeartbeatEvent {
        HeartbeatEvent {
            player_id: self.identity.player_id.clone(),
            screen_id: self.identity.screen_id.clone(),
            timestamp: Utc::now(),
            status: HEARTBEAT_STATUS_ONLINE.to_string(),
            software_version: self.identity.software_version.clone(),
            location: self.location.last_known(),
            metrics: Some(self.metrics.snapshot().await),
        }
    }
}

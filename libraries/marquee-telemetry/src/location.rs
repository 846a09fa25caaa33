use crate::error::SensorError;
use async_trait::async_trait;
use marquee_core::Location;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Something that can report where the device is
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn sample(&self) -> Result<Location, SensorError>;
}

/// Fixed position, typically from configuration for wall-mounted screens
#[derive(Debug, Clone, Copy)]
pub struct StaticLocationSource(pub Location);

#[async_trait]
impl LocationSource for StaticLocationSource {
    async fn sample(&self) -> Result<Location, SensorError> {
        Ok(self.0)
    }
}

/// Devices without any positioning
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocationSource;

#[async_trait]
impl LocationSource for NoLocationSource {
    async fn sample(&self) -> Result<Location, SensorError> {
        Err(SensorError::Unavailable("no location source configured".into()))
    }
}

/// Owns the last known position of the device.
///
/// Sampling failures keep the previous value; readers never wait on a sample.
pub struct LocationProvider {
    source: Arc<dyn LocationSource>,
    last: RwLock<Option<Location>>,
}

impl LocationProvider {
    pub fn new(source: Arc<dyn LocationSource>) -> Self {
        Self {
            source,
            last: RwLock::new(None),
        }
    }

    /// Last successfully sampled position
    pub fn last_known(&self) -> Option<Location> {
        *self.last.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take a sample now and return the (possibly unchanged) last known position
    pub async fn sample_now(&self) -> Option<Location> {
        match self.source.sample().await {
            Ok(location) => {
                debug!(
                    latitude = location.latitude,
                    longitude = location.longitude,
                    "Location sampled"
                );
                *self.last.write().unwrap_or_else(PoisonError::into_inner) = Some(location);
                Some(location)
            }
            Err(e) => {
                debug!(error = %e, "Location sample failed, keeping previous value");
                self.last_known()
            }
        }
    }

    /// Resample on a fixed interval until the task is dropped.
    pub fn spawn_sampler(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            if every.is_zero() {
                warn!("Location interval is zero, sampler disabled");
                return;
            }

            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.sample_now().await;
            }
        })
    }
}

//! Marquee Telemetry
//!
//! Playback and health reporting that survives unreliable connectivity.
//!
//! - [`TelemetryQueue`]: two durable FIFO queues with at-least-once delivery
//! - [`LocationProvider`]: periodic position sampling with a pull accessor
//! - [`DeviceMetricsProvider`]: CPU, memory and connectivity snapshots
//! - [`HeartbeatBuilder`]: assembles heartbeats from the above
//!
//! # Delivery guarantees
//!
//! Every event is persisted before any network attempt and removed only after
//! the server acknowledged it. Ordering is strict within one flush pass; an
//! item that fails and is retried later can arrive after items queued behind it.

mod error;
mod heartbeat;
mod location;
mod metrics;
mod queue;

pub use error::{Result, SensorError, TelemetryError};
pub use heartbeat::{HeartbeatBuilder, HEARTBEAT_STATUS_ONLINE};
pub use location::{LocationProvider, LocationSource, NoLocationSource, StaticLocationSource};
pub use metrics::{CpuTimes, DeviceMetricsProvider};
pub use queue::{FlushReport, PendingCounts, QueueKind, Queued, TelemetryQueue};

mod events;
mod identity;
mod playlist;

pub use events::{DeviceMetrics, HeartbeatEvent, Location, PlaybackEvent, PlaybackStatus};
pub use identity::DeviceIdentity;
pub use playlist::{
    CreativeRef, MediaType, Playlist, FALLBACK_CREATIVE_ID, FALLBACK_DURATION_SECS,
};

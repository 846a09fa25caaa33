//! Marquee Playback
//!
//! Walks the active playlist forever, one creative at a time, recording a
//! playback event for every display attempt.
//!
//! The scheduler is platform-agnostic: the display surface and the passage of
//! time are injected through [`Renderer`] and [`Clock`].
//!
//! ```text
//! Advancing ──► Rendering ──► Suspended { until } ──► Advancing
//!     │             │
//!     │             └── skipped / error ──► Advancing
//!     └── pass rendered nothing ──► Cooldown { until } ──► Advancing
//! ```

mod clock;
mod error;
mod renderer;
mod scheduler;

pub use clock::{Clock, SystemClock};
pub use error::{PlaybackError, RenderError, Result};
pub use renderer::{LogRenderer, Renderer};
pub use scheduler::{PlaybackScheduler, SchedulerConfig, SchedulerState, DEFAULT_COOLDOWN};

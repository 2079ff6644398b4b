//! TGL Simulator Playback
//!
//! Drives the flooding and TGL networks side by side for a renderer.
//!
//! # Architecture
//!
//! - **Scheduler**: ticks transfers every frame and advances a protocol once
//!   its round delay has passed and its transfers have landed
//! - **Events**: a serde-tagged timeline of rounds, stages and completions
//! - **Snapshots**: published on a `tokio::sync::watch` channel after every change
//!
//! # Usage
//!
//! ```ignore
//! let mut scheduler = Scheduler::new(Settings::default())?;
//! let mut snapshots = scheduler.subscribe();
//! scheduler.set_speed(PlaybackSpeed::Double);
//! scheduler.run_realtime(Duration::from_millis(16)).await?;
//! ```

mod events;
mod scheduler;

pub use events::{PlaybackStatus, SimEvent, SimSnapshot};
pub use scheduler::{ParseSpeedError, PlaybackSpeed, PlaybackState, Scheduler, MIN_FRAME_MS};

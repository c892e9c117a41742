//! Autopilot: fills every topic up to a target image count.
//!
//! Topics are processed one at a time in priority order. Each round asks
//! the dispatcher for up to `parallelism` images, persists whatever comes
//! back, and sleeps before the next round. Quota exhaustion halts the run
//! with progress intact; a stop request is honoured at the next round
//! boundary.

mod config;
mod scheduler;
mod tracker;
mod types;

pub use config::AutopilotConfig;
pub use scheduler::AutopilotScheduler;
pub use tracker::TopicProgressTracker;
pub use types::*;

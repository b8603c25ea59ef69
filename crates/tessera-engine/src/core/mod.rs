//! Session and frame loop.
//!
//! `Session` holds every resource a frame needs; `FrameScheduler` drives it
//! once per host refresh. Neither depends on a window, so both run under
//! test with a headless device and a fixed-step host.

mod scheduler;
mod session;
mod stop;

pub use scheduler::{CycleOutcome, FrameScene, FrameScheduler, SchedulerState};
pub use session::{Session, SetupError};
pub use stop::StopToken;

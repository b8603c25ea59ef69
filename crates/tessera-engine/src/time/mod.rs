//! Time subsystem.
//!
//! Frame timestamps, the scheduling-host seam, and FPS accounting. None of it
//! touches the GPU, so all of it runs under test with simulated time.

mod fps;
mod frame_clock;
mod host;

pub use fps::{FpsCounter, FPS_SAMPLE_WINDOW_MS};
pub use frame_clock::{FrameClock, FrameTime};
pub use host::{FixedStepHost, SchedulingHost};

//! Time subsystem.
//!
//! Frame timing and wait pacing, without coupling to the runtime:
//! - one `FrameClock` per loop; `tick()` once per loop iteration
//! - `WaitEstimator` corrects sleeps for the platform's overshoot

mod frame_clock;
mod pacing;

pub use frame_clock::{FrameClock, FrameTime, RealTime, SimTime};
pub use pacing::{BACKGROUND_FRAME_RATE, SimTimeStep, WaitEstimator};

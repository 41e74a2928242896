//! Frame timing.
//!
//! One `FrameClock` per loop; call `tick()` once per iteration to obtain the
//! `FrameTime` passed to update and physics hooks.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};

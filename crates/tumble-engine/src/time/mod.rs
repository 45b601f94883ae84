//! Time subsystem.
//!
//! The host side of the frame-scheduler contract: one `FrameClock` per render loop,
//! `tick()` once per presented frame, yielding a monotonically increasing timestamp
//! in milliseconds since the clock started.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};

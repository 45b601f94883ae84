//! Core engine-facing contracts.
//!
//! The stable interface between the runtime (platform loop) and applications:
//! a one-time start hook with GPU access and a per-frame context.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, StartCtx, WindowCtx};

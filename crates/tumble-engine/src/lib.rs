//! Tumble engine crate.
//!
//! Platform + GPU runtime pieces used by the demo layer: a single-window
//! `winit` loop, a `wgpu` device, and an immediate-mode raster context
//! with GL-shaped compile/link/bind/draw calls over WGSL shaders.

pub mod core;
pub mod device;
pub mod gfx;
pub mod logging;
pub mod time;
pub mod window;

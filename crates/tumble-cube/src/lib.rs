//! Tumble cube.
//!
//! A single colored cube spun by an immediate-mode frame loop. Everything here
//! is generic over [`tumble_engine::gfx::RasterContext`]; `app` binds it to the
//! wgpu backend and the window runtime.

pub mod app;
pub mod config;
pub mod frame;
pub mod geometry;
pub mod math;
pub mod resources;
pub mod schedule;
pub mod shader;
pub mod transform;

#[cfg(test)]
mod testing;

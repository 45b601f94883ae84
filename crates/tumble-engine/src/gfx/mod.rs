//! Immediate-mode raster contract and its wgpu backend.
//!
//! Callers drive a GL-shaped command stream (compile, link, bind, draw) through
//! [`RasterContext`]. Shaders are WGSL; compilation and link checks run through
//! `naga` reflection so every backend reports the same diagnostics.

mod context;
pub mod reflect;
mod wgpu_raster;

pub use context::{
    AttributeLayout, BufferTarget, DepthFunc, IndexType, PrimitiveMode, RasterContext, StageKind,
};
pub use wgpu_raster::{FrameTarget, WgpuRaster};

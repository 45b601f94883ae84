use winit::window::Window;

use crate::device::{Gpu, GpuFrame, SurfaceErrorAction};
use crate::gfx::WgpuRaster;
use crate::time::FrameTime;

use super::app::AppControl;

/// Window handle plus the size query the app reads at startup.
pub struct WindowCtx<'a> {
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// Drawable size in logical pixels, as `(width, height)`.
    pub fn client_size(&self) -> (f32, f32) {
        let logical: winit::dpi::LogicalSize<f64> =
            self.window.inner_size().to_logical(self.window.scale_factor());
        (logical.width as f32, logical.height as f32)
    }
}

/// Context for `App::on_start`: resources created here live for the whole run.
pub struct StartCtx<'a> {
    pub window: WindowCtx<'a>,
    pub raster: &'a mut WgpuRaster,
}

/// Per-frame context passed to `App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub raster: &'a mut WgpuRaster,
    pub time: FrameTime,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Acquires a frame, lets `draw` record into the raster, then presents.
    ///
    /// Surface loss is handled here; `draw` is skipped for frames that cannot be
    /// acquired. Only a fatal surface error ends the loop.
    pub fn render<F>(&mut self, draw: F) -> AppControl
    where
        F: FnOnce(&mut WgpuRaster, FrameTime),
    {
        let frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => {
                        log::error!("fatal surface error; stopping");
                        AppControl::Exit
                    }
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                        AppControl::Continue
                    }
                };
            }
        };

        let GpuFrame {
            surface_texture,
            target,
        } = frame;

        self.raster.begin_frame(target);
        draw(&mut *self.raster, self.time);

        if let Some(target) = self.raster.finish_frame() {
            self.window.window.pre_present_notify();
            self.gpu.present(surface_texture, target);
        }

        AppControl::Continue
    }
}

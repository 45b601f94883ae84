//! Host glue: runs the frame loop inside the engine's window runtime.

use anyhow::Context;
use tumble_engine::core::{App, AppControl, FrameCtx, StartCtx};
use tumble_engine::gfx::WgpuRaster;

use crate::config::CubeConfig;
use crate::frame::FrameLoop;
use crate::schedule::{CancelFlag, Schedule};

pub struct CubeApp {
    config: CubeConfig,
    cancel: CancelFlag,
    frame_loop: Option<FrameLoop<WgpuRaster>>,
}

impl CubeApp {
    pub fn new(config: CubeConfig) -> Self {
        Self {
            config,
            cancel: CancelFlag::new(),
            frame_loop: None,
        }
    }
}

impl App for CubeApp {
    fn on_start(&mut self, ctx: &mut StartCtx<'_>) -> anyhow::Result<()> {
        let (width, height) = ctx.window.client_size();
        let aspect = width / height;

        let frame_loop = FrameLoop::new(ctx.raster, aspect, &self.config)
            .context("failed to build the cube pipeline")?;

        log::info!(
            "cube ready: {width}x{height} (aspect {aspect:.3}), frame limit {:?}",
            self.config.max_frames
        );

        self.frame_loop = Some(frame_loop);
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(frame_loop) = self.frame_loop.as_mut() else {
            return AppControl::Exit;
        };
        if self.config.frame_limit_reached(frame_loop.frames_rendered()) {
            self.cancel.cancel();
        }
        if self.cancel.is_cancelled() {
            return AppControl::Exit;
        }

        let cancel = &self.cancel;
        let mut schedule = Schedule::Continue;
        let control = ctx.render(|raster, time| {
            schedule = frame_loop.tick(raster, time.timestamp_ms, cancel);
        });

        if self.config.frame_limit_reached(frame_loop.frames_rendered()) {
            log::info!("rendered {} frames; stopping", frame_loop.frames_rendered());
            self.cancel.cancel();
            schedule = Schedule::Stop;
        }

        match (control, schedule) {
            (AppControl::Continue, Schedule::Continue) => AppControl::Continue,
            _ => AppControl::Exit,
        }
    }
}

//! Host frame scheduling: cancellation and the run-until-cancelled loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tumble_engine::gfx::RasterContext;

use crate::frame::FrameLoop;

/// Shared stop signal. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Whether the frame callback wants another frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Schedule {
    Continue,
    Stop,
}

/// Source of frame timestamps, one per display refresh.
pub trait FrameScheduler {
    /// Blocks until the next frame and returns its timestamp in milliseconds.
    /// `None` means the host will produce no more frames.
    fn next_frame(&mut self) -> Option<f64>;
}

/// Drives `frame_loop` until `cancel` is set or the scheduler runs dry.
///
/// Returns the number of frames rendered.
pub fn run_until_cancelled<C, S>(
    frame_loop: &mut FrameLoop<C>,
    ctx: &mut C,
    scheduler: &mut S,
    cancel: &CancelFlag,
) -> u64
where
    C: RasterContext,
    S: FrameScheduler + ?Sized,
{
    let start = frame_loop.frames_rendered();

    while !cancel.is_cancelled() {
        let Some(timestamp_ms) = scheduler.next_frame() else {
            log::debug!("frame scheduler exhausted");
            break;
        };

        if frame_loop.tick(ctx, timestamp_ms, cancel) == Schedule::Stop {
            break;
        }
    }

    frame_loop.frames_rendered() - start
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CubeConfig;
    use crate::testing::RecordingRaster;
    use std::collections::VecDeque;

    /// Replays fixed timestamps, optionally cancelling once a given count is reached.
    struct Scripted {
        timestamps: VecDeque<f64>,
        cancel_after: Option<(usize, CancelFlag)>,
        served: usize,
    }

    impl Scripted {
        fn new(timestamps: impl IntoIterator<Item = f64>) -> Self {
            Self {
                timestamps: timestamps.into_iter().collect(),
                cancel_after: None,
                served: 0,
            }
        }
    }

    impl FrameScheduler for Scripted {
        fn next_frame(&mut self) -> Option<f64> {
            if let Some((limit, flag)) = &self.cancel_after {
                if self.served == *limit {
                    flag.cancel();
                }
            }
            self.served += 1;
            self.timestamps.pop_front()
        }
    }

    fn cube_loop(ctx: &mut RecordingRaster) -> FrameLoop<RecordingRaster> {
        FrameLoop::new(ctx, 1.0, &CubeConfig::default()).expect("cube loop builds")
    }

    #[test]
    fn clones_share_the_flag() {
        let a = CancelFlag::new();
        let b = a.clone();
        assert!(!b.is_cancelled());
        a.cancel();
        assert!(b.is_cancelled());
    }

    #[test]
    fn runs_until_scheduler_is_exhausted() {
        let mut ctx = RecordingRaster::new();
        let mut frame_loop = cube_loop(&mut ctx);
        let mut scheduler = Scripted::new([0.0, 500.0, 1_000.0, 1_500.0]);

        let rendered = run_until_cancelled(&mut frame_loop, &mut ctx, &mut scheduler, &CancelFlag::new());

        assert_eq!(rendered, 4);
        assert_eq!(ctx.draw_count(), 4);
        assert!((frame_loop.transform().rotation_angle() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn cancellation_bounds_the_run() {
        let mut ctx = RecordingRaster::new();
        let mut frame_loop = cube_loop(&mut ctx);
        let cancel = CancelFlag::new();
        let mut scheduler = Scripted::new((0..100).map(|i| f64::from(i) * 16.0));
        scheduler.cancel_after = Some((3, cancel.clone()));

        let rendered = run_until_cancelled(&mut frame_loop, &mut ctx, &mut scheduler, &cancel);

        assert_eq!(rendered, 3);
        assert_eq!(ctx.draw_count(), 3);
    }

    #[test]
    fn pre_cancelled_flag_renders_nothing() {
        let mut ctx = RecordingRaster::new();
        let mut frame_loop = cube_loop(&mut ctx);
        let cancel = CancelFlag::new();
        cancel.cancel();
        let mut scheduler = Scripted::new([0.0, 16.0]);

        let rendered = run_until_cancelled(&mut frame_loop, &mut ctx, &mut scheduler, &cancel);

        assert_eq!(rendered, 0);
        assert_eq!(scheduler.served, 0);
    }
}

use anyhow::Result;
use tumble_cube::app::CubeApp;
use tumble_cube::config::{self, CubeConfig};
use tumble_engine::device::GpuInit;
use tumble_engine::logging::{LoggingConfig, init_logging};
use tumble_engine::window::{Runtime, RuntimeConfig};

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let arg = std::env::args().nth(1);
    let max_frames = config::parse_frame_limit(arg.as_deref())?;

    let cube = CubeConfig {
        max_frames,
        ..CubeConfig::default()
    };

    let runtime = RuntimeConfig {
        title: "tumble".to_string(),
        ..RuntimeConfig::default()
    };

    // Face colors are display values; keep the surface linear so they land as-is.
    let gpu = GpuInit {
        prefer_srgb: false,
        ..GpuInit::default()
    };

    Runtime::run(runtime, gpu, CubeApp::new(cube))
}

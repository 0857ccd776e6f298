//! Minimal triangle: one window, one pipeline, one draw per frame, paced
//! by a blocking fence. Press any key to quit.

use anyhow::Result;
use winit::dpi::LogicalSize;

use lumen_engine::device::GpuInit;
use lumen_engine::logging::{LoggingConfig, init_logging};
use lumen_engine::window::{Runtime, RuntimeConfig};

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    log::info!("starting lumen triangle");

    // Setup failures bubble out of `run` and exit nonzero; a key-press
    // stop returns Ok and exits 0.
    Runtime::run(
        RuntimeConfig {
            title: "lumen triangle".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        },
        GpuInit::default(),
    )?;

    log::info!("stopped cleanly");
    Ok(())
}

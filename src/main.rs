//! Interactive vector field visualization.

use std::process;

use clap::Parser;
use fieldviz::{FieldVizConfig, UVec2};

#[derive(Parser)]
#[command(name = "fieldviz", about = "GPU particle trails through animated vector fields")]
struct Cli {
    /// Window width in pixels.
    #[arg(short = 'W', long, default_value_t = 1560)]
    width: u32,

    /// Window height in pixels.
    #[arg(short = 'H', long, default_value_t = 960)]
    height: u32,

    /// Particle grid width (0 derives it from the window width).
    #[arg(long, default_value_t = 0)]
    grid_width: u32,

    /// Particle grid height (0 derives it from the window height).
    #[arg(long, default_value_t = 0)]
    grid_height: u32,

    /// Pixels per particle when deriving the grid.
    #[arg(short, long, default_value_t = 2)]
    spacing: u32,

    /// Ticks before a particle trail respawns.
    #[arg(short, long, default_value_t = 200)]
    lifetime: u32,

    /// Target frame rate.
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Present without vertical sync.
    #[arg(long)]
    no_vsync: bool,

    /// Samples per pixel for line drawing (1 or 4).
    #[arg(long, default_value_t = 1)]
    msaa: u32,

    /// Enable backend validation and log its messages.
    #[arg(short, long)]
    debug: bool,
}

impl Cli {
    fn into_config(self) -> FieldVizConfig {
        FieldVizConfig::new()
            .with_resolution(UVec2::new(self.width, self.height))
            .with_grid(UVec2::new(self.grid_width, self.grid_height))
            .with_spacing(self.spacing)
            .with_particle_lifetime(self.lifetime)
            .with_target_fps(self.fps)
            .with_vsync(!self.no_vsync)
            .with_msaa_samples(self.msaa)
            .with_debug(self.debug)
    }
}

fn main() {
    let config = Cli::parse().into_config();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.default_log_filter()),
    )
    .init();

    if let Err(e) = fieldviz::run(config) {
        log::error!("{e}");
        process::exit(1);
    }
}

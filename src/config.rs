//! Construction-time settings for the field visualization.

use glam::UVec2;

use crate::error::FieldError;
use crate::grid::DEFAULT_SPACING;
use crate::surface::DEFAULT_MAX_SURFACE;

/// Sample counts every wgpu adapter supports for the accumulation format.
pub const SUPPORTED_MSAA_SAMPLES: [u32; 2] = [1, 4];

/// Settings consumed when the engine and window are created.
///
/// Use method chaining to override the defaults:
///
/// ```
/// use fieldviz::{FieldVizConfig, UVec2};
///
/// let config = FieldVizConfig::new()
///     .with_resolution(UVec2::new(1280, 720))
///     .with_particle_lifetime(300);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldVizConfig {
    /// Initial display resolution in pixels.
    pub resolution: UVec2,
    /// Requested particle grid. A zero component is derived from the
    /// resolution divided by `spacing`.
    pub grid: UVec2,
    /// Pixels per particle when deriving the grid.
    pub spacing: u32,
    /// Ticks after which a particle trail respawns at its grid point.
    pub particle_lifetime: u32,
    /// Hard upper bound on the accumulation surface.
    pub max_surface_size: UVec2,
    /// Frame rate the front end paces itself to.
    pub target_fps: u32,
    /// Present with vertical sync.
    pub vsync: bool,
    /// Samples per pixel for line drawing; 1 disables multisampling.
    pub msaa_samples: u32,
    /// Enable backend validation layers and log their messages.
    pub debug: bool,
}

impl FieldVizConfig {
    pub fn new() -> Self {
        Self {
            resolution: UVec2::new(1560, 960),
            grid: UVec2::ZERO,
            spacing: DEFAULT_SPACING,
            particle_lifetime: 200,
            max_surface_size: DEFAULT_MAX_SURFACE,
            target_fps: 60,
            vsync: true,
            msaa_samples: 1,
            debug: false,
        }
    }

    pub fn with_resolution(mut self, resolution: UVec2) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_grid(mut self, grid: UVec2) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_spacing(mut self, spacing: u32) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_particle_lifetime(mut self, ticks: u32) -> Self {
        self.particle_lifetime = ticks;
        self
    }

    pub fn with_max_surface_size(mut self, max: UVec2) -> Self {
        self.max_surface_size = max;
        self
    }

    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps;
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn with_msaa_samples(mut self, samples: u32) -> Self {
        self.msaa_samples = samples;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// `env_logger` filter used when `RUST_LOG` is unset.
    ///
    /// Backend messages from `wgpu_core` and `wgpu_hal` only come through at
    /// `warn` in debug mode.
    pub fn default_log_filter(&self) -> &'static str {
        if self.debug {
            "info,wgpu_core=warn,wgpu_hal=warn"
        } else {
            "info,wgpu_core=error,wgpu_hal=error"
        }
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), FieldError> {
        if self.resolution.x == 0 || self.resolution.y == 0 {
            return Err(FieldError::InvalidConfig(format!(
                "resolution must be non-zero, got {}",
                self.resolution
            )));
        }
        if self.spacing == 0 {
            return Err(FieldError::InvalidConfig("spacing must be at least 1".into()));
        }
        if self.particle_lifetime == 0 {
            return Err(FieldError::InvalidConfig(
                "particle lifetime must be at least 1 tick".into(),
            ));
        }
        if !SUPPORTED_MSAA_SAMPLES.contains(&self.msaa_samples) {
            return Err(FieldError::InvalidConfig(format!(
                "msaa samples must be one of {SUPPORTED_MSAA_SAMPLES:?}, got {}",
                self.msaa_samples
            )));
        }
        if self.target_fps == 0 {
            return Err(FieldError::InvalidConfig("target fps must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for FieldVizConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = FieldVizConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.grid, UVec2::ZERO);
        assert_eq!(config.particle_lifetime, 200);
        assert_eq!(config.max_surface_size, UVec2::new(3840, 2160));
        assert_eq!(config.msaa_samples, 1);
        assert!(!config.debug);
    }

    #[test]
    fn msaa_samples_must_be_supported() {
        assert!(FieldVizConfig::new().with_msaa_samples(4).validate().is_ok());
        for samples in [0, 2, 3, 8] {
            let err = FieldVizConfig::new()
                .with_msaa_samples(samples)
                .validate()
                .unwrap_err();
            assert!(format!("{err}").contains("msaa"), "{samples}");
        }
    }

    #[test]
    fn debug_lets_backend_warnings_through() {
        let quiet = FieldVizConfig::new().default_log_filter();
        let loud = FieldVizConfig::new().with_debug(true).default_log_filter();
        assert!(quiet.contains("wgpu_hal=error"));
        assert!(loud.contains("wgpu_hal=warn"));
        assert!(loud.starts_with("info"));
    }

    #[test]
    fn rejects_zero_lifetime() {
        let err = FieldVizConfig::new()
            .with_particle_lifetime(0)
            .validate()
            .unwrap_err();
        assert!(format!("{err}").contains("lifetime"));
    }

    #[test]
    fn rejects_zero_spacing_and_resolution() {
        assert!(FieldVizConfig::new().with_spacing(0).validate().is_err());
        assert!(FieldVizConfig::new()
            .with_resolution(UVec2::new(0, 600))
            .validate()
            .is_err());
        assert!(FieldVizConfig::new().with_target_fps(0).validate().is_err());
    }
}

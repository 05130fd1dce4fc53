//! Error types for fieldviz.
//!
//! Every variant is fatal for the interactive front end: there is nothing to
//! retry into. The library still returns them as values so the caller decides
//! how to terminate.

use glam::UVec2;
use thiserror::Error;

/// Errors produced while setting up or driving the field visualization.
#[derive(Debug, Error)]
pub enum FieldError {
    /// The requested particle grid rounds down to zero particles.
    #[error(
        "particle grid {requested} rounds down to zero particles (work-group size {workgroup})"
    )]
    EmptyGrid { requested: UVec2, workgroup: UVec2 },

    /// The accumulation surface was asked to cover more than the hard maximum.
    #[error("tried to resize framebuffer to at least {requested}, which is too large (max {max})")]
    SurfaceTooLarge { requested: UVec2, max: UVec2 },

    /// The backend rejected the (re)allocated accumulation surface.
    #[error("accumulation surface of size {size} is incomplete: {message}")]
    IncompleteSurface { size: UVec2, message: String },

    /// A shader failed to compile or a pipeline failed to link.
    #[error("failed to build program '{label}':\n{log}")]
    ShaderCompilation { label: String, log: String },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found")]
    NoAdapter,

    /// Failed to create the GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),

    /// Failed to create a presentation surface for the window.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),

    /// Failed to create the event loop.
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// Failed to create the window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    /// The swapchain could not hand out a frame and reconfiguring won't help.
    #[error("failed to acquire frame: {0}")]
    Present(#[from] wgpu::SurfaceError),

    /// The backend reported an error outside any error scope.
    #[error("GPU error: {0}")]
    Backend(String),

    /// Copying GPU data back to the CPU failed.
    #[error("failed to read back GPU buffer: {0}")]
    ReadBack(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_grid_mentions_request_and_workgroup() {
        let err = FieldError::EmptyGrid {
            requested: UVec2::new(10, 700),
            workgroup: UVec2::new(16, 16),
        };
        let msg = format!("{err}");
        assert!(msg.contains("10"), "missing requested width in: {msg}");
        assert!(msg.contains("700"), "missing requested height in: {msg}");
        assert!(msg.contains("16"), "missing work-group size in: {msg}");
    }

    #[test]
    fn surface_too_large_mentions_both_sizes() {
        let err = FieldError::SurfaceTooLarge {
            requested: UVec2::new(5000, 100),
            max: UVec2::new(3840, 2160),
        };
        let msg = format!("{err}");
        assert!(msg.contains("5000"), "missing requested size in: {msg}");
        assert!(msg.contains("3840"), "missing max size in: {msg}");
    }

    #[test]
    fn shader_compilation_carries_backend_log() {
        let err = FieldError::ShaderCompilation {
            label: "Particle Update".into(),
            log: "error: expected ';'".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("Particle Update"));
        assert!(msg.contains("expected ';'"));
    }

    #[test]
    fn backend_error_keeps_message() {
        let err = FieldError::Backend("Validation Error: buffer usage".into());
        assert!(format!("{err}").contains("buffer usage"));
    }

    #[test]
    fn field_error_implements_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<FieldError>();
    }
}

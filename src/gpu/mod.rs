//! GPU side of the field: device setup, program compilation, the particle
//! engine and its renderer.

mod accum;
mod actor_buffer;
mod context;
mod engine;
mod program;
mod renderer;

pub use context::GpuContext;
pub use engine::FieldEngine;
pub use renderer::line_scale;

//! # fieldviz
//!
//! GPU particle trails drawn through animated 2D vector fields.
//!
//! A dense grid of particles is advected every tick by a handful of force
//! sources (actors): vortices that swirl particles around a point and pushers
//! that push them away from (or pull them toward) one. Each particle is drawn
//! as a short line from its previous to its current position into a surface
//! that is never cleared unless asked to, so the lines accumulate into trails.
//!
//! ## Quick Start
//!
//! ```ignore
//! use fieldviz::FieldVizConfig;
//!
//! fn main() -> Result<(), fieldviz::FieldError> {
//!     fieldviz::run(FieldVizConfig::new())
//! }
//! ```
//!
//! ## Driving the engine yourself
//!
//! [`FieldEngine`] has no window of its own. Give it a device, a queue and
//! any texture view to draw to:
//!
//! ```ignore
//! use fieldviz::{FieldEngine, FieldVizConfig, GpuContext, UVec2};
//!
//! let ctx = GpuContext::headless()?;
//! let mut engine = FieldEngine::new(
//!     ctx.device.clone(),
//!     ctx.queue.clone(),
//!     &FieldVizConfig::new(),
//!     wgpu::TextureFormat::Rgba8Unorm,
//! )?;
//!
//! for _ in 0..120 {
//!     engine.advance();
//!     engine.draw(&view, UVec2::new(1560, 960), false)?;
//! }
//! ```
//!
//! ## Coordinates
//!
//! Particles live in grid units: particle `(x, y)` starts at `(x, y)` and the
//! grid is `W x H` units regardless of the pixel resolution. The grid is
//! stretched to fill the viewport while keeping its aspect ratio, so the
//! excess axis overflows the window. Grid y grows downward on screen.

pub mod actors;
pub mod config;
pub mod error;
pub mod gpu;
pub mod grid;
pub mod input;
pub mod shaders;
pub mod surface;
pub mod time;
mod window;

pub use bytemuck;
pub use config::FieldVizConfig;
pub use error::FieldError;
pub use glam::{UVec2, Vec2};
pub use gpu::{FieldEngine, GpuContext};
pub use grid::ParticleGrid;
pub use window::run;

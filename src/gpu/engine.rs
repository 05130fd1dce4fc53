//! The particle field engine.
//!
//! Owns the particle buffer, the actor block, the update kernel and the
//! accumulation surface. One [`FieldEngine::advance`] is one simulation tick;
//! [`FieldEngine::draw`] renders whatever the buffer currently holds.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{UVec2, Vec2};
use wgpu::util::DeviceExt;

use super::accum::AccumulationSurface;
use super::actor_buffer::ActorBuffer;
use super::program::compile_compute;
use super::renderer::Renderer;
use crate::actors::{ActorScene, ActorSet, DefaultScene};
use crate::config::FieldVizConfig;
use crate::error::FieldError;
use crate::grid::{ParticleGrid, WORKGROUP_SIZE};
use crate::shaders::update_shader;

/// Uniform parameters of the update kernel.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct SimParams {
    tick: u32,
    lifetime: u32,
    num_vortices: u32,
    num_pushers: u32,
    grid_size: [u32; 2],
    _pad: [u32; 2],
}

/// GPU-resident particle field with its accumulation surface.
///
/// # Example
///
/// ```ignore
/// let ctx = GpuContext::headless()?;
/// let mut engine = FieldEngine::new(
///     ctx.device.clone(),
///     ctx.queue.clone(),
///     &FieldVizConfig::new(),
///     wgpu::TextureFormat::Rgba8Unorm,
/// )?;
///
/// // Per frame
/// engine.advance();
/// engine.draw(&target_view, resolution, false)?;
/// ```
pub struct FieldEngine {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    grid: ParticleGrid,
    tick: u32,
    particle_lifetime: u32,
    particle_buffer: wgpu::Buffer,
    scene: Box<dyn ActorScene>,
    actors: ActorSet,
    actor_buffer: ActorBuffer,
    params_buffer: wgpu::Buffer,
    update_pipeline: wgpu::ComputePipeline,
    update_bind_group: wgpu::BindGroup,
    accum: AccumulationSurface,
    renderer: Renderer,
}

impl FieldEngine {
    /// Allocate the particle grid, build all programs and size the
    /// accumulation surface for `config.resolution`.
    ///
    /// `target_format` is the format of the views later passed to [`draw`](Self::draw).
    ///
    /// # Errors
    ///
    /// - [`FieldError::InvalidConfig`] for out-of-range settings
    /// - [`FieldError::EmptyGrid`] if the grid rounds down to zero particles
    /// - [`FieldError::ShaderCompilation`] if a program fails to build
    /// - [`FieldError::SurfaceTooLarge`] / [`FieldError::IncompleteSurface`]
    ///   if the initial accumulation surface cannot be allocated
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        config: &FieldVizConfig,
        target_format: wgpu::TextureFormat,
    ) -> Result<Self, FieldError> {
        config.validate()?;

        let grid = ParticleGrid::resolve(config.grid, config.resolution, config.spacing)?;
        log::info!(
            "Particle grid {}x{} ({} particles)",
            grid.width(),
            grid.height(),
            grid.total_particles()
        );

        let particle_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Buffer"),
            contents: bytemuck::cast_slice(&grid.initial_vertices()),
            usage: wgpu::BufferUsages::VERTEX
                | wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC,
        });

        let actor_buffer = ActorBuffer::new(&device);

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Sim Params Buffer"),
            size: std::mem::size_of::<SimParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle Update Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let update_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particle Update Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: particle_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: actor_buffer.buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        let update_pipeline = compile_compute(
            &device,
            "Particle Update",
            &update_shader(WORKGROUP_SIZE),
            &bind_group_layout,
        )?;

        let renderer = Renderer::new(&device, &grid, target_format, config.msaa_samples)?;

        let mut engine = Self {
            device,
            queue,
            grid,
            tick: 0,
            particle_lifetime: config.particle_lifetime,
            particle_buffer,
            scene: Box::new(DefaultScene),
            actors: ActorSet::new(),
            actor_buffer,
            params_buffer,
            update_pipeline,
            update_bind_group,
            accum: AccumulationSurface::new(config.max_surface_size, config.msaa_samples),
            renderer,
        };
        engine.ensure_minimum_surface(config.resolution)?;

        Ok(engine)
    }

    /// Replace the actor scene driving the field.
    pub fn with_scene(mut self, scene: impl ActorScene + 'static) -> Self {
        self.scene = Box::new(scene);
        self
    }

    /// Advance the simulation by one tick.
    ///
    /// Recomputes the actors for the current tick, publishes their live byte
    /// ranges, updates every particle once on the GPU and increments the tick.
    pub fn advance(&mut self) {
        self.actors.clear();
        self.scene
            .populate(self.tick, self.grid.size().as_vec2(), &mut self.actors);
        let flushed = self.actor_buffer.publish(&self.queue, &self.actors);

        let params = SimParams {
            tick: self.tick,
            lifetime: self.particle_lifetime,
            num_vortices: self.actors.vortices().len() as u32,
            num_pushers: self.actors.pushers().len() as u32,
            grid_size: self.grid.size().to_array(),
            _pad: [0; 2],
        };
        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Particle Update Encoder"),
            });

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Particle Update Pass"),
                timestamp_writes: None,
            });

            pass.set_pipeline(&self.update_pipeline);
            pass.set_bind_group(0, &self.update_bind_group, &[]);

            let workgroups = self.grid.workgroups();
            pass.dispatch_workgroups(workgroups.x, workgroups.y, 1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));

        log::trace!(
            "tick {}: {} vortices, {} pushers, {} actor bytes flushed",
            self.tick,
            params.num_vortices,
            params.num_pushers,
            flushed
        );

        self.tick = self.tick.wrapping_add(1);
    }

    /// Make sure the accumulation surface covers `required` on both axes.
    ///
    /// A reallocated surface starts out opaque black.
    ///
    /// # Errors
    ///
    /// [`FieldError::SurfaceTooLarge`] if `required` exceeds the configured
    /// maximum, [`FieldError::IncompleteSurface`] if the backend rejects the
    /// new texture.
    pub fn ensure_minimum_surface(&mut self, required: UVec2) -> Result<(), FieldError> {
        if self.accum.ensure_minimum(&self.device, &self.queue, required)? {
            self.renderer.bind_surface(&self.device, &self.accum);
        }
        Ok(())
    }

    /// Draw the current particles into the accumulation surface and copy it to `target`.
    ///
    /// With `should_clear` the surface is cleared to opaque black first;
    /// otherwise the new lines land on top of every previous frame.
    /// `target` must be at least `resolution` in size.
    pub fn draw(
        &mut self,
        target: &wgpu::TextureView,
        resolution: UVec2,
        should_clear: bool,
    ) -> Result<(), FieldError> {
        self.ensure_minimum_surface(resolution)?;
        self.renderer.draw(
            &self.device,
            &self.queue,
            &self.particle_buffer,
            &self.accum,
            target,
            resolution,
            should_clear,
        );
        Ok(())
    }

    /// Ticks advanced since construction.
    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn grid(&self) -> &ParticleGrid {
        &self.grid
    }

    pub fn total_particles(&self) -> u32 {
        self.grid.total_particles()
    }

    pub fn particle_lifetime(&self) -> u32 {
        self.particle_lifetime
    }

    /// Current accumulation surface size.
    pub fn surface_size(&self) -> UVec2 {
        self.accum.size()
    }

    /// Samples per pixel of the line pass.
    pub fn msaa_samples(&self) -> u32 {
        self.accum.sample_count()
    }

    /// Number of times the accumulation surface has been (re)allocated.
    pub fn surface_generation(&self) -> u64 {
        self.accum.generation()
    }

    /// Actors published by the most recent [`advance`](Self::advance).
    pub fn actors(&self) -> &ActorSet {
        &self.actors
    }

    /// Copy the particle buffer back to the CPU as head/tail pairs.
    ///
    /// Blocks until the GPU has finished all submitted work.
    pub fn read_particles(&self) -> Result<Vec<Vec2>, FieldError> {
        let size = self.particle_buffer.size();
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Readback Buffer"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Particle Readback Encoder"),
            });
        encoder.copy_buffer_to_buffer(&self.particle_buffer, 0, &staging, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);

        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(FieldError::ReadBack(format!("{e:?}"))),
            Err(_) => return Err(FieldError::ReadBack("map callback dropped".into())),
        }

        let vertices = {
            let data = slice.get_mapped_range();
            bytemuck::cast_slice::<u8, Vec2>(&data).to_vec()
        };
        staging.unmap();
        Ok(vertices)
    }
}

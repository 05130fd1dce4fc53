//! Draws particles as trail lines and composites the result on screen.

use bytemuck::{Pod, Zeroable};
use glam::{UVec2, Vec2};

use super::accum::{AccumulationSurface, ACCUM_FORMAT};
use super::program::{compile_render, RenderProgram};
use crate::error::FieldError;
use crate::grid::ParticleGrid;
use crate::shaders::{BLIT_SHADER, LINES_SHADER};

/// Scale applied to normalized particle coordinates so the grid keeps its
/// aspect ratio inside a `resolution` viewport.
///
/// The longer screen axis is cropped: a viewport wider than the grid
/// stretches y (cutting off top and bottom), a taller one stretches x.
pub fn line_scale(grid: UVec2, resolution: UVec2) -> Vec2 {
    let aspect = (grid.x as f32 * resolution.y as f32) / (grid.y as f32 * resolution.x as f32);
    Vec2::new(aspect.max(1.0), (1.0 / aspect).max(1.0))
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct LineParams {
    grid_size: [f32; 2],
    scale: [f32; 2],
}

pub(crate) struct Renderer {
    line_pipeline: wgpu::RenderPipeline,
    line_params_buffer: wgpu::Buffer,
    line_bind_group: wgpu::BindGroup,
    blit_pipeline: wgpu::RenderPipeline,
    blit_bind_group_layout: wgpu::BindGroupLayout,
    /// Points at the current accumulation texture; rebuilt when it is replaced.
    blit_bind_group: Option<wgpu::BindGroup>,
    grid: UVec2,
    vertex_count: u32,
}

impl Renderer {
    pub fn new(
        device: &wgpu::Device,
        grid: &ParticleGrid,
        target_format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Result<Self, FieldError> {
        let line_params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Line Params Buffer"),
            size: std::mem::size_of::<LineParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let line_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Line Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let line_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Line Bind Group"),
            layout: &line_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: line_params_buffer.as_entire_binding(),
            }],
        });

        // Heads and tails are consecutive vec2s; LineList pairs them up
        let vertex_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            }],
        };

        let line_pipeline = compile_render(
            device,
            &RenderProgram {
                label: "Particle Lines",
                source: LINES_SHADER,
                bind_group_layout: &line_bind_group_layout,
                vertex_buffers: &[vertex_layout],
                topology: wgpu::PrimitiveTopology::LineList,
                target_format: ACCUM_FORMAT,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                sample_count,
            },
        )?;

        let blit_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Blit Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                }],
            });

        let blit_pipeline = compile_render(
            device,
            &RenderProgram {
                label: "Accumulation Blit",
                source: BLIT_SHADER,
                bind_group_layout: &blit_bind_group_layout,
                vertex_buffers: &[],
                topology: wgpu::PrimitiveTopology::TriangleList,
                target_format,
                blend: None,
                sample_count: 1,
            },
        )?;

        Ok(Self {
            line_pipeline,
            line_params_buffer,
            line_bind_group,
            blit_pipeline,
            blit_bind_group_layout,
            blit_bind_group: None,
            grid: grid.size(),
            vertex_count: grid.vertex_count(),
        })
    }

    /// Point the blit pass at the (re)allocated accumulation texture.
    pub fn bind_surface(&mut self, device: &wgpu::Device, accum: &AccumulationSurface) {
        self.blit_bind_group = accum.view().map(|view| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Blit Bind Group"),
                layout: &self.blit_bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                }],
            })
        });
    }

    /// Draw the particle lines into `accum` and copy `(0,0)-(resolution)` to `target`.
    ///
    /// `accum` must already cover `resolution`; so must `target`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        particles: &wgpu::Buffer,
        accum: &AccumulationSurface,
        target: &wgpu::TextureView,
        resolution: UVec2,
        should_clear: bool,
    ) {
        let load = if should_clear {
            wgpu::LoadOp::Clear(wgpu::Color::BLACK)
        } else {
            wgpu::LoadOp::Load
        };
        let (Some(lines_attachment), Some(blit_bind_group)) =
            (accum.color_attachment(load), &self.blit_bind_group)
        else {
            log::warn!("Skipping draw: accumulation surface not allocated");
            return;
        };

        let params = LineParams {
            grid_size: self.grid.as_vec2().to_array(),
            scale: line_scale(self.grid, resolution).to_array(),
        };
        queue.write_buffer(&self.line_params_buffer, 0, bytemuck::bytes_of(&params));

        let viewport = resolution.as_vec2();

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Field Draw Encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Particle Lines Pass"),
                color_attachments: &[Some(lines_attachment)],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_viewport(0.0, 0.0, viewport.x, viewport.y, 0.0, 1.0);
            pass.set_pipeline(&self.line_pipeline);
            pass.set_bind_group(0, &self.line_bind_group, &[]);
            pass.set_vertex_buffer(0, particles.slice(..));
            pass.draw(0..self.vertex_count, 0..1);
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Accumulation Blit Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_viewport(0.0, 0.0, viewport.x, viewport.y, 0.0, 1.0);
            pass.set_pipeline(&self.blit_pipeline);
            pass.set_bind_group(0, blit_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}

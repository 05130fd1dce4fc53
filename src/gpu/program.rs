//! Shader program creation with backend diagnostics.
//!
//! wgpu reports shader compile and pipeline link failures as validation
//! errors. Each program is built inside its own validation error scope so a
//! failure comes back as [`FieldError::ShaderCompilation`] carrying the
//! backend message instead of reaching the uncaptured-error handler.

use crate::error::FieldError;

/// Run `build` inside a validation error scope.
pub(crate) fn capture_validation<T>(
    device: &wgpu::Device,
    build: impl FnOnce() -> T,
) -> Result<T, wgpu::Error> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = build();
    match pollster::block_on(device.pop_error_scope()) {
        None => Ok(value),
        Some(error) => Err(error),
    }
}

fn compilation_error(label: &str, error: wgpu::Error) -> FieldError {
    FieldError::ShaderCompilation {
        label: label.to_string(),
        log: error.to_string(),
    }
}

/// Compile a WGSL compute shader into a pipeline using entry point `main`.
pub(crate) fn compile_compute(
    device: &wgpu::Device,
    label: &str,
    source: &str,
    bind_group_layout: &wgpu::BindGroupLayout,
) -> Result<wgpu::ComputePipeline, FieldError> {
    capture_validation(device, || {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[bind_group_layout],
            push_constant_ranges: &[],
        });

        device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(label),
            layout: Some(&layout),
            module: &module,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        })
    })
    .map_err(|e| compilation_error(label, e))
}

/// Fixed-function state of a vertex + fragment program.
pub(crate) struct RenderProgram<'a> {
    pub label: &'a str,
    pub source: &'a str,
    pub bind_group_layout: &'a wgpu::BindGroupLayout,
    pub vertex_buffers: &'a [wgpu::VertexBufferLayout<'a>],
    pub topology: wgpu::PrimitiveTopology,
    pub target_format: wgpu::TextureFormat,
    pub blend: Option<wgpu::BlendState>,
    pub sample_count: u32,
}

/// Compile a WGSL vertex + fragment shader (`vs_main`, `fs_main`) into a pipeline.
pub(crate) fn compile_render(
    device: &wgpu::Device,
    program: &RenderProgram<'_>,
) -> Result<wgpu::RenderPipeline, FieldError> {
    capture_validation(device, || {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(program.label),
            source: wgpu::ShaderSource::Wgsl(program.source.into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(program.label),
            bind_group_layouts: &[program.bind_group_layout],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(program.label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: program.vertex_buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: program.target_format,
                    blend: program.blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: program.topology,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: program.sample_count,
                ..Default::default()
            },
            multiview: None,
            cache: None,
        })
    })
    .map_err(|e| compilation_error(program.label, e))
}

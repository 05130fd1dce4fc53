//! The accumulation surface that line draws pile up on between frames.
//!
//! Owning the surface (rather than drawing straight to the swapchain) keeps
//! its contents well-defined from one frame to the next. With multisampling
//! the lines land on a persistent multisampled texture that resolves into
//! the single-sample one the blit reads.

use glam::UVec2;

use super::program::capture_validation;
use crate::error::FieldError;
use crate::surface::grow_to_cover;

pub(crate) const ACCUM_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

struct Target {
    /// Kept alive alongside its view.
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

pub(crate) struct AccumulationSurface {
    resolved: Option<Target>,
    multisampled: Option<Target>,
    sample_count: u32,
    size: UVec2,
    max_size: UVec2,
    /// Bumped on every reallocation.
    generation: u64,
}

impl AccumulationSurface {
    /// An unallocated surface; the first [`ensure_minimum`](Self::ensure_minimum)
    /// allocates it at the exact requested size.
    pub fn new(max_size: UVec2, sample_count: u32) -> Self {
        Self {
            resolved: None,
            multisampled: None,
            sample_count: sample_count.max(1),
            size: UVec2::ZERO,
            max_size,
            generation: 0,
        }
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Single-sample view read by the blit.
    pub fn view(&self) -> Option<&wgpu::TextureView> {
        self.resolved.as_ref().map(|t| &t.view)
    }

    /// Attachment the line pass draws into.
    pub fn color_attachment(
        &self,
        load: wgpu::LoadOp<wgpu::Color>,
    ) -> Option<wgpu::RenderPassColorAttachment<'_>> {
        let resolved = &self.resolved.as_ref()?.view;
        let ops = wgpu::Operations {
            load,
            store: wgpu::StoreOp::Store,
        };
        Some(match &self.multisampled {
            Some(msaa) => wgpu::RenderPassColorAttachment {
                view: &msaa.view,
                resolve_target: Some(resolved),
                ops,
            },
            None => wgpu::RenderPassColorAttachment {
                view: resolved,
                resolve_target: None,
                ops,
            },
        })
    }

    /// Grow the surface so it covers `required` on both axes.
    ///
    /// Returns `true` when the textures were replaced. Old contents are
    /// discarded, not copied forward; the new surface starts opaque black.
    pub fn ensure_minimum(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        required: UVec2,
    ) -> Result<bool, FieldError> {
        let Some(size) = grow_to_cover(self.size, required, self.max_size)? else {
            return Ok(false);
        };

        let (resolved, multisampled) = capture_validation(device, || {
            let resolved = create_target(
                device,
                "Accumulation Surface",
                size,
                1,
                wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            );
            let multisampled = (self.sample_count > 1).then(|| {
                create_target(
                    device,
                    "Accumulation Surface (multisampled)",
                    size,
                    self.sample_count,
                    wgpu::TextureUsages::RENDER_ATTACHMENT,
                )
            });
            (resolved, multisampled)
        })
        .map_err(|e| FieldError::IncompleteSurface {
            size,
            message: e.to_string(),
        })?;

        log::debug!(
            "Accumulation surface resized from {} to {} (requested {}, {}x MSAA)",
            self.size,
            size,
            required,
            self.sample_count
        );

        self.resolved = Some(resolved);
        self.multisampled = multisampled;
        self.size = size;
        self.generation += 1;
        self.clear(device, queue);
        Ok(true)
    }

    /// Fill the whole surface with opaque black.
    fn clear(&self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let Some(attachment) = self.color_attachment(wgpu::LoadOp::Clear(wgpu::Color::BLACK))
        else {
            return;
        };

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Accumulation Clear Encoder"),
        });
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Accumulation Clear Pass"),
            color_attachments: &[Some(attachment)],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        queue.submit(std::iter::once(encoder.finish()));
    }
}

fn create_target(
    device: &wgpu::Device,
    label: &str,
    size: UVec2,
    sample_count: u32,
    usage: wgpu::TextureUsages,
) -> Target {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: size.x,
            height: size.y,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: ACCUM_FORMAT,
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    Target { texture, view }
}

//! Publication of the per-tick actor block to the GPU.
//!
//! The [`ActorSet`] owned by the engine is the long-lived CPU view of the
//! uniform block. Each tick only its live sub-ranges are written through the
//! queue, which orders them before the compute pass submitted afterwards.

use crate::actors::{ActorBlock, ActorSet};

pub(crate) struct ActorBuffer {
    pub buffer: wgpu::Buffer,
}

impl ActorBuffer {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Actor Buffer"),
            size: ActorBlock::SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self { buffer }
    }

    /// Flush the live vortex and pusher ranges of `actors`.
    ///
    /// Returns the number of bytes written.
    pub fn publish(&self, queue: &wgpu::Queue, actors: &ActorSet) -> u64 {
        let bytes = bytemuck::bytes_of(actors.block());
        let mut flushed = 0;
        for range in actors.live_ranges() {
            if range.is_empty() {
                continue;
            }
            let live = &bytes[range.start as usize..range.end as usize];
            queue.write_buffer(&self.buffer, range.start, live);
            flushed += range.end - range.start;
        }
        flushed
    }
}

//! Force sources acting on the particle field.
//!
//! Actors are not persisted between frames. Each tick they are recomputed
//! from the tick alone by an [`ActorScene`] and written into an [`ActorSet`],
//! a pair of fixed-capacity arrays whose layout matches the uniform block the
//! compute kernel reads.
//!
//! # Example
//!
//! ```
//! use fieldviz::actors::{compute_actors, DefaultScene};
//! use fieldviz::Vec2;
//!
//! let actors = compute_actors(&DefaultScene, 120, Vec2::new(768.0, 480.0));
//! assert_eq!(actors.vortices().len(), 2);
//! assert_eq!(actors.pushers().len(), 1);
//! ```

use std::mem::{offset_of, size_of};
use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// Capacity of the vortex array in the GPU block.
pub const MAX_VORTICES: usize = 16;
/// Capacity of the pusher array in the GPU block.
pub const MAX_PUSHERS: usize = 16;

/// Simulation ticks per second of scene time.
pub const TICKS_PER_SECOND: f32 = 60.0;

/// Rotational force source.
///
/// Positive force turns clockwise on screen (y grows downward), negative
/// counter-clockwise.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vortex {
    pub position: [f32; 2],
    pub force: f32,
    _pad: f32,
}

impl Vortex {
    pub fn new(position: Vec2, force: f32) -> Self {
        Self {
            position: position.to_array(),
            force,
            _pad: 0.0,
        }
    }
}

/// Radial force source. Positive force repels, negative attracts.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Pusher {
    pub position: [f32; 2],
    pub force: f32,
    _pad: f32,
}

impl Pusher {
    pub fn new(position: Vec2, force: f32) -> Self {
        Self {
            position: position.to_array(),
            force,
            _pad: 0.0,
        }
    }
}

/// CPU mirror of the actor uniform block.
///
/// Only the first `num_vortices` / `num_pushers` entries are meaningful;
/// the rest are stale and never read by the kernel.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct ActorBlock {
    pub vortices: [Vortex; MAX_VORTICES],
    pub pushers: [Pusher; MAX_PUSHERS],
}

impl ActorBlock {
    pub const SIZE: u64 = size_of::<ActorBlock>() as u64;

    /// Byte ranges of the block that hold live actors.
    ///
    /// These are the only bytes that need publishing before a dispatch that
    /// consumes `num_vortices` vortices and `num_pushers` pushers.
    pub fn live_ranges(num_vortices: usize, num_pushers: usize) -> [Range<u64>; 2] {
        let vortex_start = offset_of!(ActorBlock, vortices) as u64;
        let pusher_start = offset_of!(ActorBlock, pushers) as u64;
        [
            vortex_start..vortex_start + (num_vortices * size_of::<Vortex>()) as u64,
            pusher_start..pusher_start + (num_pushers * size_of::<Pusher>()) as u64,
        ]
    }
}

/// Bounded list of actors for a single tick.
#[derive(Clone)]
pub struct ActorSet {
    block: ActorBlock,
    num_vortices: usize,
    num_pushers: usize,
}

impl ActorSet {
    pub fn new() -> Self {
        Self {
            block: ActorBlock::zeroed(),
            num_vortices: 0,
            num_pushers: 0,
        }
    }

    /// Append a vortex.
    ///
    /// # Panics
    ///
    /// If [`MAX_VORTICES`] vortices are already present.
    pub fn add_vortex(&mut self, position: Vec2, force: f32) {
        assert!(
            self.num_vortices < MAX_VORTICES,
            "too many vortices (capacity {MAX_VORTICES})"
        );
        self.block.vortices[self.num_vortices] = Vortex::new(position, force);
        self.num_vortices += 1;
    }

    /// Append a pusher.
    ///
    /// # Panics
    ///
    /// If [`MAX_PUSHERS`] pushers are already present.
    pub fn add_pusher(&mut self, position: Vec2, force: f32) {
        assert!(
            self.num_pushers < MAX_PUSHERS,
            "too many pushers (capacity {MAX_PUSHERS})"
        );
        self.block.pushers[self.num_pushers] = Pusher::new(position, force);
        self.num_pushers += 1;
    }

    /// Forget all actors without touching the stored bytes.
    pub fn clear(&mut self) {
        self.num_vortices = 0;
        self.num_pushers = 0;
    }

    pub fn vortices(&self) -> &[Vortex] {
        &self.block.vortices[..self.num_vortices]
    }

    pub fn pushers(&self) -> &[Pusher] {
        &self.block.pushers[..self.num_pushers]
    }

    pub fn block(&self) -> &ActorBlock {
        &self.block
    }

    /// See [`ActorBlock::live_ranges`].
    pub fn live_ranges(&self) -> [Range<u64>; 2] {
        ActorBlock::live_ranges(self.num_vortices, self.num_pushers)
    }
}

impl Default for ActorSet {
    fn default() -> Self {
        Self::new()
    }
}

/// A deterministic, time-varying arrangement of actors.
///
/// Implementations must be pure in `tick` and `grid`: the same inputs always
/// produce the same actors in the same order.
pub trait ActorScene {
    /// Add this tick's actors to `actors`, which starts out empty.
    fn populate(&self, tick: u32, grid: Vec2, actors: &mut ActorSet);
}

/// One strong central vortex, an oscillating corner vortex and a pulsing pusher.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultScene;

impl ActorScene for DefaultScene {
    fn populate(&self, tick: u32, grid: Vec2, actors: &mut ActorSet) {
        let sec = tick as f32 / TICKS_PER_SECOND;

        actors.add_vortex(grid * Vec2::new(0.5, 0.5), 200.0);
        actors.add_vortex(grid * Vec2::new(0.2, 0.1), 100.0 * sec.sin());

        actors.add_pusher(grid * Vec2::new(0.7, 0.5), 75.0 + 75.0 * (sec * 1.5).sin());
    }
}

/// Evaluate `scene` at `tick` into a fresh [`ActorSet`].
pub fn compute_actors(scene: &dyn ActorScene, tick: u32, grid: Vec2) -> ActorSet {
    let mut actors = ActorSet::new();
    scene.populate(tick, grid, &mut actors);
    actors
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRID: Vec2 = Vec2::new(768.0, 480.0);

    #[test]
    fn gpu_layout_is_sixteen_byte_strided() {
        assert_eq!(size_of::<Vortex>(), 16);
        assert_eq!(size_of::<Pusher>(), 16);
        assert_eq!(offset_of!(ActorBlock, vortices), 0);
        assert_eq!(offset_of!(ActorBlock, pushers), 16 * MAX_VORTICES);
        assert_eq!(ActorBlock::SIZE, (16 * (MAX_VORTICES + MAX_PUSHERS)) as u64);
    }

    #[test]
    fn default_scene_is_deterministic() {
        for tick in [0, 1, 59, 60, 12_345, u32::MAX] {
            let a = compute_actors(&DefaultScene, tick, GRID);
            let b = compute_actors(&DefaultScene, tick, GRID);
            assert_eq!(a.vortices(), b.vortices(), "tick {tick}");
            assert_eq!(a.pushers(), b.pushers(), "tick {tick}");
        }
    }

    #[test]
    fn default_scene_at_tick_zero() {
        let actors = compute_actors(&DefaultScene, 0, GRID);

        assert_eq!(actors.vortices()[0], Vortex::new(Vec2::new(384.0, 240.0), 200.0));
        assert_eq!(actors.vortices()[1].force, 0.0);
        assert_eq!(actors.pushers()[0].force, 75.0);
        assert_eq!(actors.pushers()[0].position, [0.7 * 768.0, 240.0]);
    }

    #[test]
    fn default_scene_oscillates_with_time() {
        // sin(pi/2) peaks a quarter period in: tick = 60 * pi / 2
        let tick = (TICKS_PER_SECOND * std::f32::consts::FRAC_PI_2).round() as u32;
        let actors = compute_actors(&DefaultScene, tick, GRID);
        assert!((actors.vortices()[1].force - 100.0).abs() < 0.1);

        let pusher_forces: Vec<f32> = (0..600)
            .map(|t| compute_actors(&DefaultScene, t, GRID).pushers()[0].force)
            .collect();
        assert!(pusher_forces.iter().all(|f| (0.0..=150.0).contains(f)));
        assert!(pusher_forces.iter().any(|f| *f > 140.0));
        assert!(pusher_forces.iter().any(|f| *f < 10.0));
    }

    #[test]
    fn live_ranges_cover_only_used_entries() {
        let actors = compute_actors(&DefaultScene, 7, GRID);
        let [vortices, pushers] = actors.live_ranges();
        assert_eq!(vortices, 0..32);
        assert_eq!(pushers, 256..272);

        let [vortices, pushers] = ActorSet::new().live_ranges();
        assert!(vortices.is_empty());
        assert!(pushers.is_empty());
    }

    #[test]
    fn live_ranges_match_block_bytes() {
        let actors = compute_actors(&DefaultScene, 90, GRID);
        let bytes = bytemuck::bytes_of(actors.block());
        let [vortices, _] = actors.live_ranges();
        let live: &[Vortex] =
            bytemuck::cast_slice(&bytes[vortices.start as usize..vortices.end as usize]);
        assert_eq!(live, actors.vortices());
    }

    #[test]
    fn fills_to_capacity() {
        let mut actors = ActorSet::new();
        for i in 0..MAX_VORTICES {
            actors.add_vortex(Vec2::splat(i as f32), 1.0);
        }
        for i in 0..MAX_PUSHERS {
            actors.add_pusher(Vec2::splat(i as f32), -1.0);
        }
        assert_eq!(actors.vortices().len(), MAX_VORTICES);
        assert_eq!(actors.pushers().len(), MAX_PUSHERS);

        actors.clear();
        assert!(actors.vortices().is_empty());
        assert!(actors.pushers().is_empty());
    }

    #[test]
    #[should_panic(expected = "too many vortices")]
    fn vortex_overflow_panics() {
        let mut actors = ActorSet::new();
        for _ in 0..=MAX_VORTICES {
            actors.add_vortex(Vec2::ZERO, 1.0);
        }
    }

    #[test]
    #[should_panic(expected = "too many pushers")]
    fn pusher_overflow_panics() {
        let mut actors = ActorSet::new();
        for _ in 0..=MAX_PUSHERS {
            actors.add_pusher(Vec2::ZERO, 1.0);
        }
    }
}

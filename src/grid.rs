//! Logical particle grid.
//!
//! Particles live on a `W x H` lattice in simulation coordinates, one unit
//! apart regardless of pixel resolution. Both dimensions are multiples of the
//! compute work-group tile so a dispatch covers every particle exactly once.

use glam::{UVec2, Vec2};

use crate::error::FieldError;

/// Tile processed by one compute work-group.
///
/// 16x16 is the largest square tile within wgpu's default limit of 256
/// invocations per work-group.
pub const WORKGROUP_SIZE: UVec2 = UVec2::new(16, 16);

/// Default pixels per particle when the grid is derived from the resolution.
pub const DEFAULT_SPACING: u32 = 2;

/// Size of the particle lattice, always a multiple of [`WORKGROUP_SIZE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticleGrid {
    size: UVec2,
}

impl ParticleGrid {
    /// Round `requested` down to the work-group tile.
    ///
    /// # Errors
    ///
    /// [`FieldError::EmptyGrid`] if either dimension rounds down to zero.
    pub fn new(requested: UVec2) -> Result<Self, FieldError> {
        let size = requested / WORKGROUP_SIZE * WORKGROUP_SIZE;
        if size.x == 0 || size.y == 0 {
            return Err(FieldError::EmptyGrid {
                requested,
                workgroup: WORKGROUP_SIZE,
            });
        }
        Ok(Self { size })
    }

    /// Resolve a configured grid against the display resolution.
    ///
    /// A zero component in `requested` is replaced by the matching resolution
    /// component divided by `spacing`.
    pub fn resolve(requested: UVec2, resolution: UVec2, spacing: u32) -> Result<Self, FieldError> {
        let derived = resolution / spacing.max(1);
        let size = UVec2::new(
            if requested.x == 0 { derived.x } else { requested.x },
            if requested.y == 0 { derived.y } else { requested.y },
        );
        Self::new(size)
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.x
    }

    pub fn height(&self) -> u32 {
        self.size.y
    }

    pub fn total_particles(&self) -> u32 {
        self.size.x * self.size.y
    }

    /// Number of vertices in the particle buffer (head and tail per particle).
    pub fn vertex_count(&self) -> u32 {
        2 * self.total_particles()
    }

    /// Work-groups to dispatch so each particle is updated once.
    pub fn workgroups(&self) -> UVec2 {
        self.size / WORKGROUP_SIZE
    }

    /// Linear index of the particle at `(x, y)`, left to right then top to bottom.
    pub fn index(&self, x: u32, y: u32) -> u32 {
        y * self.size.x + x
    }

    /// Initial particle buffer contents: head and tail both at the grid point.
    pub fn initial_vertices(&self) -> Vec<Vec2> {
        let mut vertices = Vec::with_capacity(self.vertex_count() as usize);
        for y in 0..self.size.y {
            for x in 0..self.size.x {
                let home = Vec2::new(x as f32, y as f32);
                vertices.push(home);
                vertices.push(home);
            }
        }
        vertices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_down_to_workgroup_multiple() {
        let grid = ParticleGrid::new(UVec2::new(780, 480)).unwrap();
        assert_eq!(grid.size(), UVec2::new(768, 480));
        assert_eq!(grid.total_particles(), 768 * 480);
        assert_eq!(grid.workgroups(), UVec2::new(48, 30));
    }

    #[test]
    fn total_particles_matches_rounded_product() {
        for (w, h) in [(16, 16), (17, 33), (100, 999), (4096, 20)] {
            let grid = ParticleGrid::new(UVec2::new(w, h)).unwrap();
            let rw = w / 16 * 16;
            let rh = h / 16 * 16;
            assert_eq!(grid.total_particles(), rw * rh, "grid {w}x{h}");
            assert_eq!(grid.vertex_count(), 2 * rw * rh);
        }
    }

    #[test]
    fn zero_after_rounding_is_rejected() {
        for requested in [UVec2::new(15, 500), UVec2::new(500, 0), UVec2::ZERO] {
            let err = ParticleGrid::new(requested).unwrap_err();
            assert!(matches!(err, FieldError::EmptyGrid { .. }), "{requested}");
        }
    }

    #[test]
    fn zero_request_derives_from_resolution() {
        let grid = ParticleGrid::resolve(UVec2::ZERO, UVec2::new(1560, 960), 2).unwrap();
        assert_eq!(grid.size(), UVec2::new(768, 480));

        let grid = ParticleGrid::resolve(UVec2::new(64, 0), UVec2::new(1560, 960), 4).unwrap();
        assert_eq!(grid.size(), UVec2::new(64, 240));
    }

    #[test]
    fn initial_vertices_are_one_unit_apart() {
        let grid = ParticleGrid::new(UVec2::new(32, 16)).unwrap();
        let vertices = grid.initial_vertices();
        assert_eq!(vertices.len(), grid.vertex_count() as usize);

        let i = grid.index(5, 3) as usize;
        assert_eq!(vertices[2 * i], Vec2::new(5.0, 3.0));
        assert_eq!(vertices[2 * i + 1], Vec2::new(5.0, 3.0));

        let right = grid.index(6, 3) as usize;
        assert_eq!(vertices[2 * right].x - vertices[2 * i].x, 1.0);
    }
}

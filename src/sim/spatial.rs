//! Bounding volumes and overlap queries
//!
//! Volumes are recomputed on demand every tick since enemies move every
//! tick. [`SpatialGrid`] is a broad phase rebuilt per tick; at tens of
//! entities a linear scan is just as good, but the grid keeps collision
//! checks near O(n) if counts grow.

use std::collections::HashMap;

use glam::Vec3;

use super::state::{Enemy, Projectile};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }
}

/// Standard box overlap test (touching faces count as overlap)
#[inline]
pub fn intersects(a: &Aabb, b: &Aabb) -> bool {
    a.min.x <= b.max.x
        && a.max.x >= b.min.x
        && a.min.y <= b.max.y
        && a.max.y >= b.min.y
        && a.min.z <= b.max.z
        && a.max.z >= b.min.z
}

/// Enemy volume: box standing on the ground at the enemy's position
pub fn bounding_volume_of(enemy: &Enemy) -> Aabb {
    let center = enemy.pos + Vec3::new(0.0, enemy.half_extents.y, 0.0);
    Aabb::from_center(center, enemy.half_extents)
}

/// Projectile volume: small cube around its current position
pub fn projectile_volume(projectile: &Projectile, half_extent: f32) -> Aabb {
    Aabb::from_center(projectile.pos, Vec3::splat(half_extent))
}

/// Uniform grid over the ground plane, keyed by (x, z) cell
///
/// Stores indices into the slice it was built from so callers can keep
/// registry order when resolving ties.
#[derive(Debug, Default)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(f32::EPSILON),
            cells: HashMap::new(),
        }
    }

    fn cell_of(&self, x: f32, z: f32) -> (i32, i32) {
        (
            (x / self.cell_size).floor() as i32,
            (z / self.cell_size).floor() as i32,
        )
    }

    /// Rebuild from scratch; every cell a box overlaps gets its index
    pub fn rebuild(&mut self, volumes: &[Aabb]) {
        self.cells.clear();
        for (idx, aabb) in volumes.iter().enumerate() {
            let (x0, z0) = self.cell_of(aabb.min.x, aabb.min.z);
            let (x1, z1) = self.cell_of(aabb.max.x, aabb.max.z);
            for cx in x0..=x1 {
                for cz in z0..=z1 {
                    self.cells.entry((cx, cz)).or_default().push(idx);
                }
            }
        }
    }

    /// Candidate indices whose cells overlap `query`, ascending, deduplicated
    pub fn candidates(&self, query: &Aabb) -> Vec<usize> {
        let (x0, z0) = self.cell_of(query.min.x, query.min.z);
        let (x1, z1) = self.cell_of(query.max.x, query.max.z);
        let mut out = Vec::new();
        for cx in x0..=x1 {
            for cz in z0..=z1 {
                if let Some(bucket) = self.cells.get(&(cx, cz)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}

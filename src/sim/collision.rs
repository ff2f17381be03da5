//! Collision volumes for static maze geometry
//!
//! Everything is an axis-aligned box. The player is a box too: a square
//! footprint of `PLAYER_RADIUS` half-width, `PLAYER_HEIGHT` tall, standing
//! on its position. Bounds are inclusive, so touching faces collide.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::state::VisualId;
use crate::consts::{PLAYER_HEIGHT, PLAYER_RADIUS};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box of the given size centered on `center`
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// The player's volume if it stood at `position`
    pub fn player_at(position: Vec3) -> Self {
        Self {
            min: Vec3::new(position.x - PLAYER_RADIUS, position.y, position.z - PLAYER_RADIUS),
            max: Vec3::new(
                position.x + PLAYER_RADIUS,
                position.y + PLAYER_HEIGHT,
                position.z + PLAYER_RADIUS,
            ),
        }
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Inclusive overlap on all three axes
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

/// A static obstacle and the visual that represents it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wall {
    pub bounds: Aabb,
    pub visual: VisualId,
}

/// Linear list of wall boxes for the active level
///
/// Levels hold tens of walls, so a flat scan beats anything cleverer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpatialIndex {
    walls: Vec<Wall>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self { walls: Vec::new() }
    }

    pub fn insert(&mut self, wall: Wall) {
        self.walls.push(wall);
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    pub fn len(&self) -> usize {
        self.walls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.walls.is_empty()
    }

    /// Drop every wall, handing back their visuals for removal
    pub fn clear(&mut self) -> Vec<VisualId> {
        self.walls.drain(..).map(|w| w.visual).collect()
    }

    /// Would a player standing at `candidate` touch any wall?
    pub fn overlaps(&self, candidate: Vec3) -> bool {
        let player = Aabb::player_at(candidate);
        self.walls.iter().any(|w| player.intersects(&w.bounds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn index_with(bounds: Aabb) -> SpatialIndex {
        let mut index = SpatialIndex::new();
        index.insert(Wall { bounds, visual: 1 });
        index
    }

    #[test]
    fn test_from_center_size() {
        // Level 2 back wall: 12 x 3 x 1 at (0, 1.5, 16)
        let b = Aabb::from_center_size(Vec3::new(0.0, 1.5, 16.0), Vec3::new(12.0, 3.0, 1.0));
        assert_eq!(b.min, Vec3::new(-6.0, 0.0, 15.5));
        assert_eq!(b.max, Vec3::new(6.0, 3.0, 16.5));
    }

    #[test]
    fn test_touching_faces_collide() {
        let wall = Aabb::new(Vec3::new(1.0, 0.0, -5.0), Vec3::new(2.0, 3.0, 5.0));
        let index = index_with(wall);
        // Player's +x face at exactly x = 1.0
        assert!(index.overlaps(Vec3::new(0.5, 0.0, 0.0)));
        // A hair further away is clear
        assert!(!index.overlaps(Vec3::new(0.49, 0.0, 0.0)));
    }

    #[test]
    fn test_player_above_wall_is_clear() {
        let wall = Aabb::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 3.0, 1.0));
        let index = index_with(wall);
        assert!(!index.overlaps(Vec3::new(0.0, 3.5, 0.0)));
        // Feet resting exactly on top still count as contact
        assert!(index.overlaps(Vec3::new(0.0, 3.0, 0.0)));
    }

    #[test]
    fn test_clear_returns_visuals() {
        let mut index = SpatialIndex::new();
        for id in [4, 5, 6] {
            index.insert(Wall {
                bounds: Aabb::new(Vec3::ZERO, Vec3::ONE),
                visual: id,
            });
        }
        assert_eq!(index.clear(), vec![4, 5, 6]);
        assert!(index.is_empty());
        assert!(!index.overlaps(Vec3::new(0.5, 0.0, 0.5)));
    }

    proptest! {
        #[test]
        fn prop_strictly_outside_never_collides(
            x in -50.0f32..50.0,
            z in -50.0f32..50.0,
            gap in 0.01f32..10.0,
        ) {
            // Wall directly east of the player with a positive gap
            let left = x + crate::consts::PLAYER_RADIUS + gap;
            let wall = Aabb::new(
                Vec3::new(left, 0.0, z - 5.0),
                Vec3::new(left + 1.0, 3.0, z + 5.0),
            );
            prop_assert!(!index_with(wall).overlaps(Vec3::new(x, 0.0, z)));
        }

        #[test]
        fn prop_enclosed_always_collides(
            x in -50.0f32..50.0,
            z in -50.0f32..50.0,
            margin in 0.0f32..5.0,
        ) {
            let player = Aabb::player_at(Vec3::new(x, 0.0, z));
            let pad = Vec3::splat(margin);
            let wall = Aabb::new(player.min - pad, player.max + pad);
            prop_assert!(index_with(wall).overlaps(Vec3::new(x, 0.0, z)));
        }

        #[test]
        fn prop_intersects_is_symmetric(
            ax in -10.0f32..10.0, az in -10.0f32..10.0,
            bx in -10.0f32..10.0, bz in -10.0f32..10.0,
        ) {
            let a = Aabb::from_center_size(Vec3::new(ax, 1.0, az), Vec3::new(2.0, 2.0, 2.0));
            let b = Aabb::from_center_size(Vec3::new(bx, 1.0, bz), Vec3::new(3.0, 2.0, 1.0));
            prop_assert_eq!(a.intersects(&b), b.intersects(&a));
        }
    }
}

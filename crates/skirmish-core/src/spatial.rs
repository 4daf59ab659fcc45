//! Spatial query contract between the combat core and the physics layer.
//!
//! The core never looks at colliders directly. Melee hit detection, peer
//! avoidance and walkability checks all go through [`SpatialQuery`], which
//! the host engine implements against its own collision world. Both queries
//! are synchronous and side-effect free.
//!
//! [`GridSpatial`] is a small tile-grid implementation for headless runs and
//! tests: blocked tiles plus circular bodies synced from the simulation.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};
use skirmish_common::ActorId;
use std::collections::HashSet;

/// Collision layer an actor lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    /// Player-controlled avatars.
    Player,
    /// Autonomous enemies.
    Enemy,
}

impl Layer {
    const fn bit(self) -> u32 {
        match self {
            Self::Player => 1 << 0,
            Self::Enemy => 1 << 1,
        }
    }
}

/// Set of layers a query should match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LayerMask(u32);

impl LayerMask {
    /// Matches nothing.
    pub const NONE: Self = Self(0);
    /// Matches player avatars.
    pub const PLAYER: Self = Self(Layer::Player.bit());
    /// Matches enemies.
    pub const ENEMY: Self = Self(Layer::Enemy.bit());
    /// Matches every layer.
    pub const ALL: Self = Self(Layer::Player.bit() | Layer::Enemy.bit());

    /// Mask matching a single layer.
    #[must_use]
    pub const fn of(layer: Layer) -> Self {
        Self(layer.bit())
    }

    /// Union of two masks.
    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether `layer` is part of the mask.
    #[must_use]
    pub const fn contains(self, layer: Layer) -> bool {
        self.0 & layer.bit() != 0
    }

    /// Whether the mask matches nothing.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// An actor found by an overlap query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialHit {
    /// Actor that overlapped the query circle.
    pub id: ActorId,
    /// Its position at query time.
    pub position: Vec2,
}

/// Collider state the simulation publishes for the physics layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    /// Owning actor.
    pub id: ActorId,
    /// Collision layer.
    pub layer: Layer,
    /// Body center.
    pub position: Vec2,
    /// Collider radius.
    pub radius: f32,
    /// Disabled colliders never show up in queries.
    pub collidable: bool,
}

/// Queries the core issues against the current world state.
pub trait SpatialQuery {
    /// Returns every collidable actor on `mask` whose collider overlaps the circle.
    fn overlap_circle(&self, center: Vec2, radius: f32, mask: LayerMask) -> Vec<SpatialHit>;

    /// Whether an actor could stand at `point`.
    fn is_walkable(&self, point: Vec2) -> bool;
}

/// Tile-grid spatial world with circular bodies.
///
/// Tile `(x, y)` is centered on `(x, y) * tile_size`, so a body standing on
/// integer grid coordinates sits in the middle of its tile.
#[derive(Debug, Clone)]
pub struct GridSpatial {
    tile_size: f32,
    /// Radius of the footprint circle used for walkability.
    footprint_radius: f32,
    blocked: HashSet<IVec2>,
    /// Inclusive tile bounds; everything outside is treated as solid.
    bounds: Option<(IVec2, IVec2)>,
    bodies: Vec<BodySnapshot>,
}

impl Default for GridSpatial {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl GridSpatial {
    /// Creates an open, unbounded grid.
    #[must_use]
    pub fn new(tile_size: f32) -> Self {
        Self {
            tile_size: tile_size.max(f32::EPSILON),
            footprint_radius: 0.3,
            blocked: HashSet::new(),
            bounds: None,
            bodies: Vec::new(),
        }
    }

    /// Sets the walkability footprint radius.
    #[must_use]
    pub fn with_footprint_radius(mut self, radius: f32) -> Self {
        self.footprint_radius = radius.max(0.0);
        self
    }

    /// Restricts the walkable area to the inclusive tile rectangle.
    #[must_use]
    pub fn with_bounds(mut self, min: IVec2, max: IVec2) -> Self {
        self.bounds = Some((min.min(max), min.max(max)));
        self
    }

    /// Marks a tile as solid.
    pub fn block_tile(&mut self, x: i32, y: i32) {
        self.blocked.insert(IVec2::new(x, y));
    }

    /// Clears a solid tile.
    pub fn unblock_tile(&mut self, x: i32, y: i32) {
        self.blocked.remove(&IVec2::new(x, y));
    }

    /// Number of solid tiles.
    #[must_use]
    pub fn blocked_count(&self) -> usize {
        self.blocked.len()
    }

    /// Tile containing `point`.
    #[must_use]
    pub fn tile_of(&self, point: Vec2) -> IVec2 {
        (point / self.tile_size).round().as_ivec2()
    }

    /// Replaces the body set with the simulation's current snapshot.
    pub fn sync_bodies(&mut self, bodies: impl IntoIterator<Item = BodySnapshot>) {
        self.bodies.clear();
        self.bodies.extend(bodies);
    }

    /// Bodies known to the grid.
    #[must_use]
    pub fn bodies(&self) -> &[BodySnapshot] {
        &self.bodies
    }

    fn tile_is_solid(&self, tile: IVec2) -> bool {
        if let Some((min, max)) = self.bounds {
            if tile.cmplt(min).any() || tile.cmpgt(max).any() {
                return true;
            }
        }
        self.blocked.contains(&tile)
    }

    /// Closest point of a tile's square to `point`.
    fn closest_point_in_tile(&self, tile: IVec2, point: Vec2) -> Vec2 {
        let half = self.tile_size * 0.5;
        let center = tile.as_vec2() * self.tile_size;
        point.clamp(center - Vec2::splat(half), center + Vec2::splat(half))
    }
}

impl SpatialQuery for GridSpatial {
    fn overlap_circle(&self, center: Vec2, radius: f32, mask: LayerMask) -> Vec<SpatialHit> {
        self.bodies
            .iter()
            .filter(|body| body.collidable && mask.contains(body.layer))
            .filter(|body| body.position.distance(center) <= radius + body.radius)
            .map(|body| SpatialHit {
                id: body.id,
                position: body.position,
            })
            .collect()
    }

    fn is_walkable(&self, point: Vec2) -> bool {
        if !point.is_finite() {
            return false;
        }
        let r = self.footprint_radius;
        let lo = self.tile_of(point - Vec2::splat(r));
        let hi = self.tile_of(point + Vec2::splat(r));

        for y in lo.y..=hi.y {
            for x in lo.x..=hi.x {
                let tile = IVec2::new(x, y);
                if !self.tile_is_solid(tile) {
                    continue;
                }
                let closest = self.closest_point_in_tile(tile, point);
                if closest.distance(point) < r || tile == self.tile_of(point) {
                    return false;
                }
            }
        }
        true
    }
}

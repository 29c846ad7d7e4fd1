//! Probe result structures.
//!
//! These structures hold the results of the ray casts used for ground and
//! wall sensing. They are produced fresh every physics tick and never
//! carried over to the next one.

use bevy::prelude::*;

/// Information about a single probe hit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub struct ProbeHit {
    /// Distance from the probe origin to the hit point.
    pub distance: f32,
    /// Normal of the surface at the hit point (unit length, points away from surface).
    pub normal: Vec2,
    /// World position of the hit point.
    pub point: Vec2,
    /// Entity that was hit (if the backend knows it).
    #[reflect(ignore)]
    pub entity: Option<Entity>,
}

impl ProbeHit {
    /// Create a probe hit. The normal is normalized.
    pub fn new(distance: f32, normal: Vec2, point: Vec2, entity: Option<Entity>) -> Self {
        Self {
            distance,
            normal: normal.normalize_or_zero(),
            point,
            entity,
        }
    }
}

/// Which side of the body a probe belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum ProbeSide {
    /// The body's local left (`-right`).
    Left,
    /// The body's local right.
    Right,
}

/// The two ground probe results of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct ProbePair {
    pub left: ProbeHit,
    pub right: ProbeHit,
}

impl ProbePair {
    pub fn new(left: ProbeHit, right: ProbeHit) -> Self {
        Self { left, right }
    }

    /// Midpoint of the two contact points.
    pub fn average_point(&self) -> Vec2 {
        (self.left.point + self.right.point) * 0.5
    }

    /// Normalized mean of the two contact normals.
    ///
    /// Returns `Vec2::ZERO` when the normals cancel out (e.g. a probe on
    /// each side of a thin seam facing opposite ways).
    pub fn average_normal(&self) -> Vec2 {
        ((self.left.normal + self.right.normal) * 0.5).normalize_or_zero()
    }

    /// Get the hit for a side.
    pub fn get(&self, side: ProbeSide) -> &ProbeHit {
        match side {
            ProbeSide::Left => &self.left,
            ProbeSide::Right => &self.right,
        }
    }

    /// Replace the hit for a side.
    pub fn replace(&mut self, side: ProbeSide, hit: ProbeHit) {
        match side {
            ProbeSide::Left => self.left = hit,
            ProbeSide::Right => self.right = hit,
        }
    }
}

/// Collision filter applied to every probe, as (memberships, filters) bit masks.
///
/// A collider is hit when its memberships intersect `filters` and its
/// filters intersect `memberships`, matching Rapier's interaction groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct ProbeFilter {
    pub memberships: u32,
    pub filters: u32,
}

impl Default for ProbeFilter {
    fn default() -> Self {
        Self::ALL
    }
}

impl ProbeFilter {
    /// Interacts with everything.
    pub const ALL: Self = Self {
        memberships: u32::MAX,
        filters: u32::MAX,
    };

    pub fn new(memberships: u32, filters: u32) -> Self {
        Self {
            memberships,
            filters,
        }
    }

    /// Check whether a collider with the given groups passes this filter.
    pub fn accepts(&self, memberships: u32, filters: u32) -> bool {
        (self.filters & memberships) != 0 && (self.memberships & filters) != 0
    }
}

/// What a cast probe was used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum ProbeKind {
    Ground(ProbeSide),
    Wall(ProbeSide),
    /// The averaged surface normal drawn from the averaged contact point.
    AverageNormal,
}

/// Record of one cast, kept for debug visualization only.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct ProbeTrace {
    pub kind: ProbeKind,
    pub origin: Vec2,
    /// Direction times length.
    pub ray: Vec2,
    pub hit: Option<Vec2>,
}

impl ProbeTrace {
    pub fn new(kind: ProbeKind, origin: Vec2, direction: Vec2, length: f32, hit: Option<Vec2>) -> Self {
        Self {
            kind,
            origin,
            ray: direction * length,
            hit,
        }
    }

    /// End point of the drawn segment: the hit point, or the full ray.
    pub fn end(&self) -> Vec2 {
        self.hit.unwrap_or(self.origin + self.ray)
    }
}

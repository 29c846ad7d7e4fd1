//! Deterministic segment-world backend.
//!
//! A physics backend with no physics engine behind it: static geometry is a
//! list of line segments, and bodies are integrated with explicit Euler
//! steps. Casts are exact and repeatable, which makes this backend suitable
//! for tests, replays and headless simulation.

use bevy::prelude::*;

use crate::backend::SurfacePhysicsBackend;
use crate::config::SurfaceConfig;
use crate::probe::{ProbeFilter, ProbeHit};
use crate::sensor::ProbeCaster;
use crate::walker::{BodyPose, SurfaceWalker};
use crate::SurfaceWalkerSet;

/// A static line segment. Both faces are solid.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Vec2,
    pub end: Vec2,
    /// Collision groups as (memberships, filters).
    pub groups: ProbeFilter,
    /// Entity reported in hits, if any.
    #[reflect(ignore)]
    pub entity: Option<Entity>,
}

impl Segment {
    pub fn new(start: Vec2, end: Vec2) -> Self {
        Self {
            start,
            end,
            groups: ProbeFilter::ALL,
            entity: None,
        }
    }

    /// Put this segment into collision groups.
    pub fn with_groups(mut self, memberships: u32, filters: u32) -> Self {
        self.groups = ProbeFilter::new(memberships, filters);
        self
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Vector from start to end.
    pub fn direction(&self) -> Vec2 {
        self.end - self.start
    }

    /// Intersect a ray with this segment.
    ///
    /// Returns the distance along the (normalized) ray and the face normal
    /// on the side the ray came from.
    pub fn ray_intersection(&self, origin: Vec2, direction: Vec2) -> Option<(f32, Vec2)> {
        let dir = direction.normalize_or_zero();
        let seg = self.direction();

        // origin + t*dir = start + s*seg
        let denom = dir.perp_dot(seg);
        if denom.abs() < f32::EPSILON {
            return None;
        }

        let origin_to_start = self.start - origin;
        let t = origin_to_start.perp_dot(seg) / denom;
        let s = origin_to_start.perp_dot(dir) / denom;
        if t < 0.0 || !(0.0..=1.0).contains(&s) {
            return None;
        }

        let mut normal = seg.perp().normalize_or_zero();
        if normal.dot(dir) > 0.0 {
            normal = -normal;
        }
        Some((t, normal))
    }
}

/// Static collision geometry made of line segments.
#[derive(Resource, Reflect, Debug, Clone, Default)]
#[reflect(Resource)]
pub struct SegmentWorld {
    pub segments: Vec<Segment>,
    /// Acceleration applied to bodies with a non-zero gravity scale.
    pub gravity: Vec2,
}

impl SegmentWorld {
    /// Create a world from segments, with no gravity.
    pub fn from_segments(segments: impl IntoIterator<Item = Segment>) -> Self {
        Self {
            segments: segments.into_iter().collect(),
            gravity: Vec2::ZERO,
        }
    }

    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    /// Add a closed polygon outline.
    pub fn add_polygon(&mut self, points: &[Vec2]) {
        for (i, start) in points.iter().enumerate() {
            let end = points[(i + 1) % points.len()];
            self.segments.push(Segment::new(*start, end));
        }
    }

    /// Add an axis-aligned box given its center and half size.
    pub fn add_box(&mut self, center: Vec2, half_size: Vec2) {
        let min = center - half_size;
        let max = center + half_size;
        self.add_polygon(&[
            Vec2::new(min.x, min.y),
            Vec2::new(max.x, min.y),
            Vec2::new(max.x, max.y),
            Vec2::new(min.x, max.y),
        ]);
    }
}

impl ProbeCaster for SegmentWorld {
    fn cast(&self, origin: Vec2, direction: Vec2, max_distance: f32, filter: ProbeFilter) -> Option<ProbeHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec2::ZERO {
            return None;
        }

        self.segments
            .iter()
            .filter(|segment| filter.accepts(segment.groups.memberships, segment.groups.filters))
            .filter_map(|segment| {
                let (distance, normal) = segment.ray_intersection(origin, dir)?;
                (distance <= max_distance).then_some((distance, normal, segment.entity))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(distance, normal, entity)| ProbeHit::new(distance, normal, origin + dir * distance, entity))
    }
}

/// Rigid body state for the segment backend.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct SimulatedBody {
    pub velocity: Vec2,
    /// Force accumulated for the next integration step.
    pub force: Vec2,
    pub gravity_scale: f32,
    pub mass: f32,
}

impl Default for SimulatedBody {
    fn default() -> Self {
        Self {
            velocity: Vec2::ZERO,
            force: Vec2::ZERO,
            gravity_scale: 1.0,
            mass: 1.0,
        }
    }
}

impl SimulatedBody {
    /// Advance one explicit Euler step and clear the accumulated force.
    ///
    /// Returns the displacement.
    pub fn integrate(&mut self, gravity: Vec2, dt: f32) -> Vec2 {
        let acceleration = self.force / self.mass.max(f32::EPSILON) + gravity * self.gravity_scale;
        self.velocity += acceleration * dt;
        self.force = Vec2::ZERO;
        self.velocity * dt
    }
}

/// Deterministic backend over a [`SegmentWorld`] resource and [`SimulatedBody`] components.
pub struct SegmentBackend;

impl SurfacePhysicsBackend for SegmentBackend {
    fn plugin() -> impl Plugin {
        SegmentBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<SimulatedBody>(entity)
            .map(|b| b.velocity)
            .unwrap_or(Vec2::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2) {
        if let Some(mut body) = world.get_mut::<SimulatedBody>(entity) {
            body.velocity = velocity;
        }
    }

    fn apply_force(world: &mut World, entity: Entity, force: Vec2) {
        if let Some(mut body) = world.get_mut::<SimulatedBody>(entity) {
            body.force += force;
        }
    }

    fn get_gravity_scale(world: &World, entity: Entity) -> f32 {
        world
            .get::<SimulatedBody>(entity)
            .map(|b| b.gravity_scale)
            .unwrap_or(1.0)
    }

    fn set_gravity_scale(world: &mut World, entity: Entity, scale: f32) {
        if let Some(mut body) = world.get_mut::<SimulatedBody>(entity) {
            body.gravity_scale = scale;
        }
    }
}

/// Plugin that sets up the segment backend systems.
pub struct SegmentBackendPlugin;

impl Plugin for SegmentBackendPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<SegmentWorld>();
        app.register_type::<SimulatedBody>();
        app.init_resource::<SegmentWorld>();

        app.add_systems(FixedUpdate, segment_sensors.in_set(SurfaceWalkerSet::Sensors));
        app.add_systems(
            FixedUpdate,
            integrate_simulated_bodies::<SegmentBackend>.in_set(SurfaceWalkerSet::FinalApplication),
        );
    }
}

/// Run the walker sensors against the segment world.
fn segment_sensors(
    geometry: Res<SegmentWorld>,
    mut q_walkers: Query<(&Transform, &SurfaceConfig, &mut SurfaceWalker, Option<&SimulatedBody>)>,
) {
    for (transform, config, mut walker, body) in &mut q_walkers {
        let pose = BodyPose::from_transform(transform);
        let velocity = body.map(|b| b.velocity).unwrap_or(Vec2::ZERO);
        walker.sense(geometry.as_ref(), &pose, velocity, config);
    }
}

/// Integrate every simulated body and move its transform.
fn integrate_simulated_bodies<B: SurfacePhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);
    let gravity = world
        .get_resource::<SegmentWorld>()
        .map(|w| w.gravity)
        .unwrap_or(Vec2::ZERO);

    let mut q_bodies = world.query::<(&mut SimulatedBody, &mut Transform)>();
    for (mut body, mut transform) in q_bodies.iter_mut(world) {
        let displacement = body.integrate(gravity, dt);
        transform.translation += displacement.extend(0.0);
    }
}

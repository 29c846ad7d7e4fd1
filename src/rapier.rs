//! Rapier2D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier2D.
//! Enable with the `rapier2d` feature.

use bevy::prelude::*;
use bevy_rapier2d::geometry::Group;
use bevy_rapier2d::prelude::*;

use crate::backend::SurfacePhysicsBackend;
use crate::config::SurfaceConfig;
use crate::probe::{ProbeFilter, ProbeHit};
use crate::sensor::ProbeCaster;
use crate::walker::{BodyPose, SurfaceWalker};
use crate::SurfaceWalkerSet;

/// Rapier2D physics backend for the surface walker.
///
/// Velocity and gravity scale map onto Rapier's [`Velocity`] and
/// [`GravityScale`] components. Forces are accumulated per tick in a
/// [`SurfaceForce`] component and folded into [`ExternalForce`] at the end
/// of the tick, so forces written by other systems are preserved.
pub struct Rapier2dBackend;

impl SurfacePhysicsBackend for Rapier2dBackend {
    fn plugin() -> impl Plugin {
        Rapier2dBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec2::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel = velocity;
        }
    }

    fn apply_force(world: &mut World, entity: Entity, force: Vec2) {
        // Folded into ExternalForce by apply_surface_forces.
        if let Some(mut accumulated) = world.get_mut::<SurfaceForce>(entity) {
            accumulated.pending += force;
        }
    }

    fn get_gravity_scale(world: &World, entity: Entity) -> f32 {
        world
            .get::<GravityScale>(entity)
            .map(|g| g.0)
            .unwrap_or(1.0)
    }

    fn set_gravity_scale(world: &mut World, entity: Entity, scale: f32) {
        if let Some(mut gravity) = world.get_mut::<GravityScale>(entity) {
            gravity.0 = scale;
        } else if let Ok(mut entity_mut) = world.get_entity_mut(entity) {
            entity_mut.insert(GravityScale(scale));
        }
    }
}

/// Force bookkeeping for one walker.
///
/// `pending` collects the forces of the current tick; `applied` remembers
/// what was added to [`ExternalForce`] last tick so it can be taken back out.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct SurfaceForce {
    pub pending: Vec2,
    pub applied: Vec2,
}

/// Plugin that sets up Rapier2D-specific systems for the surface walker.
pub struct Rapier2dBackendPlugin;

impl Plugin for Rapier2dBackendPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<SurfaceForce>();

        app.add_systems(
            FixedUpdate,
            (attach_surface_force, clear_surface_forces)
                .chain()
                .in_set(SurfaceWalkerSet::Preparation),
        );
        app.add_systems(FixedUpdate, rapier_surface_sensors.in_set(SurfaceWalkerSet::Sensors));
        app.add_systems(
            FixedUpdate,
            apply_surface_forces.in_set(SurfaceWalkerSet::FinalApplication),
        );
    }
}

/// [`ProbeCaster`] over a Rapier query pipeline.
///
/// Casts skip the walker's own rigid body and all sensor colliders.
pub struct RapierCaster<'a, 'w> {
    context: &'a RapierContext<'w>,
    exclude: Entity,
    groups: Option<CollisionGroups>,
}

impl<'a, 'w> RapierCaster<'a, 'w> {
    pub fn new(context: &'a RapierContext<'w>, exclude: Entity) -> Self {
        Self {
            context,
            exclude,
            groups: None,
        }
    }

    /// Use these groups instead of the probe filter passed to each cast.
    pub fn with_groups(mut self, groups: CollisionGroups) -> Self {
        self.groups = Some(groups);
        self
    }
}

impl ProbeCaster for RapierCaster<'_, '_> {
    fn cast(&self, origin: Vec2, direction: Vec2, max_distance: f32, filter: ProbeFilter) -> Option<ProbeHit> {
        let direction = direction.normalize_or_zero();
        if direction == Vec2::ZERO {
            return None;
        }

        let groups = self.groups.unwrap_or_else(|| collision_groups_for(filter));
        let query = QueryFilter::default()
            .exclude_rigid_body(self.exclude)
            .exclude_sensors()
            .groups(groups);

        self.context
            .cast_ray_and_get_normal(origin, direction, max_distance, true, query)
            .map(|(hit_entity, hit)| ProbeHit::new(hit.time_of_impact, hit.normal, hit.point, Some(hit_entity)))
    }
}

/// Convert a probe filter into Rapier collision groups.
pub fn collision_groups_for(filter: ProbeFilter) -> CollisionGroups {
    CollisionGroups::new(
        Group::from_bits_truncate(filter.memberships),
        Group::from_bits_truncate(filter.filters),
    )
}

/// Run the walker sensors against the Rapier world.
///
/// A walker configured with [`ProbeFilter::ALL`] inherits the groups of
/// its own collider, if it has any.
fn rapier_surface_sensors(
    rapier_context: ReadRapierContext,
    mut q_walkers: Query<(
        Entity,
        &Transform,
        &SurfaceConfig,
        &mut SurfaceWalker,
        Option<&Velocity>,
        Option<&CollisionGroups>,
    )>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    for (entity, transform, config, mut walker, velocity, collision_groups) in &mut q_walkers {
        let mut caster = RapierCaster::new(&context, entity);
        if config.collision_filter == ProbeFilter::ALL {
            if let Some(groups) = collision_groups {
                caster = caster.with_groups(*groups);
            }
        }

        let pose = BodyPose::from_transform(transform);
        let velocity = velocity.map(|v| v.linvel).unwrap_or(Vec2::ZERO);
        walker.sense(&caster, &pose, velocity, config);
    }
}

/// Give force-driven walkers a [`SurfaceForce`] tracker.
fn attach_surface_force(
    mut commands: Commands,
    q_missing: Query<Entity, (With<SurfaceWalker>, With<ExternalForce>, Without<SurfaceForce>)>,
) {
    for entity in &q_missing {
        commands.entity(entity).insert(SurfaceForce::default());
    }
}

/// Take last tick's walker force back out of [`ExternalForce`].
pub fn clear_surface_forces(mut q: Query<(&mut ExternalForce, &mut SurfaceForce)>) {
    for (mut ext_force, mut surface_force) in &mut q {
        ext_force.force -= surface_force.applied;
        *surface_force = SurfaceForce::default();
    }
}

/// Fold this tick's walker force into [`ExternalForce`].
pub fn apply_surface_forces(mut q: Query<(&mut ExternalForce, &mut SurfaceForce)>) {
    for (mut ext_force, mut surface_force) in &mut q {
        ext_force.force += surface_force.pending;
        surface_force.applied = surface_force.pending;
        surface_force.pending = Vec2::ZERO;
    }
}

/// Bundle for creating a surface walker with Rapier2D physics.
///
/// The walker sets its own rotation each tick, so Rapier must not rotate
/// the body: rotation is locked by default.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use surface_walker::prelude::*;
/// use surface_walker::rapier::Rapier2dSurfaceBundle;
///
/// fn spawn_crawler(mut commands: Commands) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 100.0, 0.0),
///         SurfaceWalker::new(),
///         SurfaceConfig::crawler(),
///         Rapier2dSurfaceBundle::new(),
///         Collider::ball(4.0),
///     ));
/// }
/// ```
#[derive(Bundle)]
pub struct Rapier2dSurfaceBundle {
    pub rigid_body: RigidBody,
    pub velocity: Velocity,
    /// Walker forces are added here at the end of each tick.
    pub external_force: ExternalForce,
    pub surface_force: SurfaceForce,
    /// Toggled off on vertical surfaces.
    pub gravity_scale: GravityScale,
    pub locked_axes: LockedAxes,
    pub damping: Damping,
}

impl Default for Rapier2dSurfaceBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl Rapier2dSurfaceBundle {
    /// Dynamic body, rotation locked, no damping.
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            external_force: ExternalForce::default(),
            surface_force: SurfaceForce::default(),
            gravity_scale: GravityScale(1.0),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            damping: Damping {
                linear_damping: 0.0,
                angular_damping: 0.0,
            },
        }
    }

    /// Set the rigid body type for the walker.
    ///
    /// [`RigidBody::KinematicVelocityBased`] suits the velocity-based drive
    /// policy when the walker should ignore gravity and contacts entirely.
    pub fn with_body(mut self, body: RigidBody) -> Self {
        self.rigid_body = body;
        self
    }

    /// Set the damping coefficients for velocity reduction.
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.damping = Damping {
            linear_damping: linear,
            angular_damping: angular,
        };
        self
    }
}

//! Physics backend abstraction.
//!
//! This module defines the trait that physics backends must implement
//! to work with the surface walker. Ray casting goes through
//! [`ProbeCaster`](crate::sensor::ProbeCaster), implemented by each
//! backend's sensor system; everything the integrator needs to read or
//! write on the body goes through [`SurfacePhysicsBackend`].

use bevy::prelude::*;

use crate::walker::{BodyPose, BodyState};

/// Trait for physics backend implementations.
///
/// The backend plugin returned by [`plugin`](Self::plugin) must add a
/// system to [`SurfaceWalkerSet::Sensors`](crate::SurfaceWalkerSet::Sensors)
/// that calls [`SurfaceWalker::sense`](crate::walker::SurfaceWalker::sense)
/// with a caster over its collision world.
///
/// # Example
///
/// See [`SegmentBackend`](crate::segment::SegmentBackend) for a complete
/// backend without a physics engine, and the `rapier` module's
/// `Rapier2dBackend` for Bevy Rapier2D.
pub trait SurfacePhysicsBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Get the current linear velocity of an entity.
    fn get_velocity(world: &World, entity: Entity) -> Vec2;

    /// Set the linear velocity of an entity.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2);

    /// Apply a force to an entity for the next physics step.
    fn apply_force(world: &mut World, entity: Entity, force: Vec2);

    /// Get the gravity scale of an entity (1.0 if the entity has none).
    fn get_gravity_scale(world: &World, entity: Entity) -> f32;

    /// Set the gravity scale of an entity.
    fn set_gravity_scale(world: &mut World, entity: Entity, scale: f32);

    /// Get the fixed timestep delta time.
    fn get_fixed_timestep(world: &World) -> f32 {
        world
            .get_resource::<Time<Fixed>>()
            .map(|t| t.delta_secs())
            .filter(|&d| d > 0.0)
            .unwrap_or(1.0 / 60.0)
    }

    /// Snapshot an entity's physical state for a tick.
    fn read_body(world: &World, entity: Entity) -> BodyState {
        let pose = world
            .get::<Transform>(entity)
            .map(BodyPose::from_transform)
            .unwrap_or_default();
        BodyState {
            pose,
            velocity: Self::get_velocity(world, entity),
            gravity_scale: Self::get_gravity_scale(world, entity),
            force: Vec2::ZERO,
        }
    }

    /// Write a tick's velocity and accumulated force back to an entity.
    ///
    /// Pose is owned by the orientation system and gravity scale by the
    /// preparation system, so neither is written here.
    fn write_body(world: &mut World, entity: Entity, body: &BodyState) {
        Self::set_velocity(world, entity, body.velocity);
        if body.force != Vec2::ZERO {
            Self::apply_force(world, entity, body.force);
        }
    }
}

//! Core walker systems.
//!
//! These systems run the walker pipeline on Bevy entities. Steps that touch
//! the physics body are generic over the physics backend so that different
//! physics engines can be used; sensing is added by each backend's plugin.

use bevy::prelude::*;

use crate::backend::SurfacePhysicsBackend;
use crate::config::SurfaceConfig;
use crate::locomotion;
use crate::walker::{BodyPose, SurfaceWalker};

/// Check configurations as they are added.
///
/// A walker with an invalid configuration is logged and loses its
/// [`SurfaceWalker`] component, so the rest of the pipeline skips it.
pub fn validate_new_configs(
    mut commands: Commands,
    q_added: Query<(Entity, &SurfaceConfig), (Added<SurfaceConfig>, With<SurfaceWalker>)>,
) {
    for (entity, config) in &q_added {
        if let Err(err) = config.validate() {
            error!("invalid surface walker configuration on {entity}: {err}");
            commands.entity(entity).remove::<SurfaceWalker>();
        }
    }
}

/// Toggle gravity off while the body stands on a vertical surface.
///
/// Uses the pose left by the previous tick.
pub fn update_gravity_scale<B: SurfacePhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, f32)> = world
        .query_filtered::<(Entity, &Transform, &SurfaceConfig), With<SurfaceWalker>>()
        .iter(world)
        .map(|(e, transform, config)| {
            let pose = BodyPose::from_transform(transform);
            (e, locomotion::gravity_scale_for(&pose, config))
        })
        .collect();

    for (entity, scale) in entities {
        if B::get_gravity_scale(world, entity) != scale {
            debug!("gravity scale of {entity} set to {scale}");
            B::set_gravity_scale(world, entity, scale);
        }
    }
}

/// Snap grounded walkers onto the sensed surface.
pub fn apply_surface_orientation(mut q_walkers: Query<(&mut Transform, &SurfaceConfig, &mut SurfaceWalker)>) {
    for (mut transform, config, mut walker) in &mut q_walkers {
        let mut pose = BodyPose::from_transform(&transform);
        if walker.orient(&mut pose, config).is_some() {
            pose.write_to(&mut transform);
        }
    }
}

/// Apply the stop/drive step through the physics backend.
pub fn apply_surface_drive<B: SurfacePhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, SurfaceConfig)> = world
        .query_filtered::<(Entity, &SurfaceConfig), With<SurfaceWalker>>()
        .iter(world)
        .map(|(e, config)| (e, *config))
        .collect();

    for (entity, config) in entities {
        let mut body = B::read_body(world, entity);
        let Some(walker) = world.get::<SurfaceWalker>(entity) else {
            continue;
        };
        let outcome = walker.drive(&mut body, &config);
        trace!("drive {entity}: {outcome:?}, velocity {:?}", body.velocity);

        B::write_body(world, entity, &body);
    }
}

//! Ground and wall sensing.
//!
//! The ground sensor casts two probes from symmetric lateral offsets,
//! each tilted toward the body's centerline, and succeeds only when both
//! touch. When the body heads into a wall, the wall override replaces one
//! ground result with a horizontal probe hit, which reports the wall's
//! normal more faithfully than the downward-angled probe.

use bevy::prelude::*;

use crate::config::SurfaceConfig;
use crate::geometry::{right_from_rotation, rotate_vec, similarity, up_from_rotation};
use crate::probe::{ProbeFilter, ProbeHit, ProbeKind, ProbePair, ProbeSide, ProbeTrace};
use crate::walker::BodyPose;

/// Ray casting capability provided by a physics backend.
///
/// Implementations must not have side effects: the sensors may cast any
/// number of probes per tick.
pub trait ProbeCaster {
    /// Cast a ray and return the closest hit within `max_distance`.
    ///
    /// `direction` is normalized by the caller.
    fn cast(&self, origin: Vec2, direction: Vec2, max_distance: f32, filter: ProbeFilter) -> Option<ProbeHit>;
}

impl<T: ProbeCaster + ?Sized> ProbeCaster for &T {
    fn cast(&self, origin: Vec2, direction: Vec2, max_distance: f32, filter: ProbeFilter) -> Option<ProbeHit> {
        (**self).cast(origin, direction, max_distance, filter)
    }
}

/// A probe ray in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeRay {
    pub origin: Vec2,
    pub direction: Vec2,
    pub length: f32,
}

impl ProbeRay {
    fn cast(&self, caster: &impl ProbeCaster, filter: ProbeFilter) -> Option<ProbeHit> {
        caster.cast(self.origin, self.direction, self.length, filter)
    }
}

/// World-space rays of the two ground probes for a pose.
///
/// The left probe starts at `-right * spacing` and leans toward `+right`;
/// the right probe mirrors it.
pub fn ground_probe_rays(pose: &BodyPose, config: &SurfaceConfig) -> (ProbeRay, ProbeRay) {
    let up = up_from_rotation(pose.rotation);
    let right = right_from_rotation(pose.rotation);
    let base = pose.position + up * config.ground_probe_vertical_offset;
    let angle = config.ground_probe_inward_angle;

    let left = ProbeRay {
        origin: base - right * config.ground_probe_lateral_spacing,
        direction: rotate_vec(-up, angle),
        length: config.ground_probe_length,
    };
    let right = ProbeRay {
        origin: base + right * config.ground_probe_lateral_spacing,
        direction: rotate_vec(-up, -angle),
        length: config.ground_probe_length,
    };
    (left, right)
}

/// World-space ray of the horizontal wall probe on one side.
pub fn wall_probe_ray(pose: &BodyPose, side: ProbeSide, config: &SurfaceConfig) -> ProbeRay {
    let up = up_from_rotation(pose.rotation);
    let outward = match side {
        ProbeSide::Left => -right_from_rotation(pose.rotation),
        ProbeSide::Right => right_from_rotation(pose.rotation),
    };
    ProbeRay {
        origin: pose.position + up * config.ground_probe_vertical_offset + outward * config.wall_probe_lateral_offset,
        direction: outward,
        length: config.wall_probe_length,
    }
}

/// Cast both ground probes.
///
/// Returns the pair only if both probes hit. Every cast is appended to
/// `traces`.
pub fn cast_ground_probes(
    caster: &impl ProbeCaster,
    pose: &BodyPose,
    config: &SurfaceConfig,
    traces: &mut Vec<ProbeTrace>,
) -> Option<ProbePair> {
    let (left_ray, right_ray) = ground_probe_rays(pose, config);
    let left = left_ray.cast(caster, config.collision_filter);
    let right = right_ray.cast(caster, config.collision_filter);

    for (side, ray, hit) in [(ProbeSide::Left, left_ray, left), (ProbeSide::Right, right_ray, right)] {
        traces.push(ProbeTrace::new(
            ProbeKind::Ground(side),
            ray.origin,
            ray.direction,
            ray.length,
            hit.map(|h| h.point),
        ));
    }

    Some(ProbePair::new(left?, right?))
}

/// Side the wall override should probe for a travel signal, if any.
///
/// Left wins when both sides exceed the threshold, which can only happen
/// with a negative threshold.
pub fn wall_probe_side(signal: Vec2, pose: &BodyPose, threshold: f32) -> Option<ProbeSide> {
    let right = right_from_rotation(pose.rotation);
    if similarity(signal, -right) > threshold {
        Some(ProbeSide::Left)
    } else if similarity(signal, right) > threshold {
        Some(ProbeSide::Right)
    } else {
        None
    }
}

/// Replace one ground result with a horizontal wall probe hit.
///
/// `signal` is the input or velocity, per the configured [`WallSignal`](crate::config::WallSignal).
/// Returns the side that was overridden, if the wall probe hit.
pub fn apply_wall_override(
    caster: &impl ProbeCaster,
    pose: &BodyPose,
    signal: Vec2,
    config: &SurfaceConfig,
    probes: &mut ProbePair,
    traces: &mut Vec<ProbeTrace>,
) -> Option<ProbeSide> {
    let side = wall_probe_side(signal, pose, config.similarity_threshold)?;
    let ray = wall_probe_ray(pose, side, config);
    let hit = ray.cast(caster, config.collision_filter);

    traces.push(ProbeTrace::new(
        ProbeKind::Wall(side),
        ray.origin,
        ray.direction,
        ray.length,
        hit.map(|h| h.point),
    ));

    let hit = hit?;
    debug!("wall probe hit on {:?} side at {:?}", side, hit.point);
    probes.replace(side, hit);
    Some(side)
}

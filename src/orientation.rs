//! Orientation solver.
//!
//! Turns the two probe contacts into a target rotation and a flush
//! position. Rotation is rate limited per tick and small corrections are
//! suppressed so the body does not jitter when straddling two surfaces of
//! slightly different slope.

use std::f32::consts::PI;

use bevy::prelude::*;

use crate::config::SurfaceConfig;
use crate::geometry::{angle_between, from_to_rotation, rotate_towards, up_from_rotation};
use crate::probe::ProbePair;
use crate::walker::BodyPose;

/// Rotation used when the averaged normal gives no unique target: a half
/// turn, which puts the body upside down against a ceiling.
pub const DEGENERATE_FALLBACK_ROTATION: f32 = PI;

/// Result of one solver step.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct OrientationOutcome {
    /// Averaged contact normal (zero if the normals cancelled out).
    pub average_normal: Vec2,
    /// Midpoint of the two contacts.
    pub average_point: Vec2,
    /// Rotation the body is converging to.
    pub target_rotation: f32,
    /// Whether the target came from the degenerate fallback.
    pub degenerate: bool,
    /// Difference between the incoming rotation and the target.
    pub angle_difference: f32,
    /// Whether the rate-limited rotation was committed this tick.
    pub committed: bool,
    /// Whether the remaining correction still exceeds `min_angle`.
    pub is_rotating: bool,
}

/// Target rotation for a surface normal.
///
/// Returns the rotation mapping world up onto `normal`, and whether the
/// degenerate fallback was substituted.
pub fn target_rotation(normal: Vec2) -> (f32, bool) {
    match from_to_rotation(Vec2::Y, normal) {
        Some(rotation) => (rotation, false),
        None => (DEGENERATE_FALLBACK_ROTATION, true),
    }
}

/// Run the solver on `pose` and snap it onto the contacts.
///
/// The rotation is only written when the difference to the target exceeds
/// `min_angle`. The position is always written.
pub fn solve_orientation(probes: &ProbePair, pose: &mut BodyPose, config: &SurfaceConfig) -> OrientationOutcome {
    let average_normal = probes.average_normal();
    let average_point = probes.average_point();

    let (target, degenerate) = target_rotation(average_normal);
    if degenerate {
        debug!(
            "degenerate surface normal {:?}, using fallback rotation",
            average_normal
        );
    }

    let angle_difference = angle_between(pose.rotation, target);
    let committed = angle_difference > config.min_angle;
    if committed {
        pose.rotation = rotate_towards(pose.rotation, target, config.max_rotation_per_tick);
    }
    let is_rotating = angle_between(pose.rotation, target) > config.min_angle;

    pose.position = average_point + up_from_rotation(pose.rotation) * config.position_offset;

    trace!(
        "orientation: target={:.4} diff={:.4} committed={} rotating={}",
        target,
        angle_difference,
        committed,
        is_rotating
    );

    OrientationOutcome {
        average_normal,
        average_point,
        target_rotation: target,
        degenerate,
        angle_difference,
        committed,
        is_rotating,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeHit;
    use std::f32::consts::FRAC_PI_2;

    fn pair(left_normal: Vec2, left_point: Vec2, right_normal: Vec2, right_point: Vec2) -> ProbePair {
        ProbePair::new(
            ProbeHit::new(1.0, left_normal, left_point, None),
            ProbeHit::new(1.0, right_normal, right_point, None),
        )
    }

    fn flat(y: f32) -> ProbePair {
        pair(Vec2::Y, Vec2::new(-2.0, y), Vec2::Y, Vec2::new(2.0, y))
    }

    fn config() -> SurfaceConfig {
        SurfaceConfig::default().with_rotation(0.1, 0.01).with_position_offset(3.0)
    }

    // ==================== Target Rotation Tests ====================

    #[test]
    fn target_for_floor_is_upright() {
        let (rotation, degenerate) = target_rotation(Vec2::Y);
        assert!(rotation.abs() < 1e-6);
        assert!(!degenerate);
    }

    #[test]
    fn target_for_ceiling_uses_fallback() {
        assert_eq!(target_rotation(Vec2::NEG_Y), (DEGENERATE_FALLBACK_ROTATION, true));
        assert_eq!(target_rotation(Vec2::ZERO), (DEGENERATE_FALLBACK_ROTATION, true));
    }

    // ==================== Flat Ground Tests ====================

    #[test]
    fn flat_ground_keeps_unrotated_body() {
        let config = config();
        let mut pose = BodyPose::new(Vec2::new(0.0, 10.0), 0.0);
        let outcome = solve_orientation(&flat(-1.0), &mut pose, &config);

        assert_eq!(pose.rotation, 0.0);
        assert!(!outcome.is_rotating);
        assert!(!outcome.committed);
        assert!((pose.position.y - (-1.0 + config.position_offset)).abs() < 1e-5);
        assert!(pose.position.x.abs() < 1e-5);
    }

    #[test]
    fn already_at_target_is_idempotent() {
        let config = config();
        let probes = pair(Vec2::X, Vec2::new(0.0, -2.0), Vec2::X, Vec2::new(0.0, 2.0));
        let target = -FRAC_PI_2;
        let mut pose = BodyPose::new(Vec2::ZERO, target);

        let first = solve_orientation(&probes, &mut pose, &config);
        let after_first = pose;
        let second = solve_orientation(&probes, &mut pose, &config);

        assert_eq!(pose, after_first);
        assert_eq!(pose.rotation, target);
        assert!(!first.is_rotating && !second.is_rotating);
    }

    // ==================== Rate Limit Tests ====================

    #[test]
    fn rotation_is_rate_limited() {
        let config = config();
        let probes = pair(Vec2::X, Vec2::new(0.0, -2.0), Vec2::X, Vec2::new(0.0, 2.0));
        let mut pose = BodyPose::default();

        let outcome = solve_orientation(&probes, &mut pose, &config);

        assert!(outcome.committed);
        assert!(outcome.is_rotating);
        assert!((pose.rotation + 0.1).abs() < 1e-5);
    }

    #[test]
    fn rotation_converges_and_stops() {
        let config = config();
        let probes = pair(Vec2::X, Vec2::new(0.0, -2.0), Vec2::X, Vec2::new(0.0, 2.0));
        let mut pose = BodyPose::default();

        let mut ticks = 0;
        while solve_orientation(&probes, &mut pose, &config).is_rotating {
            ticks += 1;
            assert!(ticks < 100, "rotation never settled");
        }

        assert!((pose.rotation + FRAC_PI_2).abs() <= config.min_angle);
        // Standing on the wall: position sits off the wall along +X
        assert!((pose.position.x - config.position_offset).abs() < 0.05);
    }

    // ==================== Hysteresis Tests ====================

    #[test]
    fn hysteresis_boundary() {
        let config = config();
        let eps = 1e-3;
        let probes = flat(0.0);

        let mut below = BodyPose::new(Vec2::ZERO, config.min_angle - eps);
        let outcome = solve_orientation(&probes, &mut below, &config);
        assert!(!outcome.committed);
        assert_eq!(below.rotation, config.min_angle - eps);
        assert!(!outcome.is_rotating);

        let mut above = BodyPose::new(Vec2::ZERO, config.min_angle + eps);
        let outcome = solve_orientation(&probes, &mut above, &config);
        assert!(outcome.committed);
        assert!(above.rotation.abs() < 1e-6);
    }

    #[test]
    fn small_difference_still_repositions() {
        let config = config();
        let mut pose = BodyPose::new(Vec2::new(5.0, 50.0), config.min_angle * 0.5);
        solve_orientation(&flat(0.0), &mut pose, &config);

        let expected = up_from_rotation(pose.rotation) * config.position_offset;
        assert!((pose.position - expected).length() < 1e-5);
    }

    // ==================== Degenerate Tests ====================

    #[test]
    fn opposing_normals_use_fallback() {
        let config = config();
        let probes = pair(Vec2::Y, Vec2::new(-1.0, 0.0), Vec2::NEG_Y, Vec2::new(1.0, 0.0));
        let mut pose = BodyPose::default();

        let outcome = solve_orientation(&probes, &mut pose, &config);

        assert!(outcome.degenerate);
        assert_eq!(outcome.target_rotation, DEGENERATE_FALLBACK_ROTATION);
        assert_eq!(outcome.average_normal, Vec2::ZERO);
        assert!(pose.rotation.is_finite());
        assert!(pose.position.is_finite());
    }

    #[test]
    fn ceiling_rotation_converges_to_half_turn() {
        let config = config();
        let probes = pair(Vec2::NEG_Y, Vec2::new(-2.0, 5.0), Vec2::NEG_Y, Vec2::new(2.0, 5.0));
        let mut pose = BodyPose::default();

        for _ in 0..100 {
            solve_orientation(&probes, &mut pose, &config);
        }

        assert!(angle_between(pose.rotation, PI) <= config.min_angle);
        // Hanging below the ceiling
        assert!(pose.position.y < 5.0);
    }
}

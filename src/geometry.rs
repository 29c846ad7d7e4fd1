//! Geometry utilities.
//!
//! Pure 2D vector and rotation math shared by the sensors, the orientation
//! solver and the locomotion integrator. Rotations are angles in radians,
//! counter-clockwise, where `0.0` means the body's up axis is world `+Y`.

use std::f32::consts::{PI, TAU};

use bevy::prelude::*;

/// Tolerance used to decide that two unit vectors are exactly antiparallel.
const ANTIPARALLEL_EPSILON: f32 = 1e-6;

/// Direction-only alignment of two vectors, in `[-1, 1]`.
///
/// Both inputs are normalized first, so magnitude is ignored. If either
/// vector has zero length the result is `0.0` (neutral).
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use surface_walker::geometry::similarity;
///
/// assert!((similarity(Vec2::new(3.0, 0.0), Vec2::X) - 1.0).abs() < 1e-6);
/// assert_eq!(similarity(Vec2::ZERO, Vec2::Y), 0.0);
/// ```
#[inline]
pub fn similarity(a: Vec2, b: Vec2) -> f32 {
    let a = a.normalize_or_zero();
    let b = b.normalize_or_zero();
    a.dot(b).clamp(-1.0, 1.0)
}

/// Normalize an angle into `(-PI, PI]`.
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Signed shortest-arc delta that takes `from` onto `to`.
#[inline]
pub fn shortest_delta(from: f32, to: f32) -> f32 {
    wrap_angle(to - from)
}

/// Absolute shortest-arc difference between two rotations, in `[0, PI]`.
#[inline]
pub fn angle_between(a: f32, b: f32) -> f32 {
    shortest_delta(a, b).abs()
}

/// Advance `current` toward `target` by at most `max_delta` radians.
///
/// Follows the shortest arc and never overshoots: once the remaining
/// difference is within `max_delta` the exact `target` is returned.
/// A negative `max_delta` is treated as zero.
pub fn rotate_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let max_delta = max_delta.max(0.0);
    let delta = shortest_delta(current, target);
    if delta.abs() <= max_delta {
        wrap_angle(target)
    } else {
        wrap_angle(current + delta.signum() * max_delta)
    }
}

/// The body's up axis for a rotation.
#[inline]
pub fn up_from_rotation(rotation: f32) -> Vec2 {
    let (sin, cos) = rotation.sin_cos();
    Vec2::new(-sin, cos)
}

/// The body's right axis for a rotation.
#[inline]
pub fn right_from_rotation(rotation: f32) -> Vec2 {
    let (sin, cos) = rotation.sin_cos();
    Vec2::new(cos, sin)
}

/// Rotate a vector counter-clockwise by `angle` radians.
#[inline]
pub fn rotate_vec(vector: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(vector)
}

/// Rotation that maps direction `from` onto direction `to`.
///
/// Returns `None` when the mapping is degenerate: either vector has zero
/// length, or the two are exactly antiparallel so no unique shortest
/// rotation exists.
pub fn from_to_rotation(from: Vec2, to: Vec2) -> Option<f32> {
    let from = from.normalize_or_zero();
    let to = to.normalize_or_zero();
    if from == Vec2::ZERO || to == Vec2::ZERO {
        return None;
    }

    let cos = from.dot(to);
    let sin = from.perp_dot(to);
    if cos < 0.0 && sin.abs() <= ANTIPARALLEL_EPSILON {
        return None;
    }

    Some(sin.atan2(cos))
}

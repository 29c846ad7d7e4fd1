//! Locomotion integrator.
//!
//! Gravity toggling on vertical surfaces, the zero-input stop, and the two
//! drive policies. These functions work on a [`BodyState`] so the same
//! logic runs against a Bevy backend or a plain test harness.

use bevy::prelude::*;

use crate::config::{DrivePolicy, RotatingDrive, SurfaceConfig};
use crate::geometry::{right_from_rotation, similarity};
use crate::walker::{BodyPose, BodyState};

/// Gravity scale for a pose: `0.0` on vertical surfaces, `1.0` otherwise.
///
/// The body is on a vertical surface when its right axis points nearly
/// straight up or straight down.
pub fn gravity_scale_for(pose: &BodyPose, config: &SurfaceConfig) -> f32 {
    let right = right_from_rotation(pose.rotation);
    let sideways = similarity(right, Vec2::Y) > config.vertical_surface_threshold
        || similarity(-right, Vec2::Y) > config.vertical_surface_threshold;
    if sideways {
        0.0
    } else {
        1.0
    }
}

/// What the drive step did this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum DriveOutcome {
    /// Input was zero: velocity was zeroed.
    Stopped,
    /// Drive suppressed while the body rotates.
    Suppressed,
    /// Force applied (force-based policy).
    Forced,
    /// Velocity set from input (velocity-based policy).
    Steered,
    /// Velocity-based input pointed off the surface and was ignored.
    Blocked,
    /// Drive skipped because the body is airborne and ground is required.
    Airborne,
}

/// Force-based drive: accumulate `input * drive_speed` and clamp speed.
///
/// The clamp rescales velocity to exactly `max_speed` when its squared
/// magnitude exceeds `max_speed²`, preserving direction.
pub fn apply_force_drive(input: Vec2, body: &mut BodyState, config: &SurfaceConfig) {
    body.force += input * config.drive_speed;
    body.velocity = clamp_speed(body.velocity, config.max_speed);
}

/// Rescale `velocity` to `max_speed` if it is faster.
pub fn clamp_speed(velocity: Vec2, max_speed: f32) -> Vec2 {
    if velocity.length_squared() > max_speed * max_speed {
        velocity.normalize_or_zero() * max_speed
    } else {
        velocity
    }
}

/// Velocity-based drive: move along the input unless it points off the surface.
///
/// Returns `false` when the input was rejected by the surface check.
pub fn apply_velocity_drive(input: Vec2, surface_normal: Vec2, body: &mut BodyState, config: &SurfaceConfig) -> bool {
    if similarity(input, surface_normal) < config.similarity_threshold {
        body.velocity = input.normalize_or_zero() * config.drive_speed;
        true
    } else {
        false
    }
}

/// Run the stop/drive steps of the integrator.
///
/// `surface_normal` is the averaged normal of this tick, or the body's up
/// axis when airborne.
pub fn drive(
    input: Vec2,
    is_rotating: bool,
    grounded: bool,
    surface_normal: Vec2,
    body: &mut BodyState,
    config: &SurfaceConfig,
) -> DriveOutcome {
    if config.require_ground && !grounded {
        return DriveOutcome::Airborne;
    }

    if input == Vec2::ZERO {
        body.velocity = Vec2::ZERO;
        return DriveOutcome::Stopped;
    }

    if is_rotating {
        if config.rotating_drive == RotatingDrive::Halt {
            body.velocity = Vec2::ZERO;
        }
        return DriveOutcome::Suppressed;
    }

    match config.drive_policy {
        DrivePolicy::ForceBased => {
            apply_force_drive(input, body, config);
            DriveOutcome::Forced
        }
        DrivePolicy::VelocityBased => {
            if apply_velocity_drive(input, surface_normal, body, config) {
                DriveOutcome::Steered
            } else {
                DriveOutcome::Blocked
            }
        }
    }
}

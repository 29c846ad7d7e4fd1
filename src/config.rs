//! Controller configuration.
//!
//! This module defines the tuning parameters for surface walkers: probe
//! geometry, thresholds, rotation limits, drive speeds and the policy
//! choices that select between force- and velocity-based locomotion.

use std::f32::consts::PI;

use bevy::prelude::*;
use thiserror::Error;

use crate::probe::ProbeFilter;

/// How player input is turned into motion.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrivePolicy {
    /// Apply a force proportional to input along world axes, then clamp the
    /// resulting speed to `max_speed`.
    #[default]
    ForceBased,
    /// Set velocity directly to `normalize(input) * drive_speed`, unless the
    /// input points off the surface along its normal.
    VelocityBased,
}

/// Which signal decides the direction of the wall override probe.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WallSignal {
    /// The raw input vector of the current frame.
    #[default]
    Input,
    /// The body's current velocity.
    Velocity,
}

/// What happens to velocity while the body is still rotating onto a surface.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotatingDrive {
    /// Hold the body still until the rotation settles.
    #[default]
    Halt,
    /// Skip the drive and leave velocity to the physics backend.
    Coast,
}

/// Errors reported when a configuration cannot be used.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("`{field}` must be finite, got {value}")]
    NotFinite { field: &'static str, value: f32 },
    #[error("`{field}` must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("`{field}` must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },
    #[error("`{field}` must be a similarity in [-1, 1], got {value}")]
    SimilarityOutOfRange { field: &'static str, value: f32 },
    #[error("`ground_probe_inward_angle` must be within [0, PI/2), got {0}")]
    InwardAngleOutOfRange(f32),
}

/// Tuning parameters for a surface walker.
///
/// Loaded once when the walker is spawned and treated as immutable while the
/// simulation runs. Angles are in radians, lengths in world units.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct SurfaceConfig {
    // === Ground Probes ===
    /// Offset of all probe origins along the body's up axis.
    pub ground_probe_vertical_offset: f32,

    /// Half distance between the two ground probe origins along the right axis.
    pub ground_probe_lateral_spacing: f32,

    /// Tilt of each ground probe toward the body's centerline.
    pub ground_probe_inward_angle: f32,

    /// Length of the ground probes.
    pub ground_probe_length: f32,

    // === Wall Probe ===
    /// Lateral offset of the wall probe origin from the body center.
    pub wall_probe_lateral_offset: f32,

    /// Length of the wall probe.
    pub wall_probe_length: f32,

    // === Thresholds ===
    /// Similarity above which input (or velocity) counts as heading toward a side,
    /// and below which velocity drive is allowed against the surface normal.
    pub similarity_threshold: f32,

    /// Similarity between the right axis and world up above which the body is
    /// considered to be on a vertical surface (gravity is disabled).
    pub vertical_surface_threshold: f32,

    // === Rotation ===
    /// Maximum rotation applied in a single physics tick.
    pub max_rotation_per_tick: f32,

    /// Corrections at or below this angle are not committed, and the body
    /// stops counting as rotating once the remainder drops to it.
    pub min_angle: f32,

    /// Distance the body is held above the averaged contact point.
    pub position_offset: f32,

    // === Drive ===
    /// Force magnitude (force-based) or speed (velocity-based) at full input.
    pub drive_speed: f32,

    /// Speed clamp for force-based drive.
    pub max_speed: f32,

    // === Policies ===
    pub drive_policy: DrivePolicy,
    pub wall_signal: WallSignal,
    pub rotating_drive: RotatingDrive,

    /// Only stop and drive while both ground probes touch.
    pub require_ground: bool,

    /// Collision groups every probe is filtered by.
    pub collision_filter: ProbeFilter,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            ground_probe_vertical_offset: 0.0,
            ground_probe_lateral_spacing: 4.0,
            ground_probe_inward_angle: 20f32.to_radians(),
            ground_probe_length: 16.0,

            wall_probe_lateral_offset: 4.0,
            wall_probe_length: 10.0,

            similarity_threshold: 0.2,
            vertical_surface_threshold: 0.9,

            max_rotation_per_tick: 6f32.to_radians(),
            min_angle: 0.4f32.to_radians(),
            position_offset: 6.0,

            drive_speed: 400.0,
            max_speed: 120.0,

            drive_policy: DrivePolicy::ForceBased,
            wall_signal: WallSignal::Input,
            rotating_drive: RotatingDrive::Halt,
            require_ground: false,

            collision_filter: ProbeFilter::ALL,
        }
    }
}

impl SurfaceConfig {
    /// Player preset: velocity drive steered by input, walking only on ground.
    pub fn player() -> Self {
        Self {
            drive_policy: DrivePolicy::VelocityBased,
            wall_signal: WallSignal::Input,
            drive_speed: 90.0,
            require_ground: true,
            ..default()
        }
    }

    /// Crawler preset: force drive with wall detection following momentum.
    pub fn crawler() -> Self {
        Self {
            drive_policy: DrivePolicy::ForceBased,
            wall_signal: WallSignal::Velocity,
            rotating_drive: RotatingDrive::Coast,
            max_rotation_per_tick: 10f32.to_radians(),
            ..default()
        }
    }

    pub fn with_ground_probes(mut self, vertical_offset: f32, lateral_spacing: f32, length: f32) -> Self {
        self.ground_probe_vertical_offset = vertical_offset;
        self.ground_probe_lateral_spacing = lateral_spacing;
        self.ground_probe_length = length;
        self
    }

    pub fn with_inward_angle(mut self, angle: f32) -> Self {
        self.ground_probe_inward_angle = angle;
        self
    }

    pub fn with_wall_probe(mut self, lateral_offset: f32, length: f32) -> Self {
        self.wall_probe_lateral_offset = lateral_offset;
        self.wall_probe_length = length;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_vertical_surface_threshold(mut self, threshold: f32) -> Self {
        self.vertical_surface_threshold = threshold;
        self
    }

    /// Set the per-tick rotation limit and the hysteresis angle.
    pub fn with_rotation(mut self, max_per_tick: f32, min_angle: f32) -> Self {
        self.max_rotation_per_tick = max_per_tick;
        self.min_angle = min_angle;
        self
    }

    pub fn with_position_offset(mut self, offset: f32) -> Self {
        self.position_offset = offset;
        self
    }

    pub fn with_drive(mut self, drive_speed: f32, max_speed: f32) -> Self {
        self.drive_speed = drive_speed;
        self.max_speed = max_speed;
        self
    }

    pub fn with_drive_policy(mut self, policy: DrivePolicy) -> Self {
        self.drive_policy = policy;
        self
    }

    pub fn with_wall_signal(mut self, signal: WallSignal) -> Self {
        self.wall_signal = signal;
        self
    }

    pub fn with_rotating_drive(mut self, policy: RotatingDrive) -> Self {
        self.rotating_drive = policy;
        self
    }

    pub fn with_require_ground(mut self, require: bool) -> Self {
        self.require_ground = require;
        self
    }

    pub fn with_collision_filter(mut self, filter: ProbeFilter) -> Self {
        self.collision_filter = filter;
        self
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scalars = [
            ("ground_probe_vertical_offset", self.ground_probe_vertical_offset),
            ("ground_probe_lateral_spacing", self.ground_probe_lateral_spacing),
            ("ground_probe_inward_angle", self.ground_probe_inward_angle),
            ("ground_probe_length", self.ground_probe_length),
            ("wall_probe_lateral_offset", self.wall_probe_lateral_offset),
            ("wall_probe_length", self.wall_probe_length),
            ("similarity_threshold", self.similarity_threshold),
            ("vertical_surface_threshold", self.vertical_surface_threshold),
            ("max_rotation_per_tick", self.max_rotation_per_tick),
            ("min_angle", self.min_angle),
            ("position_offset", self.position_offset),
            ("drive_speed", self.drive_speed),
            ("max_speed", self.max_speed),
        ];
        for (field, value) in scalars {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field, value });
            }
        }

        for (field, value) in [
            ("ground_probe_length", self.ground_probe_length),
            ("wall_probe_length", self.wall_probe_length),
            ("max_rotation_per_tick", self.max_rotation_per_tick),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        for (field, value) in [
            ("ground_probe_lateral_spacing", self.ground_probe_lateral_spacing),
            ("wall_probe_lateral_offset", self.wall_probe_lateral_offset),
            ("min_angle", self.min_angle),
            ("drive_speed", self.drive_speed),
            ("max_speed", self.max_speed),
        ] {
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        for (field, value) in [
            ("similarity_threshold", self.similarity_threshold),
            ("vertical_surface_threshold", self.vertical_surface_threshold),
        ] {
            if !(-1.0..=1.0).contains(&value) {
                return Err(ConfigError::SimilarityOutOfRange { field, value });
            }
        }

        if !(0.0..PI / 2.0).contains(&self.ground_probe_inward_angle) {
            return Err(ConfigError::InwardAngleOutOfRange(self.ground_probe_inward_angle));
        }

        Ok(())
    }

    /// Validate and return the configuration.
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate().map(|()| self)
    }
}

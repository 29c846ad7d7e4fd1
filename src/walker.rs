//! The surface walker component and its tick pipeline.
//!
//! [`SurfaceWalker`] carries the state that lives between a frame's input
//! sample and the next physics tick. The tick itself runs against a
//! [`BodyState`] passed by reference, so the same pipeline drives a Bevy
//! entity or a plain struct in a test.

use bevy::prelude::*;

use crate::config::{SurfaceConfig, WallSignal};
use crate::geometry::{right_from_rotation, up_from_rotation};
use crate::locomotion::{self, DriveOutcome};
use crate::orientation::{self, OrientationOutcome};
use crate::probe::{ProbeKind, ProbePair, ProbeSide, ProbeTrace};
use crate::sensor::{self, ProbeCaster};

/// Position and rotation of a body.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyPose {
    pub position: Vec2,
    /// Radians, counter-clockwise, `0.0` = upright.
    pub rotation: f32,
}

impl BodyPose {
    pub fn new(position: Vec2, rotation: f32) -> Self {
        Self { position, rotation }
    }

    /// Read the pose of a 2D transform.
    pub fn from_transform(transform: &Transform) -> Self {
        let (_, _, z) = transform.rotation.to_euler(EulerRot::XYZ);
        Self {
            position: transform.translation.truncate(),
            rotation: z,
        }
    }

    /// Write this pose into a transform, keeping its depth and scale.
    pub fn write_to(&self, transform: &mut Transform) {
        transform.translation.x = self.position.x;
        transform.translation.y = self.position.y;
        transform.rotation = Quat::from_rotation_z(self.rotation);
    }

    #[inline]
    pub fn up(&self) -> Vec2 {
        up_from_rotation(self.rotation)
    }

    #[inline]
    pub fn right(&self) -> Vec2 {
        right_from_rotation(self.rotation)
    }
}

/// Tick-scoped physical state of a body.
///
/// Read from the physics backend before a tick and written back after it.
/// `force` accumulates the force applied during the tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub pose: BodyPose,
    pub velocity: Vec2,
    pub gravity_scale: f32,
    pub force: Vec2,
}

impl Default for BodyState {
    fn default() -> Self {
        Self {
            pose: BodyPose::default(),
            velocity: Vec2::ZERO,
            gravity_scale: 1.0,
            force: Vec2::ZERO,
        }
    }
}

impl BodyState {
    pub fn at(position: Vec2, rotation: f32) -> Self {
        Self {
            pose: BodyPose::new(position, rotation),
            ..default()
        }
    }
}

/// Summary of one physics tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub gravity_scale: f32,
    pub grounded: bool,
    pub wall_override: Option<ProbeSide>,
    pub orientation: Option<OrientationOutcome>,
    pub drive: DriveOutcome,
}

/// Surface-following controller state.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use surface_walker::prelude::*;
///
/// let world = SegmentWorld::from_segments([Segment::new(Vec2::new(-50.0, 0.0), Vec2::new(50.0, 0.0))]);
/// let config = SurfaceConfig::default();
/// let mut walker = SurfaceWalker::new();
/// let mut body = BodyState::at(Vec2::new(0.0, 8.0), 0.0);
///
/// walker.on_frame(Vec2::X);
/// let report = walker.on_fixed_tick(&world, &mut body, &config);
///
/// assert!(report.grounded);
/// assert!((body.pose.position.y - config.position_offset).abs() < 1e-4);
/// ```
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct SurfaceWalker {
    input: Vec2,
    probes: Option<ProbePair>,
    is_rotating: bool,
    surface_normal: Option<Vec2>,
    wall_override: Option<ProbeSide>,
    orientation: Option<OrientationOutcome>,
    traces: Vec<ProbeTrace>,
}

impl SurfaceWalker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame step: store the latest input sample, each axis clamped to `[-1, 1]`.
    pub fn on_frame(&mut self, input: Vec2) {
        self.input = input.clamp(Vec2::NEG_ONE, Vec2::ONE);
    }

    /// Physics step: gravity toggle, sensing, orientation and drive, in that order.
    pub fn on_fixed_tick(&mut self, caster: &impl ProbeCaster, body: &mut BodyState, config: &SurfaceConfig) -> TickReport {
        body.gravity_scale = locomotion::gravity_scale_for(&body.pose, config);

        self.sense(caster, &body.pose, body.velocity, config);
        let orientation = self.orient(&mut body.pose, config);
        let drive = self.drive(body, config);

        TickReport {
            gravity_scale: body.gravity_scale,
            grounded: self.is_grounded(),
            wall_override: self.wall_override,
            orientation,
            drive,
        }
    }

    /// Run the ground sensor and, on success, the wall override.
    ///
    /// Clears the previous tick's probe state and traces.
    pub fn sense(
        &mut self,
        caster: &impl ProbeCaster,
        pose: &BodyPose,
        velocity: Vec2,
        config: &SurfaceConfig,
    ) -> Option<ProbePair> {
        let was_grounded = self.is_grounded();
        self.traces.clear();
        self.wall_override = None;

        let mut probes = sensor::cast_ground_probes(caster, pose, config, &mut self.traces);
        if let Some(pair) = probes.as_mut() {
            let signal = match config.wall_signal {
                WallSignal::Input => self.input,
                WallSignal::Velocity => velocity,
            };
            self.wall_override = sensor::apply_wall_override(caster, pose, signal, config, pair, &mut self.traces);
        }

        self.probes = probes;
        match (was_grounded, self.is_grounded()) {
            (false, true) => debug!("surface contact acquired at {:?}", pose.position),
            (true, false) => debug!("surface contact lost at {:?}", pose.position),
            _ => {}
        }
        probes
    }

    /// Run the orientation solver on the sensed probes.
    ///
    /// Without ground contact the pose is left to the physics backend and
    /// the body stops counting as rotating.
    pub fn orient(&mut self, pose: &mut BodyPose, config: &SurfaceConfig) -> Option<OrientationOutcome> {
        let Some(probes) = self.probes else {
            self.is_rotating = false;
            self.surface_normal = None;
            self.orientation = None;
            return None;
        };

        let outcome = orientation::solve_orientation(&probes, pose, config);
        self.is_rotating = outcome.is_rotating;
        self.surface_normal = Some(outcome.average_normal);
        self.orientation = Some(outcome);
        self.traces.push(ProbeTrace::new(
            ProbeKind::AverageNormal,
            outcome.average_point,
            outcome.average_normal,
            1.0,
            None,
        ));
        Some(outcome)
    }

    /// Run the stop/drive step against the body.
    ///
    /// A grounded walker checks input against the averaged normal as is,
    /// even when it is zero; an airborne one uses its up axis.
    pub fn drive(&self, body: &mut BodyState, config: &SurfaceConfig) -> DriveOutcome {
        let surface_normal = match (self.is_grounded(), self.surface_normal) {
            (true, Some(normal)) => normal,
            _ => body.pose.up(),
        };
        locomotion::drive(self.input, self.is_rotating, self.is_grounded(), surface_normal, body, config)
    }

    /// Latest input sample.
    pub fn input(&self) -> Vec2 {
        self.input
    }

    /// Probe results of the last tick, if both ground probes hit.
    pub fn probes(&self) -> Option<&ProbePair> {
        self.probes.as_ref()
    }

    /// Whether both ground probes hit on the last tick.
    pub fn is_grounded(&self) -> bool {
        self.probes.is_some()
    }

    /// Whether the body is still converging onto the surface.
    pub fn is_rotating(&self) -> bool {
        self.is_rotating
    }

    /// Averaged surface normal of the last grounded tick.
    pub fn surface_normal(&self) -> Option<Vec2> {
        self.surface_normal
    }

    /// Side replaced by the wall probe on the last tick.
    pub fn wall_override(&self) -> Option<ProbeSide> {
        self.wall_override
    }

    /// Solver result of the last grounded tick.
    pub fn orientation(&self) -> Option<&OrientationOutcome> {
        self.orientation.as_ref()
    }

    /// Casts of the last tick, for debug drawing.
    pub fn traces(&self) -> &[ProbeTrace] {
        &self.traces
    }
}

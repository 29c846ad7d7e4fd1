//! # `surface_walker`
//!
//! A 2D surface-following locomotion controller with physics backend abstraction.
//!
//! A walker sticks to arbitrary terrain, including walls and ceilings:
//! - Two angled ground probes sense the surface under the body
//! - A wall probe takes over when the body heads into a wall
//! - The body rotates toward the averaged surface normal at a bounded rate
//!   and snaps to a fixed offset above the contact
//! - Input drives the body along the surface by force or by velocity
//! - Gravity switches off while the body stands on a vertical surface
//!
//! ## Architecture
//!
//! Each entity runs two steps:
//! 1. Once per frame (`Update`), the latest directional input is sampled
//! 2. Once per physics tick (`FixedUpdate`), the sensors, the orientation
//!    solver and the locomotion integrator run in that order
//!
//! The same pipeline is available without Bevy scheduling through
//! [`SurfaceWalker::on_frame`](walker::SurfaceWalker::on_frame) and
//! [`SurfaceWalker::on_fixed_tick`](walker::SurfaceWalker::on_fixed_tick).
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use surface_walker::prelude::*;
//!
//! let mut world = SegmentWorld::default();
//! world.add_box(Vec2::new(0.0, -10.0), Vec2::new(100.0, 10.0));
//!
//! let config = SurfaceConfig::crawler();
//! let mut walker = SurfaceWalker::new();
//! let mut body = BodyState::at(Vec2::new(0.0, 10.0), 0.0);
//!
//! walker.on_frame(Vec2::X);
//! let report = walker.on_fixed_tick(&world, &mut body, &config);
//! assert!(report.grounded);
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod config;
pub mod debug;
pub mod geometry;
pub mod input;
pub mod locomotion;
pub mod orientation;
pub mod probe;
pub mod segment;
pub mod sensor;
pub mod systems;
pub mod walker;

#[cfg(feature = "rapier2d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::SurfacePhysicsBackend;
    pub use crate::config::{ConfigError, DrivePolicy, RotatingDrive, SurfaceConfig, WallSignal};
    pub use crate::debug::{SurfaceWalkerDebug, SurfaceWalkerDebugPlugin};
    pub use crate::input::{AxisSource, InputAxis, KeyboardControlled};
    pub use crate::locomotion::DriveOutcome;
    pub use crate::orientation::OrientationOutcome;
    pub use crate::probe::{ProbeFilter, ProbeHit, ProbePair, ProbeSide};
    pub use crate::segment::{Segment, SegmentBackend, SegmentWorld, SimulatedBody};
    pub use crate::sensor::ProbeCaster;
    pub use crate::walker::{BodyPose, BodyState, SurfaceWalker, TickReport};
    pub use crate::{SurfaceWalkerPlugin, SurfaceWalkerSet};

    #[cfg(feature = "rapier2d")]
    pub use crate::rapier::{Rapier2dBackend, Rapier2dSurfaceBundle};
}

/// Stages of the fixed tick, run in declaration order.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SurfaceWalkerSet {
    /// Validate new configurations, toggle gravity, reset backend state.
    Preparation,
    /// Ground and wall probes (added by the backend plugin).
    Sensors,
    /// Rotate and snap grounded walkers.
    Orientation,
    /// Stop or drive.
    Locomotion,
    /// Hand accumulated results to the physics engine.
    FinalApplication,
}

/// Main plugin for the surface walker.
///
/// This plugin is generic over a physics backend `B` which provides the actual
/// physics operations (raycasting, force application, etc.).
///
/// # Examples
///
/// With Rapier2D backend:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use surface_walker::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(SurfaceWalkerPlugin::<Rapier2dBackend>::default())
///     .run();
/// ```
pub struct SurfaceWalkerPlugin<B: backend::SurfacePhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::SurfacePhysicsBackend> Default for SurfaceWalkerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::SurfacePhysicsBackend> Plugin for SurfaceWalkerPlugin<B> {
    fn build(&self, app: &mut App) {
        app.register_type::<config::SurfaceConfig>();
        app.register_type::<walker::SurfaceWalker>();
        app.register_type::<input::KeyboardControlled>();

        app.add_plugins(B::plugin());

        app.configure_sets(
            FixedUpdate,
            (
                SurfaceWalkerSet::Preparation,
                SurfaceWalkerSet::Sensors,
                SurfaceWalkerSet::Orientation,
                SurfaceWalkerSet::Locomotion,
                SurfaceWalkerSet::FinalApplication,
            )
                .chain(),
        );

        app.add_systems(
            FixedUpdate,
            (
                systems::validate_new_configs,
                systems::update_gravity_scale::<B>,
            )
                .chain()
                .in_set(SurfaceWalkerSet::Preparation),
        );
        app.add_systems(
            FixedUpdate,
            systems::apply_surface_orientation.in_set(SurfaceWalkerSet::Orientation),
        );
        app.add_systems(
            FixedUpdate,
            systems::apply_surface_drive::<B>.in_set(SurfaceWalkerSet::Locomotion),
        );

        app.add_systems(Update, input::sample_keyboard_input);
    }
}

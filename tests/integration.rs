//! Integration tests for the surface walker.
//!
//! These tests run the full plugin in a headless app on the deterministic
//! segment backend. Each test produces PROOF through explicit pose and
//! velocity checks.

use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;
use surface_walker::prelude::*;

/// Create a minimal test app with the segment backend and no gravity.
fn create_test_app() -> App {
    let mut app = App::new();

    app.add_plugins(MinimalPlugins);
    app.add_plugins(SurfaceWalkerPlugin::<SegmentBackend>::default());
    app.insert_resource(Time::<Fixed>::from_hz(60.0));

    app.finish();
    app.cleanup();
    app
}

/// Replace the collision geometry.
fn set_world(app: &mut App, world: SegmentWorld) {
    app.insert_resource(world);
}

/// A long floor at y = 0.
fn floor() -> SegmentWorld {
    SegmentWorld::from_segments([Segment::new(Vec2::new(-1000.0, 0.0), Vec2::new(1000.0, 0.0))])
}

/// Spawn a walker with a pose and config.
fn spawn_walker(app: &mut App, position: Vec2, rotation: f32, config: SurfaceConfig) -> Entity {
    app.world_mut()
        .spawn((
            Transform::from_translation(position.extend(0.0)).with_rotation(Quat::from_rotation_z(rotation)),
            config,
            SurfaceWalker::new(),
            SimulatedBody::default(),
        ))
        .id()
}

/// Run one fixed tick.
fn tick(app: &mut App) {
    app.world_mut().run_schedule(FixedUpdate);
}

fn run_ticks(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        tick(app);
    }
}

fn pose(app: &App, entity: Entity) -> BodyPose {
    BodyPose::from_transform(app.world().get::<Transform>(entity).unwrap())
}

fn body(app: &App, entity: Entity) -> SimulatedBody {
    *app.world().get::<SimulatedBody>(entity).unwrap()
}

fn walker(app: &App, entity: Entity) -> &SurfaceWalker {
    app.world().get::<SurfaceWalker>(entity).unwrap()
}

fn set_input(app: &mut App, entity: Entity, input: Vec2) {
    if let Some(mut walker) = app.world_mut().get_mut::<SurfaceWalker>(entity) {
        walker.on_frame(input);
    }
}

// ==================== Ground Sensing Tests ====================

mod ground_sensing {
    use super::*;

    #[test]
    fn walker_above_floor_is_grounded() {
        let mut app = create_test_app();
        set_world(&mut app, floor());
        let entity = spawn_walker(&mut app, Vec2::new(0.0, 10.0), 0.0, SurfaceConfig::default());

        tick(&mut app);

        let walker = walker(&app, entity);
        println!(
            "PROOF: grounded={}, normal={:?}, traces={}",
            walker.is_grounded(),
            walker.surface_normal(),
            walker.traces().len()
        );
        assert!(walker.is_grounded(), "Both probes should reach the floor");
        assert_eq!(walker.surface_normal(), Some(Vec2::Y));
    }

    #[test]
    fn walker_high_above_floor_is_airborne() {
        let mut app = create_test_app();
        set_world(&mut app, floor());
        let entity = spawn_walker(&mut app, Vec2::new(0.0, 200.0), 0.0, SurfaceConfig::default());

        tick(&mut app);

        assert!(!walker(&app, entity).is_grounded());
        assert!(walker(&app, entity).probes().is_none());
    }

    #[test]
    fn walker_at_edge_with_one_probe_is_airborne() {
        let mut app = create_test_app();
        // Floor ends right under the walker: only the right probe hits
        set_world(
            &mut app,
            SegmentWorld::from_segments([Segment::new(Vec2::new(-100.0, 0.0), Vec2::new(0.5, 0.0))]),
        );
        let entity = spawn_walker(&mut app, Vec2::new(0.0, 20.0), 0.0, SurfaceConfig::default().with_ground_probes(0.0, 4.0, 30.0));

        tick(&mut app);

        assert!(!walker(&app, entity).is_grounded());
    }

    #[test]
    fn filtered_geometry_is_ignored() {
        let mut app = create_test_app();
        set_world(
            &mut app,
            SegmentWorld::from_segments([
                Segment::new(Vec2::new(-1000.0, 0.0), Vec2::new(1000.0, 0.0)).with_groups(0b10, u32::MAX)
            ]),
        );
        let config = SurfaceConfig::default().with_collision_filter(ProbeFilter::new(u32::MAX, 0b01));
        let entity = spawn_walker(&mut app, Vec2::new(0.0, 10.0), 0.0, config);

        tick(&mut app);

        assert!(!walker(&app, entity).is_grounded());
    }
}

// ==================== Orientation Tests ====================

mod orientation {
    use super::*;

    #[test]
    fn flat_ground_snaps_to_offset() {
        let mut app = create_test_app();
        set_world(&mut app, floor());
        let config = SurfaceConfig::default();
        let entity = spawn_walker(&mut app, Vec2::new(0.0, 10.0), 0.0, config);

        tick(&mut app);

        let pose = pose(&app, entity);
        println!("PROOF: position={:?}, rotation={}", pose.position, pose.rotation);
        assert!((pose.position.y - config.position_offset).abs() < 1e-4);
        assert!(pose.rotation.abs() < 1e-6);
        assert!(!walker(&app, entity).is_rotating());
    }

    #[test]
    fn tilted_walker_rotates_at_bounded_rate() {
        let mut app = create_test_app();
        set_world(&mut app, floor());
        let config = SurfaceConfig::default();
        let entity = spawn_walker(&mut app, Vec2::new(0.0, 8.0), 0.3, config);

        tick(&mut app);

        let rotation = pose(&app, entity).rotation;
        println!("PROOF: rotation after one tick={rotation}");
        assert!((rotation - (0.3 - config.max_rotation_per_tick)).abs() < 1e-4);
        assert!(walker(&app, entity).is_rotating());

        run_ticks(&mut app, 10);
        assert!(pose(&app, entity).rotation.abs() < 1e-4, "Rotation should settle upright");
        assert!(!walker(&app, entity).is_rotating());
    }

    #[test]
    fn wall_ahead_starts_climb() {
        let mut app = create_test_app();
        let mut world = floor();
        world.segments.push(Segment::new(Vec2::new(12.0, -100.0), Vec2::new(12.0, 100.0)));
        set_world(&mut app, world);
        let config = SurfaceConfig::default();
        let entity = spawn_walker(&mut app, Vec2::new(0.0, 6.0), 0.0, config);
        set_input(&mut app, entity, Vec2::X);

        tick(&mut app);

        let walker = walker(&app, entity);
        let rotation = pose(&app, entity).rotation;
        println!(
            "PROOF: wall_override={:?}, rotation={}, normal={:?}",
            walker.wall_override(),
            rotation,
            walker.surface_normal()
        );
        assert_eq!(walker.wall_override(), Some(ProbeSide::Right));
        assert!((rotation - config.max_rotation_per_tick).abs() < 1e-4, "Should turn toward the wall");
        assert!(walker.is_rotating());
    }
}

// ==================== Locomotion Tests ====================

mod locomotion {
    use super::*;

    #[test]
    fn zero_input_stops_body() {
        let mut app = create_test_app();
        set_world(&mut app, floor());
        let entity = spawn_walker(&mut app, Vec2::new(0.0, 6.0), 0.0, SurfaceConfig::default());
        app.world_mut().get_mut::<SimulatedBody>(entity).unwrap().velocity = Vec2::new(50.0, 10.0);

        tick(&mut app);

        let body = body(&app, entity);
        println!("PROOF: velocity={:?}", body.velocity);
        assert_eq!(body.velocity, Vec2::ZERO);
    }

    #[test]
    fn force_drive_moves_along_floor() {
        let mut app = create_test_app();
        set_world(&mut app, floor());
        let config = SurfaceConfig::default();
        let entity = spawn_walker(&mut app, Vec2::new(0.0, 6.0), 0.0, config);
        set_input(&mut app, entity, Vec2::X);

        run_ticks(&mut app, 60);

        let body = body(&app, entity);
        let pose = pose(&app, entity);
        println!("PROOF: position={:?}, velocity={:?}", pose.position, body.velocity);
        assert!(pose.position.x > 10.0, "Walker should have moved right");
        assert!((pose.position.y - config.position_offset).abs() < 1e-3);

        // Velocity is clamped before this tick's force is integrated
        let dt = 1.0 / 60.0;
        assert!(body.velocity.length() <= config.max_speed + config.drive_speed * dt + 1e-3);
    }

    #[test]
    fn velocity_drive_sets_velocity() {
        let mut app = create_test_app();
        set_world(&mut app, floor());
        let config = SurfaceConfig::player();
        let entity = spawn_walker(&mut app, Vec2::new(0.0, 6.0), 0.0, config);
        set_input(&mut app, entity, Vec2::NEG_X);

        tick(&mut app);

        assert_eq!(body(&app, entity).velocity, Vec2::new(-config.drive_speed, 0.0));
    }
}

// ==================== Gravity Tests ====================

mod gravity {
    use super::*;

    #[test]
    fn vertical_pose_disables_gravity() {
        let mut app = create_test_app();
        set_world(&mut app, SegmentWorld::default().with_gravity(Vec2::new(0.0, -980.0)));
        let entity = spawn_walker(&mut app, Vec2::ZERO, FRAC_PI_2, SurfaceConfig::default());

        tick(&mut app);

        let body = body(&app, entity);
        println!("PROOF: gravity_scale={}, velocity={:?}", body.gravity_scale, body.velocity);
        assert_eq!(body.gravity_scale, 0.0);
        assert_eq!(body.velocity, Vec2::ZERO);
    }

    #[test]
    fn upright_airborne_walker_falls() {
        let mut app = create_test_app();
        set_world(&mut app, SegmentWorld::default().with_gravity(Vec2::new(0.0, -980.0)));
        let config = SurfaceConfig::default().with_require_ground(true);
        let entity = spawn_walker(&mut app, Vec2::new(0.0, 100.0), 0.0, config);

        run_ticks(&mut app, 10);

        let body = body(&app, entity);
        println!("PROOF: gravity_scale={}, velocity={:?}", body.gravity_scale, body.velocity);
        assert_eq!(body.gravity_scale, 1.0);
        assert!(body.velocity.y < -100.0);
        assert!(pose(&app, entity).position.y < 100.0);
    }

    #[test]
    fn walker_stays_on_floor_under_gravity() {
        let mut app = create_test_app();
        set_world(&mut app, floor().with_gravity(Vec2::new(0.0, -980.0)));
        let config = SurfaceConfig::default();
        let entity = spawn_walker(&mut app, Vec2::new(0.0, 6.0), 0.0, config);

        run_ticks(&mut app, 120);

        let y = pose(&app, entity).position.y;
        println!("PROOF: y after 120 ticks={y}");
        assert!(walker(&app, entity).is_grounded());
        assert!((y - config.position_offset).abs() < 1.0);
    }
}

// ==================== Configuration Tests ====================

mod configuration {
    use super::*;

    #[test]
    fn invalid_config_disables_walker() {
        let mut app = create_test_app();
        set_world(&mut app, floor());
        let entity = spawn_walker(
            &mut app,
            Vec2::new(0.0, 10.0),
            0.0,
            SurfaceConfig::default().with_ground_probes(0.0, 4.0, -1.0),
        );

        tick(&mut app);

        assert!(app.world().get::<SurfaceWalker>(entity).is_none());
        // The body is no longer snapped
        assert_eq!(pose(&app, entity).position, Vec2::new(0.0, 10.0));
    }
}

// ==================== Input Tests ====================

mod input {
    use super::*;

    #[test]
    fn keyboard_is_sampled_each_frame() {
        let mut app = create_test_app();
        let mut keys = ButtonInput::<KeyCode>::default();
        keys.press(KeyCode::KeyA);
        keys.press(KeyCode::KeyW);
        app.insert_resource(keys);

        let controlled = spawn_walker(&mut app, Vec2::ZERO, 0.0, SurfaceConfig::default());
        app.world_mut().entity_mut(controlled).insert(KeyboardControlled);
        let other = spawn_walker(&mut app, Vec2::ZERO, 0.0, SurfaceConfig::default());

        app.update();

        println!("PROOF: input={:?}", walker(&app, controlled).input());
        assert_eq!(walker(&app, controlled).input(), Vec2::new(-1.0, 1.0));
        assert_eq!(walker(&app, other).input(), Vec2::ZERO);
    }
}

//! Gizmo overlay of the walker's probes.
//!
//! Purely observational: reads the traces recorded during the last tick
//! and never touches walker state. Requires Bevy's gizmo plugin, which
//! `DefaultPlugins` includes.

use bevy::prelude::*;

use crate::probe::{ProbeKind, ProbeSide, ProbeTrace};
use crate::walker::SurfaceWalker;

/// Debug overlay settings.
#[derive(Resource, Reflect, Debug, Clone)]
#[reflect(Resource)]
pub struct SurfaceWalkerDebug {
    pub enabled: bool,
    /// Drawn length of the averaged surface normal.
    pub normal_length: f32,
    /// Radius of the marker drawn at each probe hit. Zero disables markers.
    pub hit_marker_radius: f32,
}

impl Default for SurfaceWalkerDebug {
    fn default() -> Self {
        Self {
            enabled: true,
            normal_length: 12.0,
            hit_marker_radius: 1.0,
        }
    }
}

/// Plugin drawing every walker's probe traces.
#[derive(Default)]
pub struct SurfaceWalkerDebugPlugin;

impl Plugin for SurfaceWalkerDebugPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<SurfaceWalkerDebug>();
        app.init_resource::<SurfaceWalkerDebug>();
        app.add_systems(Update, draw_probe_traces);
    }
}

/// Color of a trace: red/blue for the left/right ground probe, black for
/// the wall probe, green for the averaged normal.
pub fn trace_color(kind: ProbeKind) -> Color {
    match kind {
        ProbeKind::Ground(ProbeSide::Left) => Color::srgb(1.0, 0.0, 0.0),
        ProbeKind::Ground(ProbeSide::Right) => Color::srgb(0.0, 0.0, 1.0),
        ProbeKind::Wall(_) => Color::BLACK,
        ProbeKind::AverageNormal => Color::srgb(0.0, 1.0, 0.0),
    }
}

/// End point of a trace as drawn.
pub fn trace_end(trace: &ProbeTrace, settings: &SurfaceWalkerDebug) -> Vec2 {
    match trace.kind {
        ProbeKind::AverageNormal => trace.origin + trace.ray * settings.normal_length,
        _ => trace.end(),
    }
}

fn draw_probe_traces(settings: Res<SurfaceWalkerDebug>, q_walkers: Query<&SurfaceWalker>, mut gizmos: Gizmos) {
    if !settings.enabled {
        return;
    }

    for walker in &q_walkers {
        for trace in walker.traces() {
            let color = trace_color(trace.kind);
            gizmos.line_2d(trace.origin, trace_end(trace, &settings), color);

            if let Some(hit) = trace.hit {
                if settings.hit_marker_radius > 0.0 {
                    gizmos.circle_2d(hit, settings.hit_marker_radius, color);
                }
            }
        }
    }
}

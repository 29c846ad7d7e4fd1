//! Directional input.
//!
//! Input reaches the walker as a two-axis sample taken once per frame.
//! Anything that can report an axis value implements [`AxisSource`]; the
//! keyboard does so out of the box.

use bevy::prelude::*;

use crate::walker::SurfaceWalker;

/// One of the two input axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum InputAxis {
    /// Negative = left, positive = right.
    Horizontal,
    /// Negative = down, positive = up.
    Vertical,
}

/// Something that can be polled for an axis value.
pub trait AxisSource {
    /// Current value of `axis` in `[-1, 1]`.
    fn poll_axis(&self, axis: InputAxis) -> f32;
}

/// Poll both axes of a source into an input vector.
pub fn sample_input(source: &impl AxisSource) -> Vec2 {
    Vec2::new(
        source.poll_axis(InputAxis::Horizontal),
        source.poll_axis(InputAxis::Vertical),
    )
    .clamp(Vec2::NEG_ONE, Vec2::ONE)
}

/// Raw digital axes: A/D or Left/Right, W/S or Up/Down.
///
/// Opposing keys cancel out.
impl AxisSource for ButtonInput<KeyCode> {
    fn poll_axis(&self, axis: InputAxis) -> f32 {
        let (negative, positive) = match axis {
            InputAxis::Horizontal => (
                [KeyCode::KeyA, KeyCode::ArrowLeft],
                [KeyCode::KeyD, KeyCode::ArrowRight],
            ),
            InputAxis::Vertical => (
                [KeyCode::KeyS, KeyCode::ArrowDown],
                [KeyCode::KeyW, KeyCode::ArrowUp],
            ),
        };

        let mut value = 0.0;
        if self.any_pressed(negative) {
            value -= 1.0;
        }
        if self.any_pressed(positive) {
            value += 1.0;
        }
        value
    }
}

/// Marker for walkers driven by the keyboard.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct KeyboardControlled;

/// Sample the keyboard into every [`KeyboardControlled`] walker.
///
/// Does nothing when no keyboard input resource exists (headless apps).
pub fn sample_keyboard_input(
    keyboard: Option<Res<ButtonInput<KeyCode>>>,
    mut q_walkers: Query<&mut SurfaceWalker, With<KeyboardControlled>>,
) {
    let Some(keyboard) = keyboard else {
        return;
    };

    let input = sample_input(keyboard.as_ref());
    for mut walker in &mut q_walkers {
        walker.on_frame(input);
    }
}

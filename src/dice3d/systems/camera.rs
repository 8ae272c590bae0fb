//! Camera control systems
//!
//! Left-drag orbits around the tray, the wheel zooms.

use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll, MouseScrollUnit};
use bevy::prelude::*;

use crate::dice3d::types::*;

const ORBIT_SPEED: f32 = 0.005;
const ZOOM_STEP: f32 = 0.1;

/// Update the rig from mouse input.
pub fn orbit_camera(
    buttons: Res<ButtonInput<MouseButton>>,
    motion: Res<AccumulatedMouseMotion>,
    scroll: Res<AccumulatedMouseScroll>,
    mut rig: ResMut<CameraRig>,
) {
    if buttons.pressed(MouseButton::Left) && motion.delta != Vec2::ZERO {
        rig.orbit(-motion.delta.x * ORBIT_SPEED, -motion.delta.y * ORBIT_SPEED);
    }

    let lines = match scroll.unit {
        MouseScrollUnit::Line => scroll.delta.y,
        MouseScrollUnit::Pixel => scroll.delta.y / 40.0,
    };
    if lines != 0.0 {
        rig.zoom((1.0 - ZOOM_STEP).powf(lines));
    }
}

/// Move the camera when the rig changed.
pub fn apply_camera_rig(
    rig: Res<CameraRig>,
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
) {
    if !rig.is_changed() {
        return;
    }

    for mut transform in camera_query.iter_mut() {
        *transform = rig.transform();
    }
}

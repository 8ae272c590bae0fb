//! Physics world configuration

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

/// Dice fall at twice earth gravity so rolls finish briskly.
pub const TRAY_GRAVITY: Vec3 = Vec3::new(0.0, -9.81 * 2.0, 0.0);

/// Apply the tray gravity to any physics context that appears.
pub fn apply_tray_gravity(mut configs: Query<&mut RapierConfiguration, Added<RapierConfiguration>>) {
    for mut config in configs.iter_mut() {
        config.gravity = TRAY_GRAVITY;
    }
}

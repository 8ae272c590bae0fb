//! Camera-related types and components
//!
//! This module contains the main camera marker and the orbit rig state.

use bevy::prelude::*;

/// Marker component for the main 3D camera
#[derive(Component)]
pub struct MainCamera;

/// Orbit camera around the tray center.
///
/// `pitch` is the polar angle measured from straight up.
#[derive(Resource, Debug, Clone, Copy)]
pub struct CameraRig {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub min_pitch: f32,
    pub max_pitch: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        // Roughly (0, 6.7, 5.3): looking down across the long side of the tray.
        Self {
            yaw: 0.0,
            pitch: 0.67,
            distance: 8.5,
            min_pitch: 15f32.to_radians(),
            max_pitch: 80f32.to_radians(),
            min_distance: 3.0,
            max_distance: 26.0,
        }
    }
}

impl CameraRig {
    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw = (self.yaw + delta_yaw).rem_euclid(std::f32::consts::TAU);
        self.pitch = (self.pitch + delta_pitch).clamp(self.min_pitch, self.max_pitch);
    }

    pub fn zoom(&mut self, factor: f32) {
        self.distance = (self.distance * factor).clamp(self.min_distance, self.max_distance);
    }

    /// Camera position for the current angles.
    pub fn eye(&self) -> Vec3 {
        let horizontal = self.distance * self.pitch.sin();
        Vec3::new(
            horizontal * self.yaw.sin(),
            self.distance * self.pitch.cos(),
            horizontal * self.yaw.cos(),
        )
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.eye()).looking_at(Vec3::ZERO, Vec3::Y)
    }
}

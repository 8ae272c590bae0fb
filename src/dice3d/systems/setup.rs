//! Scene setup system
//!
//! This module contains the setup function that initializes the 3D scene:
//! camera, lights, the tray and the text overlays.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::dice3d::types::*;

use super::spawner::launch_height_limit;

/// Half extents of the tray floor.
pub const TRAY_HALF_X: f32 = 3.6;
pub const TRAY_HALF_Z: f32 = 2.4;

const FLOOR_THICKNESS: f32 = 0.3;
const RIM_HEIGHT: f32 = 0.35;
const WALL_THICKNESS: f32 = 0.2;

/// Main setup system - initializes the entire 3D scene
pub fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    rig: Res<CameraRig>,
) {
    commands.spawn((Camera3d::default(), rig.transform(), MainCamera));

    commands.spawn((
        DirectionalLight {
            illuminance: 10000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 10.0, 5.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Soft fill from the opposite side so shadowed faces stay readable.
    commands.spawn((
        PointLight {
            intensity: 400_000.0,
            range: 40.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(-4.0, 6.0, -3.0),
    ));

    let felt = materials.add(StandardMaterial {
        base_color: Color::srgb(0.08, 0.28, 0.16),
        perceptual_roughness: 0.95,
        ..default()
    });
    let wood = materials.add(StandardMaterial {
        base_color: Color::srgb(0.36, 0.22, 0.12),
        perceptual_roughness: 0.6,
        ..default()
    });

    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(
            TRAY_HALF_X * 2.0,
            FLOOR_THICKNESS,
            TRAY_HALF_Z * 2.0,
        ))),
        MeshMaterial3d(felt),
        Transform::from_xyz(0.0, -FLOOR_THICKNESS / 2.0, 0.0),
        Collider::cuboid(TRAY_HALF_X, FLOOR_THICKNESS / 2.0, TRAY_HALF_Z),
        RigidBody::Fixed,
        Restitution::coefficient(0.2),
        Friction::coefficient(0.8),
        DiceBox,
    ));

    // Walls reach up to the ceiling so nothing leaves the tray. Only the low
    // rim is drawn.
    let wall_height = launch_height_limit() + 1.0;
    for (center, half) in tray_walls() {
        commands
            .spawn((
                Transform::from_translation(center.with_y(wall_height / 2.0)),
                Visibility::default(),
                Collider::cuboid(half.x, wall_height / 2.0, half.z),
                RigidBody::Fixed,
                Restitution::coefficient(0.3),
                Friction::coefficient(0.4),
                DiceBox,
            ))
            .with_children(|parent| {
                parent.spawn((
                    Mesh3d(meshes.add(Cuboid::new(half.x * 2.0, RIM_HEIGHT, half.z * 2.0))),
                    MeshMaterial3d(wood.clone()),
                    Transform::from_xyz(0.0, RIM_HEIGHT / 2.0 - wall_height / 2.0, 0.0),
                ));
            });
    }

    commands.spawn((
        Collider::cuboid(TRAY_HALF_X, 0.2, TRAY_HALF_Z),
        Transform::from_xyz(0.0, wall_height + 0.2, 0.0),
        RigidBody::Fixed,
        Restitution::coefficient(0.05),
        Friction::coefficient(0.3),
        DiceBox,
    ));

    spawn_overlay(&mut commands);
}

/// Centers and half extents of the four tray walls, on the floor plane.
pub fn tray_walls() -> [(Vec3, Vec3); 4] {
    let t = WALL_THICKNESS / 2.0;
    [
        (
            Vec3::new(0.0, 0.0, -TRAY_HALF_Z - t),
            Vec3::new(TRAY_HALF_X + WALL_THICKNESS, 0.0, t),
        ),
        (
            Vec3::new(0.0, 0.0, TRAY_HALF_Z + t),
            Vec3::new(TRAY_HALF_X + WALL_THICKNESS, 0.0, t),
        ),
        (
            Vec3::new(-TRAY_HALF_X - t, 0.0, 0.0),
            Vec3::new(t, 0.0, TRAY_HALF_Z),
        ),
        (
            Vec3::new(TRAY_HALF_X + t, 0.0, 0.0),
            Vec3::new(t, 0.0, TRAY_HALF_Z),
        ),
    ]
}

/// Keep a settled die's center inside the tray.
pub fn clamp_to_tray(position: Vec3, margin: f32) -> Vec3 {
    Vec3::new(
        position.x.clamp(-TRAY_HALF_X + margin, TRAY_HALF_X - margin),
        position.y.max(margin),
        position.z.clamp(-TRAY_HALF_Z + margin, TRAY_HALF_Z - margin),
    )
}

fn spawn_overlay(commands: &mut Commands) {
    commands.spawn((
        Text::new(""),
        TextFont {
            font_size: 20.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            left: Val::Px(10.0),
            ..default()
        },
        PlayerInfoText,
    ));

    commands.spawn((
        Text::new(""),
        TextFont {
            font_size: 16.0,
            ..default()
        },
        TextColor(Color::srgb(0.9, 0.9, 0.9)),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            right: Val::Px(10.0),
            max_width: Val::Px(420.0),
            ..default()
        },
        RollLogText,
    ));

    commands.spawn((
        Text::new(""),
        TextFont {
            font_size: 18.0,
            ..default()
        },
        TextColor(Color::srgb(0.8, 0.8, 0.8)),
        Node {
            position_type: PositionType::Absolute,
            bottom: Val::Px(44.0),
            left: Val::Px(10.0),
            ..default()
        },
        StatusText,
    ));

    commands.spawn((
        Text::new(""),
        TextFont {
            font_size: 22.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            bottom: Val::Px(10.0),
            left: Val::Px(10.0),
            ..default()
        },
        RollInputText,
    ));
}

//! Die spawning
//!
//! Dice are spawned in two steps. The physics body, with its collider and
//! committed value, is created as soon as a roll is accepted. Meshes and
//! number labels are attached afterwards by the scene, so the roll systems
//! also run headless.

use std::collections::HashMap;
use std::f32::consts::TAU;

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use rand::Rng;

use crate::dice3d::meshes::create_die_mesh_and_collider;
use crate::dice3d::session::RollPlan;
use crate::dice3d::types::*;

use super::rendering::{
    create_digit_mesh, get_label_offset, get_label_rotation, get_label_scale, needs_underline,
};
use super::setup::{TRAY_HALF_X, TRAY_HALF_Z};

/// Launch grid: rows along x, columns along z, stacked in layers.
pub const LAUNCH_ROWS: usize = 2;
pub const LAUNCH_COLUMNS: usize = 4;
/// Wider than the largest scaled die so no two start intersecting.
const LAUNCH_SPACING: f32 = 1.05;
const LAUNCH_BASE_HEIGHT: f32 = 0.6;

/// Start position for the `index`th die of a roll.
///
/// Dice start stacked at the left end of the tray and are thrown across it,
/// eight per layer.
pub fn launch_position(index: usize) -> Vec3 {
    let per_layer = LAUNCH_ROWS * LAUNCH_COLUMNS;
    let layer = (index / per_layer) as f32;
    let slot = index % per_layer;
    let row = (slot / LAUNCH_COLUMNS) as f32;
    let column = (slot % LAUNCH_COLUMNS) as f32;

    Vec3::new(
        -TRAY_HALF_X + 1.0 + row * LAUNCH_SPACING,
        LAUNCH_BASE_HEIGHT + layer * LAUNCH_SPACING,
        -TRAY_HALF_Z + 0.8 + column * LAUNCH_SPACING,
    )
}

/// Height of the highest launch slot, used to size the tray's ceiling.
pub fn launch_height_limit() -> f32 {
    launch_position(MAX_DICE_PER_ROLL.saturating_sub(1)).y + LAUNCH_SPACING
}

/// Random launch velocities: a throw towards the far corner with spin.
pub fn launch_velocity<R: Rng>(rng: &mut R) -> PendingLaunch {
    PendingLaunch {
        linvel: Vec3::new(
            2.0 + rng.gen::<f32>() * 0.4,
            3.3 + rng.gen::<f32>() * 1.6,
            1.2 + rng.gen::<f32>() * 0.4,
        ),
        angvel: Vec3::new(
            rng.gen_range(-6.0..=6.0),
            rng.gen_range(-6.0..=6.0),
            rng.gen_range(-6.0..=6.0),
        ),
    }
}

pub fn random_orientation<R: Rng>(rng: &mut R) -> Quat {
    Quat::from_euler(
        EulerRot::XYZ,
        rng.gen_range(0.0..TAU),
        rng.gen_range(0.0..TAU),
        rng.gen_range(0.0..TAU),
    )
}

/// Resolve per-roll colors, falling back to the player's preferences.
pub fn resolve_dice_colors(plan: &RollPlan, settings: &AppSettings) -> (ColorSetting, ColorSetting) {
    let pick = |requested: Option<&str>, fallback: ColorSetting, what: &str| match requested {
        Some(input) => ColorSetting::parse_css(input).unwrap_or_else(|| {
            warn!("Ignoring unparsable {} color {:?}", what, input);
            fallback
        }),
        None => fallback,
    };

    (
        pick(plan.dice_color.as_deref(), settings.dice_color, "dice"),
        pick(plan.dice_text_color.as_deref(), settings.text_color, "text"),
    )
}

/// Colors for the labels and body of one die.
#[derive(Component, Debug, Clone, Copy)]
pub struct DieColors {
    pub base: ColorSetting,
    pub text: ColorSetting,
}

/// Spawn the physics side of every die in a plan.
pub fn spawn_planned_dice<R: Rng>(
    commands: &mut Commands,
    plan: &RollPlan,
    colors: DieColors,
    rng: &mut R,
) {
    for (index, roll) in plan.rolls.iter().enumerate() {
        let Some(die_type) = DiceType::from_faces(roll.dice) else {
            continue;
        };

        let (_, collider, face_normals) = create_die_mesh_and_collider(die_type);

        commands.spawn((
            Transform::from_translation(launch_position(index))
                .with_rotation(random_orientation(rng))
                .with_scale(Vec3::splat(die_type.scale())),
            Visibility::default(),
            RigidBody::Dynamic,
            collider,
            Velocity::zero(),
            Restitution::coefficient(0.15),
            Friction::coefficient(0.7),
            ColliderMassProperties::Density(die_type.density()),
            Ccd::enabled(),
            Die {
                die_type,
                face_normals,
                target: roll.value,
                ticket: plan.ticket,
            },
            SettleTracker::default(),
            launch_velocity(rng),
            colors,
        ));
    }
}

/// Despawn every die of the previous roll.
pub fn clear_dice(commands: &mut Commands, dice: impl Iterator<Item = Entity>) {
    for entity in dice {
        commands.entity(entity).despawn();
    }
}

/// Shared meshes and materials so a hundred dice do not mean a hundred meshes.
#[derive(Resource, Default)]
pub struct DieAssetCache {
    bodies: HashMap<DiceType, Handle<Mesh>>,
    labels: HashMap<(u32, bool), Handle<Mesh>>,
    materials: HashMap<String, Handle<StandardMaterial>>,
}

impl DieAssetCache {
    fn body(&mut self, die_type: DiceType, meshes: &mut Assets<Mesh>) -> Handle<Mesh> {
        self.bodies
            .entry(die_type)
            .or_insert_with(|| meshes.add(create_die_mesh_and_collider(die_type).0))
            .clone()
    }

    fn label(&mut self, value: u32, underline: bool, meshes: &mut Assets<Mesh>) -> Handle<Mesh> {
        self.labels
            .entry((value, underline))
            .or_insert_with(|| meshes.add(create_digit_mesh(value, underline)))
            .clone()
    }

    fn material(
        &mut self,
        color: ColorSetting,
        unlit: bool,
        materials: &mut Assets<StandardMaterial>,
    ) -> Handle<StandardMaterial> {
        let key = format!("{}{}", color.to_hex(), if unlit { "/label" } else { "" });
        self.materials
            .entry(key)
            .or_insert_with(|| {
                materials.add(StandardMaterial {
                    base_color: color.to_color(),
                    alpha_mode: if color.a < 1.0 {
                        AlphaMode::Blend
                    } else {
                        AlphaMode::Opaque
                    },
                    unlit,
                    reflectance: 0.5,
                    perceptual_roughness: 0.35,
                    ..default()
                })
            })
            .clone()
    }
}

/// Give freshly spawned dice their body mesh and number labels.
pub fn attach_die_visuals(
    mut commands: Commands,
    mut cache: ResMut<DieAssetCache>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    new_dice: Query<(Entity, &Die, &DieColors), Added<Die>>,
) {
    for (entity, die, colors) in new_dice.iter() {
        let body = cache.body(die.die_type, &mut meshes);
        let body_material = cache.material(colors.base, false, &mut materials);
        let label_material = cache.material(colors.text, true, &mut materials);

        let offset = get_label_offset(die.die_type);
        let scale = get_label_scale(die.die_type);

        let labels: Vec<(Handle<Mesh>, Transform)> = die
            .face_normals
            .iter()
            .map(|(normal, value)| {
                let underline = needs_underline(*value, die.die_type);
                (
                    cache.label(*value, underline, &mut meshes),
                    Transform::from_translation(*normal * offset)
                        .with_rotation(get_label_rotation(*normal))
                        .with_scale(Vec3::splat(scale)),
                )
            })
            .collect();

        commands
            .entity(entity)
            .insert((Mesh3d(body), MeshMaterial3d(body_material)))
            .with_children(|parent| {
                for (mesh, transform) in labels {
                    parent.spawn((Mesh3d(mesh), MeshMaterial3d(label_material.clone()), transform));
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_launch_positions_are_inside_the_tray() {
        for index in 0..MAX_DICE_PER_ROLL {
            let p = launch_position(index);
            assert!(p.x.abs() < TRAY_HALF_X - 0.3, "index {} x {}", index, p.x);
            assert!(p.z.abs() < TRAY_HALF_Z - 0.3, "index {} z {}", index, p.z);
            assert!(p.y > 0.0);
        }
    }

    #[test]
    fn test_launch_positions_do_not_overlap() {
        for a in 0..30 {
            for b in (a + 1)..30 {
                let d = launch_position(a).distance(launch_position(b));
                assert!(d >= 1.0, "{} and {} are {} apart", a, b, d);
            }
        }
    }

    #[test]
    fn test_launch_velocity_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let launch = launch_velocity(&mut rng);
            assert!((2.0..=2.4).contains(&launch.linvel.x));
            assert!((3.3..=4.9).contains(&launch.linvel.y));
            assert!((1.2..=1.6).contains(&launch.linvel.z));
            assert!(launch.angvel.abs().max_element() <= 6.0);
        }
    }

    #[test]
    fn test_colors_fall_back_to_preferences() {
        let settings = AppSettings::default();
        let plan = RollPlan {
            ticket: RollTicket(1),
            rolls: vec![Roll::new(6, 1)],
            origin: RollOrigin::Local,
            broadcast: false,
            dice_color: Some("#00ff00".into()),
            dice_text_color: Some("definitely not a color".into()),
        };

        let (base, text) = resolve_dice_colors(&plan, &settings);
        assert_eq!(base.to_hex(), "#00ff00");
        assert_eq!(text.to_hex(), settings.text_color.to_hex());
    }

    #[test]
    fn test_remote_colors_accept_css_only() {
        let settings = AppSettings::default();
        let plan = RollPlan {
            ticket: RollTicket(2),
            rolls: vec![Roll::new(20, 7)],
            origin: RollOrigin::Remote {
                thrower: "mallory".to_string(),
            },
            broadcast: false,
            dice_color: Some("A:0.5 R:1.0 G:0.5 B:0.25".into()),
            dice_text_color: Some("rgb(255 0 0)".into()),
        };

        let (base, text) = resolve_dice_colors(&plan, &settings);
        assert_eq!(base.to_hex(), settings.dice_color.to_hex());
        assert_eq!(text.to_hex(), "#ff0000");
    }
}

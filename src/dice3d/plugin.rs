//! App wiring for the dice tray
//!
//! [`DiceTrayPlugin`] carries the roll state machine and runs headless.
//! [`DiceTrayScenePlugin`] adds physics, the rendered tray, the camera and
//! the keyboard-driven overlay on top of it.

use std::time::Duration;

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::dice3d::session::RollSession;
use crate::dice3d::systems::*;
use crate::dice3d::types::*;

/// Simulation rate of the fixed-step physics.
pub const PHYSICS_HZ: f64 = 60.0;

/// Per-frame order of the roll pipeline.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum RollSet {
    /// Throw requests are produced: keyboard, remote replays.
    Intake,
    /// The session accepts or rejects requests and dice are spawned.
    Begin,
    /// Accepted rolls are announced before anything moves.
    Announce,
    /// Dice get their launch velocities.
    Launch,
    /// Cancellation and completion of the roll in flight.
    Complete,
    /// Results are logged and shown.
    Report,
}

pub struct DiceTrayPlugin;

impl Plugin for DiceTrayPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<ThrowDiceRequest>()
            .add_message::<PreRoll>()
            .add_message::<RollFinished>()
            .add_message::<CancelRoll>()
            .init_resource::<RollSession>()
            .init_resource::<RollProgress>()
            .init_resource::<RollRng>()
            .init_resource::<RollLog>()
            .init_resource::<StatusMessage>()
            .init_resource::<SettingsState>()
            .insert_resource(Time::<Fixed>::from_hz(PHYSICS_HZ))
            .configure_sets(
                Update,
                (
                    RollSet::Intake,
                    RollSet::Begin,
                    RollSet::Announce,
                    RollSet::Launch,
                    RollSet::Complete,
                    RollSet::Report,
                )
                    .chain(),
            )
            .add_systems(Update, begin_requested_rolls.in_set(RollSet::Begin))
            .add_systems(Update, launch_dice.in_set(RollSet::Launch))
            .add_systems(
                Update,
                (cancel_active_roll, complete_settled_roll)
                    .chain()
                    .in_set(RollSet::Complete),
            )
            .add_systems(
                Update,
                (announce_roll_started, record_finished_rolls)
                    .chain()
                    .in_set(RollSet::Report),
            )
            .add_systems(
                FixedPostUpdate,
                track_settling_dice.after(PhysicsSet::Writeback),
            )
            .add_systems(PostUpdate, persist_settings);
    }
}

pub struct DiceTrayScenePlugin;

impl Plugin for DiceTrayScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule())
            .insert_resource(TimestepMode::Fixed {
                dt: (1.0 / PHYSICS_HZ) as f32,
                substeps: 1,
            })
            .init_resource::<CameraRig>()
            .init_resource::<DieAssetCache>()
            .init_resource::<RollInput>()
            .init_resource::<NotationHistory>()
            .add_systems(Startup, setup)
            .add_systems(Update, apply_tray_gravity)
            .add_systems(Update, handle_keyboard_input.in_set(RollSet::Intake))
            .add_systems(Update, attach_die_visuals.in_set(RollSet::Launch))
            .add_systems(Update, (orbit_camera, apply_camera_rig).chain())
            .add_systems(
                Update,
                (
                    update_player_info,
                    update_roll_input,
                    update_status,
                    update_roll_log,
                )
                    .after(RollSet::Report),
            )
            .add_systems(
                PostUpdate,
                (persist_notation_history, request_redraw_while_rolling),
            );
    }
}

/// Frame pacing for the window: idle until input arrives, then redraw as
/// needed while dice move.
pub fn reactive_winit_settings() -> bevy::winit::WinitSettings {
    use bevy::winit::{UpdateMode, WinitSettings};

    WinitSettings {
        focused_mode: UpdateMode::reactive(Duration::from_millis(250)),
        unfocused_mode: UpdateMode::reactive_low_power(Duration::from_secs(2)),
    }
}

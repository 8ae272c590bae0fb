//! Systems module for dice3d
//!
//! This module contains all the Bevy systems for the dice tray, organized
//! into submodules by functionality:
//!
//! - `setup`: Scene initialization (camera, lights, tray, UI)
//! - `spawner`: Die bodies, launch positions and visuals
//! - `orchestrator`: Accepting, launching and cancelling rolls
//! - `settle`: Settle detection and value reconciliation
//! - `physics`: Physics world configuration
//! - `camera`: Orbit camera controls
//! - `input`: Roll input line and slash commands
//! - `history`: Roll log and persistence
//! - `display`: Text overlay updates
//! - `redraw`: Redraw requests while the simulation runs
//! - `rendering`: Number mesh generation for dice labels

mod camera;
mod display;
mod history;
pub mod input;
pub mod orchestrator;
mod physics;
mod redraw;
pub mod rendering;
pub mod settle;
pub mod setup;
pub mod spawner;

pub use camera::{apply_camera_rig, orbit_camera};
pub use display::{
    player_info_line, update_player_info, update_roll_input, update_roll_log, update_status,
};
pub use history::{
    announce_roll_started, persist_notation_history, persist_settings, record_finished_rolls,
};
pub use input::{handle_keyboard_input, parse_slash_command, submit_roll_input, SlashCommand};
pub use orchestrator::{
    begin_requested_rolls, cancel_active_roll, launch_dice, RollProgress, RollRng,
};
pub use physics::{apply_tray_gravity, TRAY_GRAVITY};
pub use redraw::request_redraw_while_rolling;
pub use settle::{complete_settled_roll, track_settling_dice};
pub use setup::setup;
pub use spawner::{attach_die_visuals, DieAssetCache, DieColors};

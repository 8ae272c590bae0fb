//! Type definitions for the dice tray
//!
//! This module is organized into submodules:
//! - `dice` - Dice types, die components and settle tracking
//! - `roll` - Rolls, roll requests and the roll error taxonomy
//! - `messages` - Messages passed between the roll systems
//! - `history` - The roll log and its line format
//! - `ui` - Overlay text markers, roll input and notation history
//! - `camera` - Camera marker and orbit rig
//! - `database` - Embedded SurrealDB preference store
//! - `settings` - Application settings and persistence

pub mod camera;
pub mod database;
pub mod dice;
pub mod history;
pub mod messages;
pub mod roll;
pub mod settings;
pub mod ui;

// Re-export all public types for convenient access
pub use camera::*;
pub use database::*;
pub use dice::*;
pub use history::*;
pub use messages::*;
pub use roll::*;
pub use settings::*;
pub use ui::*;

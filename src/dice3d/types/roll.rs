//! Roll-level types shared by the session, the Bevy systems and the relay.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hard cap on dice in one roll.
pub const MAX_DICE_PER_ROLL: usize = 100;

/// One die of a roll: face count and the value it shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Roll {
    pub dice: u32,
    pub value: u32,
}

impl Roll {
    pub fn new(dice: u32, value: u32) -> Self {
        Self { dice, value }
    }
}

/// What the caller asks to throw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollSpec {
    /// Free-text notation such as "2d6 d20".
    Notation(String),
    /// Values already decided elsewhere, e.g. a remote broadcast.
    Resolved(Vec<Roll>),
}

impl From<&str> for RollSpec {
    fn from(value: &str) -> Self {
        RollSpec::Notation(value.to_string())
    }
}

impl From<Vec<Roll>> for RollSpec {
    fn from(value: Vec<Roll>) -> Self {
        RollSpec::Resolved(value)
    }
}

/// Die and label colors as CSS color strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceColor {
    pub base: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollOptions {
    /// Announce the roll to the group before the dice start moving.
    pub broadcast_before_roll: bool,
    pub dice_color: Option<String>,
    pub dice_text_color: Option<String>,
}

impl RollOptions {
    pub fn shared() -> Self {
        Self {
            broadcast_before_roll: true,
            ..Default::default()
        }
    }

    pub fn with_colors(mut self, color: Option<&DiceColor>) -> Self {
        if let Some(color) = color {
            self.dice_color = Some(color.base.clone());
            self.dice_text_color = Some(color.text.clone());
        }
        self
    }
}

/// Who initiated a roll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollOrigin {
    Local,
    Remote { thrower: String },
}

impl RollOrigin {
    pub fn thrower(&self) -> &str {
        match self {
            RollOrigin::Local => "You",
            RollOrigin::Remote { thrower } => thrower,
        }
    }
}

/// Identifies one accepted roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RollTicket(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RollError {
    #[error("Couldn't parse the dice roll")]
    Parse,
    #[error("Maximum number of die is {}", MAX_DICE_PER_ROLL)]
    TooManyDice,
    #[error("Unsupported dice: d{0}")]
    UnsupportedDie(u32),
    #[error("Roll value {value} is out of range for d{dice}")]
    ValueOutOfRange { dice: u32, value: u32 },
    #[error("There can be only one roll active at any given time")]
    ConcurrentRoll,
    #[error("Roll was cancelled")]
    Cancelled,
}

pub type RollOutcome = Result<Vec<Roll>, RollError>;

/// Status/data envelope for callers that want the tagged JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "lowercase")]
pub enum RollResponse {
    Ok(Vec<Roll>),
    Error(String),
}

impl From<&RollOutcome> for RollResponse {
    fn from(outcome: &RollOutcome) -> Self {
        match outcome {
            Ok(rolls) => RollResponse::Ok(rolls.clone()),
            Err(e) => RollResponse::Error(e.to_string()),
        }
    }
}

/// Sum of all values in a roll.
pub fn roll_total(rolls: &[Roll]) -> u32 {
    rolls.iter().map(|r| r.value).sum()
}

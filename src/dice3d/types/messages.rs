//! Messages exchanged between the input, roll, settle and relay systems.

use bevy::prelude::*;

use super::history::LogEntryId;
use super::roll::{DiceColor, Roll, RollOptions, RollOrigin, RollOutcome, RollSpec, RollTicket};

/// Ask the session to throw dice.
#[derive(Message, Debug, Clone)]
pub struct ThrowDiceRequest {
    pub spec: RollSpec,
    pub options: RollOptions,
    pub origin: RollOrigin,
    /// Log entry to reveal once this roll finishes.
    pub log_entry: Option<LogEntryId>,
}

impl ThrowDiceRequest {
    pub fn local(spec: RollSpec, options: RollOptions) -> Self {
        Self {
            spec,
            options,
            origin: RollOrigin::Local,
            log_entry: None,
        }
    }
}

/// A roll was accepted and its dice exist, but have not been launched yet.
#[derive(Message, Debug, Clone)]
pub struct PreRoll {
    pub ticket: RollTicket,
    pub rolls: Vec<Roll>,
    pub dice_color: DiceColor,
    pub broadcast: bool,
}

/// A throw request came to an end, successfully or not.
#[derive(Message, Debug, Clone)]
pub struct RollFinished {
    /// `None` when the request was rejected before a ticket was issued.
    pub ticket: Option<RollTicket>,
    pub origin: RollOrigin,
    pub log_entry: Option<LogEntryId>,
    pub outcome: RollOutcome,
    /// The settle timeout expired and the dice were snapped in place.
    pub timed_out: bool,
}

/// Abort the roll in flight.
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct CancelRoll;

//! Wire format of shared throws.
//!
//! A throw travels as a broadcast named `throw` on a per-group channel:
//!
//! ```json
//! {"type":"broadcast","event":"throw",
//!  "payload":{"roll":[{"dice":6,"value":3}],"name":"keen-otter",
//!             "diceColor":{"base":"#ff0000","text":"#000000"}}}
//! ```

use serde::{Deserialize, Serialize};

use crate::dice3d::types::{DiceColor, Roll};

/// Broadcast event name for throws.
pub const THROW_EVENT: &str = "throw";

/// Channel used when the group is empty.
pub const DEFAULT_CHANNEL: &str = "throws";

/// Payload of one shared throw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrowEvent {
    pub roll: Vec<Roll>,
    pub name: String,
    #[serde(rename = "diceColor", default, skip_serializing_if = "Option::is_none")]
    pub dice_color: Option<DiceColor>,
}

/// Broadcast frame around a payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastEnvelope<T> {
    #[serde(rename = "type")]
    pub kind: String,
    pub event: String,
    pub payload: T,
}

impl BroadcastEnvelope<ThrowEvent> {
    pub fn throw(payload: ThrowEvent) -> Self {
        Self {
            kind: "broadcast".to_string(),
            event: THROW_EVENT.to_string(),
            payload,
        }
    }
}

/// Channel name for a group: `<group>-throws`, or `throws` without one.
pub fn channel_name(group: &str) -> String {
    let group = group.trim();
    if group.is_empty() {
        DEFAULT_CHANNEL.to_string()
    } else {
        format!("{}-{}", group, DEFAULT_CHANNEL)
    }
}

/// Decode a broadcast frame, keeping only throws.
pub fn decode_throw(text: &str) -> Result<Option<ThrowEvent>, serde_json::Error> {
    let envelope: BroadcastEnvelope<serde_json::Value> = serde_json::from_str(text)?;
    if envelope.event != THROW_EVENT {
        return Ok(None);
    }
    serde_json::from_value(envelope.payload).map(Some)
}

pub fn encode_throw(event: &ThrowEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(&BroadcastEnvelope::throw(event.clone()))
}

//! Broadcast relay between the roll session and the group channel.
//!
//! Local rolls marked for sharing are sent out as soon as they are accepted,
//! before the dice move. Throws from other players are logged hidden, queued,
//! and replayed one at a time whenever the tray is idle; the log entry is
//! revealed when the replay settles.

use std::collections::VecDeque;

use bevy::prelude::*;

use crate::dice3d::plugin::RollSet;
use crate::dice3d::session::RollSession;
use crate::dice3d::types::*;

use super::channel::{ConnectionStatus, RealtimeChannel};
use super::protocol::{channel_name, ThrowEvent};

/// A received throw waiting for, or in, its replay.
#[derive(Debug, Clone)]
pub struct RemoteThrow {
    pub event: ThrowEvent,
    pub log_entry: LogEntryId,
}

#[derive(Resource)]
pub struct BroadcastRelay {
    channel: Box<dyn RealtimeChannel>,
    group: Option<String>,
    pending: VecDeque<RemoteThrow>,
    in_flight: Option<RemoteThrow>,
}

impl BroadcastRelay {
    pub fn new(channel: impl RealtimeChannel + 'static) -> Self {
        Self {
            channel: Box::new(channel),
            group: None,
            pending: VecDeque::new(),
            in_flight: None,
        }
    }

    /// Move to the channel of `group`. Queued throws from the old group are kept.
    pub fn join_group(&mut self, group: &str) {
        self.group = Some(group.to_string());

        let topic = channel_name(group);
        if self.channel.topic() == Some(topic.as_str()) {
            return;
        }

        match self.channel.subscribe(&topic) {
            Ok(()) => info!("Sharing rolls on {}", topic),
            Err(e) => warn!("Failed to join {}: {}", topic, e),
        }
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.channel.status()
    }

    /// Throws received but not replayed yet.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_replaying(&self) -> bool {
        self.in_flight.is_some()
    }
}

/// Follow the group in the settings, including the first join.
pub fn follow_group_changes(settings: Res<SettingsState>, mut relay: ResMut<BroadcastRelay>) {
    let group = &settings.settings.group;
    if relay.group() != Some(group.as_str()) {
        relay.join_group(group);
    }
}

/// Mirror the channel state into [`ShareLink`] for the overlay.
pub fn publish_share_link(relay: Res<BroadcastRelay>, mut link: ResMut<ShareLink>) {
    link.set_if_neq(ShareLink {
        label: Some(relay.status().label()),
    });
}

/// Send accepted local rolls to the group.
pub fn announce_shared_rolls(
    mut pre_roll: MessageReader<PreRoll>,
    settings: Res<SettingsState>,
    mut relay: ResMut<BroadcastRelay>,
) {
    for roll in pre_roll.read() {
        if !roll.broadcast {
            continue;
        }

        let event = ThrowEvent {
            roll: roll.rolls.clone(),
            name: settings.settings.name.clone(),
            dice_color: Some(roll.dice_color.clone()),
        };

        if let Err(e) = relay.channel.send(&event) {
            warn!("Failed to share roll {}: {}", roll.ticket.0, e);
        }
    }
}

/// Log incoming throws hidden and queue them for replay. The queue holds at
/// most [`ROLL_LOG_LIMIT`] throws; the oldest is dropped to make room.
pub fn receive_remote_throws(mut relay: ResMut<BroadcastRelay>, mut log: ResMut<RollLog>) {
    for event in relay.channel.poll() {
        debug!("Received throw from {}", event.name);
        if relay.pending.len() >= ROLL_LOG_LIMIT {
            if let Some(dropped) = relay.pending.pop_front() {
                warn!("Replay queue full, dropping throw from {}", dropped.event.name);
                log.remove(dropped.log_entry);
            }
        }
        let log_entry = log.push(event.name.clone(), event.roll.clone(), false);
        relay.pending.push_back(RemoteThrow { event, log_entry });
    }
}

/// Replay the oldest queued throw when the tray is idle.
pub fn dispatch_remote_throws(
    mut relay: ResMut<BroadcastRelay>,
    session: Res<RollSession>,
    mut requests: MessageWriter<ThrowDiceRequest>,
) {
    if relay.in_flight.is_some() || session.is_rolling() {
        return;
    }
    let Some(remote) = relay.pending.pop_front() else {
        return;
    };

    requests.write(ThrowDiceRequest {
        spec: RollSpec::Resolved(remote.event.roll.clone()),
        options: RollOptions::default().with_colors(remote.event.dice_color.as_ref()),
        origin: RollOrigin::Remote {
            thrower: remote.event.name.clone(),
        },
        log_entry: Some(remote.log_entry),
    });
    relay.in_flight = Some(remote);
}

/// Reveal, requeue or drop the log entry of a finished replay.
pub fn reveal_remote_rolls(
    mut finished: MessageReader<RollFinished>,
    mut relay: ResMut<BroadcastRelay>,
    mut log: ResMut<RollLog>,
) {
    for roll in finished.read() {
        let Some(log_entry) = roll.log_entry else {
            continue;
        };
        let Some(remote) = relay.in_flight.take_if(|r| r.log_entry == log_entry) else {
            continue;
        };

        match &roll.outcome {
            // The values were decided by the thrower, so a cancelled
            // animation still shows them.
            Ok(_) | Err(RollError::Cancelled) => {
                log.reveal(log_entry);
            }
            Err(RollError::ConcurrentRoll) => {
                relay.pending.push_front(remote);
            }
            Err(e) => {
                warn!("Dropping throw from {}: {}", remote.event.name, e);
                log.remove(log_entry);
            }
        }
    }
}

/// Relay systems. Runs only while a [`BroadcastRelay`] resource exists.
pub struct RealtimeRelayPlugin;

impl Plugin for RealtimeRelayPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ShareLink>().add_systems(
            Update,
            (
                follow_group_changes,
                receive_remote_throws,
                dispatch_remote_throws,
            )
                .chain()
                .in_set(RollSet::Intake)
                .run_if(resource_exists::<BroadcastRelay>),
        )
        .add_systems(
            Update,
            announce_shared_rolls
                .in_set(RollSet::Announce)
                .run_if(resource_exists::<BroadcastRelay>),
        )
        .add_systems(
            Update,
            (reveal_remote_rolls, publish_share_link)
                .in_set(RollSet::Report)
                .run_if(resource_exists::<BroadcastRelay>),
        );
    }
}

//! Settle detection and result reconciliation
//!
//! Every fixed step, after the physics writeback, each die reports whether it
//! has been resting long enough. Once all dice of the roll are finished (or
//! the timeout expires) they are turned so the committed value faces up,
//! frozen in place, and the roll completes.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::dice3d::meshes::face_inradius;
use crate::dice3d::reconcile::{read_face_value, reconcile_rotation};
use crate::dice3d::session::RollSession;
use crate::dice3d::types::*;

use super::orchestrator::RollProgress;
use super::setup::clamp_to_tray;

/// Feed each moving die's velocity into its settle tracker.
pub fn track_settling_dice(
    time: Res<Time>,
    mut dice: Query<(&Velocity, &mut SettleTracker), (With<Die>, Without<Reconciled>)>,
) {
    let dt = time.delta_secs();
    for (velocity, mut tracker) in dice.iter_mut() {
        tracker.observe(velocity.linvel, velocity.angvel, dt);
    }
}

/// Complete the roll once its dice are at rest or the timeout expires.
pub fn complete_settled_roll(
    mut commands: Commands,
    time: Res<Time>,
    settings: Res<SettingsState>,
    mut session: ResMut<RollSession>,
    mut progress: ResMut<RollProgress>,
    mut dice: Query<
        (Entity, &Die, &SettleTracker, &mut Transform, &mut Velocity),
        Without<Reconciled>,
    >,
    mut finished: MessageWriter<RollFinished>,
) {
    let Some(active) = session.active() else {
        return;
    };
    let ticket = active.ticket;
    let origin = active.origin.clone();

    progress.elapsed += time.delta_secs();

    let (count, resting) = dice
        .iter()
        .filter(|(_, die, ..)| die.ticket == ticket)
        .fold((0, 0), |(count, resting), (_, _, tracker, ..)| {
            (count + 1, resting + usize::from(tracker.finished))
        });
    let all_settled = count > 0 && resting == count;
    let timed_out = !all_settled && progress.elapsed >= settings.settings.settle_timeout_secs;

    if !all_settled && !timed_out {
        return;
    }

    if timed_out {
        warn!(
            "Dice for roll {} still moving after {:.1}s, snapping them in place",
            ticket.0, progress.elapsed
        );
    }

    for (entity, die, _, mut transform, mut velocity) in dice.iter_mut() {
        if die.ticket != ticket {
            continue;
        }

        if let Some(rotation) = reconcile_rotation(transform.rotation, &die.face_normals, die.target) {
            transform.rotation = rotation;
        }

        let margin = face_inradius(die.die_type) * die.die_type.scale();
        transform.translation = clamp_to_tray(transform.translation, margin);
        *velocity = Velocity::zero();

        let shown = read_face_value(transform.rotation, &die.face_normals);
        if shown != die.target {
            warn!(
                "{} shows {} after reconciling to {}",
                die.die_type.name(),
                shown,
                die.target
            );
        }

        commands.entity(entity).insert((RigidBody::Fixed, Reconciled));
    }

    let Some(rolls) = session.finish(ticket) else {
        return;
    };

    info!(
        "Roll {} finished: {:?}",
        ticket.0,
        rolls.iter().map(|r| r.value).collect::<Vec<_>>()
    );

    finished.write(RollFinished {
        ticket: Some(ticket),
        origin,
        log_entry: progress.log_entry,
        outcome: Ok(rolls),
        timed_out,
    });
    progress.clear();
}

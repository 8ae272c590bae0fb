//! Roll orchestration
//!
//! Accepted throws flow through these systems in order: the session commits
//! the values, dice are spawned at rest, the roll is announced, then the dice
//! are launched. Completion lives in the settle module.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::dice3d::notation::describe_rolls;
use crate::dice3d::session::RollSession;
use crate::dice3d::types::*;

use super::spawner::{clear_dice, resolve_dice_colors, spawn_planned_dice, DieColors};

/// Random source for committed values and launch jitter.
#[derive(Resource)]
pub struct RollRng(pub StdRng);

impl Default for RollRng {
    fn default() -> Self {
        Self(StdRng::from_entropy())
    }
}

/// Bookkeeping for the roll in flight that the session does not need.
#[derive(Resource, Debug, Default)]
pub struct RollProgress {
    pub ticket: Option<RollTicket>,
    pub elapsed: f32,
    pub log_entry: Option<LogEntryId>,
}

impl RollProgress {
    fn start(&mut self, ticket: RollTicket, log_entry: Option<LogEntryId>) {
        self.ticket = Some(ticket);
        self.elapsed = 0.0;
        self.log_entry = log_entry;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Hand every throw request to the session and spawn the accepted roll.
pub fn begin_requested_rolls(
    mut commands: Commands,
    mut requests: MessageReader<ThrowDiceRequest>,
    mut session: ResMut<RollSession>,
    mut progress: ResMut<RollProgress>,
    mut rng: ResMut<RollRng>,
    settings: Res<SettingsState>,
    dice: Query<Entity, With<Die>>,
    mut pre_roll: MessageWriter<PreRoll>,
    mut finished: MessageWriter<RollFinished>,
) {
    for request in requests.read() {
        let plan = match session.throw_dice(
            &request.spec,
            &request.options,
            request.origin.clone(),
            &mut rng.0,
        ) {
            Ok(plan) => plan,
            Err(err) => {
                warn!("Roll from {} rejected: {}", request.origin.thrower(), err);
                finished.write(RollFinished {
                    ticket: None,
                    origin: request.origin.clone(),
                    log_entry: request.log_entry,
                    outcome: Err(err),
                    timed_out: false,
                });
                continue;
            }
        };

        info!(
            "Rolling {} for {} (ticket {})",
            describe_rolls(&plan.rolls),
            plan.origin.thrower(),
            plan.ticket.0
        );

        clear_dice(&mut commands, dice.iter());

        let (base, text) = resolve_dice_colors(&plan, &settings.settings);
        spawn_planned_dice(&mut commands, &plan, DieColors { base, text }, &mut rng.0);
        progress.start(plan.ticket, request.log_entry);

        pre_roll.write(PreRoll {
            ticket: plan.ticket,
            rolls: plan.rolls,
            dice_color: DiceColor {
                base: base.to_hex(),
                text: text.to_hex(),
            },
            broadcast: plan.broadcast,
        });
    }
}

/// Give dice waiting at their start positions their launch velocity.
pub fn launch_dice(
    mut commands: Commands,
    mut pending: Query<(Entity, &PendingLaunch, &mut Velocity)>,
) {
    for (entity, launch, mut velocity) in pending.iter_mut() {
        velocity.linvel = launch.linvel;
        velocity.angvel = launch.angvel;
        commands.entity(entity).remove::<PendingLaunch>();
    }
}

/// Abort the roll in flight on request.
pub fn cancel_active_roll(
    mut commands: Commands,
    mut cancels: MessageReader<CancelRoll>,
    mut session: ResMut<RollSession>,
    mut progress: ResMut<RollProgress>,
    dice: Query<Entity, With<Die>>,
    mut finished: MessageWriter<RollFinished>,
) {
    if cancels.read().count() == 0 {
        return;
    }

    let Some(active) = session.cancel() else {
        return;
    };

    info!("Roll {} cancelled", active.ticket.0);
    clear_dice(&mut commands, dice.iter());

    finished.write(RollFinished {
        ticket: Some(active.ticket),
        origin: active.origin,
        log_entry: progress.log_entry,
        outcome: Err(RollError::Cancelled),
        timed_out: false,
    });
    progress.clear();
}

//! Roll session: the single owner of "is a roll in flight".
//!
//! The session decides whether a throw is accepted, commits the values for
//! every die up front and hands back a plan for the systems to act out.
//! It has no ECS dependencies beyond being a resource, so the state
//! machine can be driven directly from tests.

use bevy::prelude::*;
use rand::Rng;

use crate::dice3d::notation::{resolve_notation, validate_rolls};
use crate::dice3d::types::{Roll, RollError, RollOptions, RollOrigin, RollSpec, RollTicket};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RollPhase {
    #[default]
    Idle,
    Rolling,
}

/// The roll currently in flight.
#[derive(Debug, Clone)]
pub struct ActiveRoll {
    pub ticket: RollTicket,
    pub rolls: Vec<Roll>,
    pub origin: RollOrigin,
}

/// Everything the systems need to spawn and announce an accepted roll.
#[derive(Debug, Clone, PartialEq)]
pub struct RollPlan {
    pub ticket: RollTicket,
    pub rolls: Vec<Roll>,
    pub origin: RollOrigin,
    pub broadcast: bool,
    pub dice_color: Option<String>,
    pub dice_text_color: Option<String>,
}

#[derive(Resource, Debug, Default)]
pub struct RollSession {
    active: Option<ActiveRoll>,
    last_ticket: u64,
}

impl RollSession {
    pub fn phase(&self) -> RollPhase {
        if self.active.is_some() {
            RollPhase::Rolling
        } else {
            RollPhase::Idle
        }
    }

    pub fn is_rolling(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&ActiveRoll> {
        self.active.as_ref()
    }

    /// Accept a roll or reject it without touching the session.
    ///
    /// Notation dice get uniform values in `1..=faces`; resolved rolls keep
    /// theirs. Either way every value is fixed before a single die exists.
    pub fn throw_dice<R: Rng>(
        &mut self,
        spec: &RollSpec,
        options: &RollOptions,
        origin: RollOrigin,
        rng: &mut R,
    ) -> Result<RollPlan, RollError> {
        if self.active.is_some() {
            return Err(RollError::ConcurrentRoll);
        }

        let rolls = match spec {
            RollSpec::Notation(text) => resolve_notation(text)?
                .into_iter()
                .map(|die| Roll::new(die.max_value(), rng.gen_range(1..=die.max_value())))
                .collect(),
            RollSpec::Resolved(rolls) => {
                validate_rolls(rolls)?;
                rolls.clone()
            }
        };

        self.last_ticket += 1;
        let ticket = RollTicket(self.last_ticket);

        // Replays never go back out on the channel.
        let broadcast = options.broadcast_before_roll && origin == RollOrigin::Local;

        self.active = Some(ActiveRoll {
            ticket,
            rolls: rolls.clone(),
            origin: origin.clone(),
        });

        Ok(RollPlan {
            ticket,
            rolls,
            origin,
            broadcast,
            dice_color: options.dice_color.clone(),
            dice_text_color: options.dice_text_color.clone(),
        })
    }

    /// Complete the active roll and return to idle.
    pub fn finish(&mut self, ticket: RollTicket) -> Option<Vec<Roll>> {
        match &self.active {
            Some(active) if active.ticket == ticket => self.active.take().map(|a| a.rolls),
            _ => None,
        }
    }

    /// Abort the active roll, if any.
    pub fn cancel(&mut self) -> Option<ActiveRoll> {
        self.active.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_notation_values_are_in_range() {
        let mut session = RollSession::default();
        let mut rng = StdRng::seed_from_u64(7);

        let plan = session
            .throw_dice(
                &RollSpec::from("50d6 50d20"),
                &RollOptions::default(),
                RollOrigin::Local,
                &mut rng,
            )
            .unwrap();

        assert_eq!(plan.rolls.len(), 100);
        for roll in &plan.rolls {
            assert!(roll.value >= 1 && roll.value <= roll.dice);
        }
        assert_eq!(session.phase(), RollPhase::Rolling);
    }

    #[test]
    fn test_rejection_leaves_session_idle() {
        let mut session = RollSession::default();
        let mut rng = StdRng::seed_from_u64(1);

        for bad in ["", "3dX", "101d6", "2d7"] {
            assert!(session
                .throw_dice(
                    &RollSpec::from(bad),
                    &RollOptions::default(),
                    RollOrigin::Local,
                    &mut rng
                )
                .is_err());
            assert_eq!(session.phase(), RollPhase::Idle);
        }
    }

    #[test]
    fn test_stale_ticket_does_not_finish() {
        let mut session = RollSession::default();
        let mut rng = StdRng::seed_from_u64(3);
        let plan = session
            .throw_dice(
                &RollSpec::from("d8"),
                &RollOptions::default(),
                RollOrigin::Local,
                &mut rng,
            )
            .unwrap();

        assert_eq!(session.finish(RollTicket(plan.ticket.0 + 1)), None);
        assert!(session.is_rolling());
        assert_eq!(session.finish(plan.ticket), Some(plan.rolls));
        assert!(!session.is_rolling());
    }

    #[test]
    fn test_remote_replay_never_broadcasts() {
        let mut session = RollSession::default();
        let mut rng = StdRng::seed_from_u64(3);
        let plan = session
            .throw_dice(
                &RollSpec::Resolved(vec![Roll::new(6, 2)]),
                &RollOptions::shared(),
                RollOrigin::Remote {
                    thrower: "calm-heron".into(),
                },
                &mut rng,
            )
            .unwrap();
        assert!(!plan.broadcast);
    }

    #[test]
    fn test_cancel_returns_to_idle() {
        let mut session = RollSession::default();
        let mut rng = StdRng::seed_from_u64(3);
        let plan = session
            .throw_dice(
                &RollSpec::from("d12"),
                &RollOptions::default(),
                RollOrigin::Local,
                &mut rng,
            )
            .unwrap();

        let cancelled = session.cancel().unwrap();
        assert_eq!(cancelled.ticket, plan.ticket);
        assert_eq!(session.phase(), RollPhase::Idle);
        assert_eq!(session.finish(plan.ticket), None);
    }
}

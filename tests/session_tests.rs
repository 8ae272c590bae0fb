//! Tests for the roll session state machine

use rand::rngs::StdRng;
use rand::SeedableRng;

use dicetray::dice3d::types::{Roll, RollError, RollOptions, RollOrigin, RollSpec};
use dicetray::dice3d::{RollPhase, RollSession};

fn rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

#[test]
fn test_idle_rolling_idle() {
    let mut session = RollSession::default();
    assert_eq!(session.phase(), RollPhase::Idle);

    let plan = session
        .throw_dice(
            &RollSpec::from("3d8"),
            &RollOptions::default(),
            RollOrigin::Local,
            &mut rng(),
        )
        .unwrap();
    assert_eq!(session.phase(), RollPhase::Rolling);
    assert_eq!(plan.rolls.len(), 3);

    let rolls = session.finish(plan.ticket).unwrap();
    assert_eq!(rolls, plan.rolls);
    assert_eq!(session.phase(), RollPhase::Idle);
}

#[test]
fn test_second_throw_is_rejected_without_side_effects() {
    let mut session = RollSession::default();
    let first = session
        .throw_dice(
            &RollSpec::from("d20"),
            &RollOptions::default(),
            RollOrigin::Local,
            &mut rng(),
        )
        .unwrap();

    let second = session.throw_dice(
        &RollSpec::from("2d6"),
        &RollOptions::default(),
        RollOrigin::Local,
        &mut rng(),
    );
    assert_eq!(second, Err(RollError::ConcurrentRoll));
    assert_eq!(session.active().map(|a| a.ticket), Some(first.ticket));
}

#[test]
fn test_invalid_throw_leaves_session_idle() {
    let mut session = RollSession::default();
    let result = session.throw_dice(
        &RollSpec::from("2d7"),
        &RollOptions::default(),
        RollOrigin::Local,
        &mut rng(),
    );
    assert_eq!(result, Err(RollError::UnsupportedDie(7)));
    assert!(!session.is_rolling());
}

#[test]
fn test_stale_ticket_does_not_finish() {
    let mut session = RollSession::default();
    let first = session
        .throw_dice(
            &RollSpec::from("d6"),
            &RollOptions::default(),
            RollOrigin::Local,
            &mut rng(),
        )
        .unwrap();
    session.finish(first.ticket);

    let second = session
        .throw_dice(
            &RollSpec::from("d6"),
            &RollOptions::default(),
            RollOrigin::Local,
            &mut rng(),
        )
        .unwrap();

    assert!(session.finish(first.ticket).is_none());
    assert!(session.is_rolling());
    assert!(session.finish(second.ticket).is_some());
}

#[test]
fn test_resolved_rolls_keep_their_values() {
    let mut session = RollSession::default();
    let rolls = vec![Roll::new(20, 20), Roll::new(6, 1)];
    let plan = session
        .throw_dice(
            &RollSpec::Resolved(rolls.clone()),
            &RollOptions::shared(),
            RollOrigin::Remote {
                thrower: "swift-crane".to_string(),
            },
            &mut rng(),
        )
        .unwrap();

    assert_eq!(plan.rolls, rolls);
    // Replays are never re-broadcast.
    assert!(!plan.broadcast);
}

#[test]
fn test_local_shared_roll_is_broadcast() {
    let mut session = RollSession::default();
    let plan = session
        .throw_dice(
            &RollSpec::from("d12"),
            &RollOptions::shared(),
            RollOrigin::Local,
            &mut rng(),
        )
        .unwrap();
    assert!(plan.broadcast);
}

#[test]
fn test_values_are_uniform_enough() {
    let mut session = RollSession::default();
    let mut rng = rng();
    let mut seen = [0u32; 7];

    for _ in 0..60 {
        let plan = session
            .throw_dice(
                &RollSpec::from("100d6"),
                &RollOptions::default(),
                RollOrigin::Local,
                &mut rng,
            )
            .unwrap();
        for roll in &plan.rolls {
            seen[roll.value as usize] += 1;
        }
        session.finish(plan.ticket);
    }

    assert_eq!(seen[0], 0);
    for (face, count) in seen.iter().enumerate().skip(1) {
        // 6000 throws, about 1000 per face.
        assert!((850..=1150).contains(count), "face {} seen {} times", face, count);
    }
}

#[test]
fn test_cancel_returns_to_idle() {
    let mut session = RollSession::default();
    let plan = session
        .throw_dice(
            &RollSpec::from("d6"),
            &RollOptions::default(),
            RollOrigin::Local,
            &mut rng(),
        )
        .unwrap();

    let cancelled = session.cancel().unwrap();
    assert_eq!(cancelled.ticket, plan.ticket);
    assert!(!session.is_rolling());
    assert!(session.cancel().is_none());
}

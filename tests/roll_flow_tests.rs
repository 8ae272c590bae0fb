//! Headless tests of the roll pipeline inside a Bevy app

use bevy::prelude::*;

use dicetray::dice3d::types::*;
use dicetray::dice3d::{read_face_value, DiceTrayPlugin, RollSession};

fn headless_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(SettingsState::new(AppSettings {
            name: "quiet-otter".to_string(),
            ..Default::default()
        }))
        .add_plugins(DiceTrayPlugin);
    app
}

fn throw(app: &mut App, notation: &str) {
    app.world_mut().write_message(ThrowDiceRequest::local(
        RollSpec::from(notation),
        RollOptions::default(),
    ));
    app.update();
}

fn settle_all(app: &mut App) {
    let world = app.world_mut();
    let mut trackers = world.query::<&mut SettleTracker>();
    for mut tracker in trackers.iter_mut(world) {
        tracker.finished = true;
    }
}

fn dice_count(app: &mut App) -> usize {
    let world = app.world_mut();
    world.query::<&Die>().iter(world).count()
}

#[test]
fn test_roll_spawns_launches_and_settles() {
    let mut app = headless_app();
    throw(&mut app, "2d6 1d20");

    assert_eq!(dice_count(&mut app), 3);
    assert!(app.world().resource::<RollSession>().is_rolling());
    {
        let world = app.world_mut();
        let pending = world.query::<&PendingLaunch>().iter(world).count();
        assert_eq!(pending, 0, "dice are launched in the frame they spawn");
    }

    let committed = app
        .world()
        .resource::<RollSession>()
        .active()
        .map(|a| a.rolls.clone())
        .unwrap();

    settle_all(&mut app);
    app.update();

    assert!(!app.world().resource::<RollSession>().is_rolling());

    let log = app.world().resource::<RollLog>();
    let lines: Vec<String> = log.visible_lines().collect();
    assert_eq!(lines, vec![format_entry("You", &committed)]);

    let world = app.world_mut();
    let mut dice = world.query::<(&Die, &Transform)>();
    for (die, transform) in dice.iter(world) {
        assert_eq!(read_face_value(transform.rotation, &die.face_normals), die.target);
    }
}

#[test]
fn test_invalid_roll_reports_error_without_dice() {
    let mut app = headless_app();
    throw(&mut app, "2d7");

    assert_eq!(dice_count(&mut app), 0);
    assert!(!app.world().resource::<RollSession>().is_rolling());

    let status = app.world().resource::<StatusMessage>();
    assert!(status.is_error);
    assert_eq!(status.text, "Unsupported dice: d7");
}

#[test]
fn test_concurrent_request_is_rejected() {
    let mut app = headless_app();
    throw(&mut app, "1d8");
    let committed = app
        .world()
        .resource::<RollSession>()
        .active()
        .map(|a| a.rolls.clone())
        .unwrap();
    throw(&mut app, "4d6");

    assert_eq!(dice_count(&mut app), 1);
    let status = app.world().resource::<StatusMessage>();
    assert_eq!(
        status.text,
        "There can be only one roll active at any given time"
    );

    // The rejected request leaves the first roll intact.
    settle_all(&mut app);
    app.update();
    let lines: Vec<String> = app.world().resource::<RollLog>().visible_lines().collect();
    assert_eq!(lines, vec![format_entry("You", &committed)]);
}

#[test]
fn test_new_roll_replaces_previous_dice() {
    let mut app = headless_app();
    throw(&mut app, "3d6");
    settle_all(&mut app);
    app.update();

    throw(&mut app, "1d12");
    assert_eq!(dice_count(&mut app), 1);
}

#[test]
fn test_cancel_removes_dice() {
    let mut app = headless_app();
    throw(&mut app, "5d10");

    app.world_mut().write_message(CancelRoll);
    app.update();

    assert_eq!(dice_count(&mut app), 0);
    assert!(!app.world().resource::<RollSession>().is_rolling());
    assert_eq!(
        app.world().resource::<StatusMessage>().text,
        "Roll was cancelled"
    );
    assert_eq!(app.world().resource::<RollLog>().entries().len(), 0);
}

#[test]
fn test_timeout_forces_completion() {
    let mut app = headless_app();
    app.world_mut()
        .resource_mut::<SettingsState>()
        .settings
        .settle_timeout_secs = 0.0;

    throw(&mut app, "4d20");
    app.update();

    assert!(!app.world().resource::<RollSession>().is_rolling());
    let entries = app.world().resource::<RollLog>().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        app.world().resource::<StatusMessage>().text,
        format!("Total {} (forced)", roll_total(&entries[0].rolls))
    );

    let world = app.world_mut();
    let mut dice = world.query::<(&Die, &Transform)>();
    for (die, transform) in dice.iter(world) {
        assert_eq!(read_face_value(transform.rotation, &die.face_normals), die.target);
    }
}

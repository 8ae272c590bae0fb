//! Roll log and persistence systems

use bevy::prelude::*;

use crate::dice3d::types::*;

/// Log local results and report what happened on the status line.
pub fn record_finished_rolls(
    mut finished: MessageReader<RollFinished>,
    mut log: ResMut<RollLog>,
    mut status: ResMut<StatusMessage>,
) {
    for roll in finished.read() {
        // Dice still moving at the deadline were snapped to their faces.
        let forced = if roll.timed_out { " (forced)" } else { "" };
        match (&roll.origin, &roll.outcome) {
            (RollOrigin::Local, Ok(rolls)) => {
                log.push(roll.origin.thrower(), rolls.clone(), true);
                *status = StatusMessage::info(format!("Total {}{}", roll_total(rolls), forced));
            }
            (RollOrigin::Local, Err(err)) => {
                *status = StatusMessage::error(err.to_string());
            }
            (RollOrigin::Remote { thrower }, Ok(rolls)) => {
                *status = StatusMessage::info(format!(
                    "{} rolled {}{}",
                    thrower,
                    roll_total(rolls),
                    forced
                ));
            }
            (RollOrigin::Remote { .. }, Err(_)) => {}
        }
    }
}

/// Show that a roll started.
pub fn announce_roll_started(
    mut pre_roll: MessageReader<PreRoll>,
    mut status: ResMut<StatusMessage>,
) {
    if let Some(roll) = pre_roll.read().last() {
        *status = StatusMessage::info(format!("Rolling {} dice...", roll.rolls.len()));
    }
}

/// Write changed settings to the preference store.
pub fn persist_settings(mut settings: ResMut<SettingsState>, store: Option<Res<PreferenceStore>>) {
    if !settings.modified {
        return;
    }
    settings.modified = false;

    let Some(store) = store else {
        return;
    };
    if let Err(e) = settings.settings.save_to_db(&store) {
        warn!("Failed to save settings: {}", e);
    }
}

/// Write the notation history when it changed.
pub fn persist_notation_history(
    mut history: ResMut<NotationHistory>,
    store: Option<Res<PreferenceStore>>,
) {
    if !history.modified {
        return;
    }
    history.modified = false;

    let Some(store) = store else {
        return;
    };
    if let Err(e) = store.save_notation_history(&history.notations) {
        warn!("Failed to save notation history: {}", e);
    }
}

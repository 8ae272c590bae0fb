//! Text overlay updates

use bevy::prelude::*;

use crate::dice3d::session::RollSession;
use crate::dice3d::types::*;

const VISIBLE_LOG_LINES: usize = 12;

/// `name @ group (sharing)`, plus the channel state when a relay runs.
pub fn player_info_line(settings: &AppSettings, link: Option<&str>) -> String {
    let sharing = if settings.share_rolls {
        "sharing"
    } else {
        "private"
    };
    match link {
        Some(link) => format!(
            "{} @ {} ({}, {})",
            settings.name, settings.group, sharing, link
        ),
        None => format!("{} @ {} ({})", settings.name, settings.group, sharing),
    }
}

pub fn update_player_info(
    settings: Res<SettingsState>,
    link: Option<Res<ShareLink>>,
    mut text_query: Query<&mut Text, With<PlayerInfoText>>,
) {
    let link_changed = link.as_ref().is_some_and(|l| l.is_changed());
    if !settings.is_changed() && !link_changed {
        return;
    }

    let line = player_info_line(&settings.settings, link.and_then(|l| l.label));
    for mut text in text_query.iter_mut() {
        text.0 = line.clone();
    }
}

pub fn update_roll_input(
    input: Res<RollInput>,
    session: Res<RollSession>,
    mut text_query: Query<&mut Text, With<RollInputText>>,
) {
    if !input.is_changed() && !session.is_changed() {
        return;
    }

    let prompt = if session.is_rolling() { "…" } else { ">" };
    for mut text in text_query.iter_mut() {
        text.0 = format!("{} {}_", prompt, input.text);
    }
}

pub fn update_status(
    status: Res<StatusMessage>,
    mut text_query: Query<(&mut Text, &mut TextColor), With<StatusText>>,
) {
    if !status.is_changed() {
        return;
    }

    for (mut text, mut color) in text_query.iter_mut() {
        text.0 = status.text.clone();
        color.0 = if status.is_error {
            Color::srgb(1.0, 0.45, 0.4)
        } else {
            Color::srgb(0.8, 0.8, 0.8)
        };
    }
}

pub fn update_roll_log(log: Res<RollLog>, mut text_query: Query<&mut Text, With<RollLogText>>) {
    if !log.is_changed() {
        return;
    }

    let lines: Vec<String> = log.visible_lines().take(VISIBLE_LOG_LINES).collect();
    for mut text in text_query.iter_mut() {
        text.0 = lines.join("\n");
    }
}

//! Input handling systems
//!
//! The roll input line takes dice notation or slash commands. Enter submits,
//! Up and Down recall earlier notations, Tab toggles sharing and Escape
//! cancels the roll in flight.

use bevy::input::keyboard::{Key, KeyboardInput};
use bevy::prelude::*;

use crate::dice3d::notation::DEFAULT_NOTATION;
use crate::dice3d::types::*;

/// Longest text accepted in the roll input.
const MAX_INPUT_LEN: usize = 120;

/// A `/command` typed into the roll input.
#[derive(Debug, Clone, PartialEq)]
pub enum SlashCommand {
    Name(String),
    Group(String),
    Color(ColorSetting),
    TextColor(ColorSetting),
    Share(bool),
    Clear,
}

/// Parse a slash command. The leading `/` is required.
pub fn parse_slash_command(input: &str) -> Result<SlashCommand, String> {
    let body = input
        .trim()
        .strip_prefix('/')
        .ok_or_else(|| "Commands start with /".to_string())?;

    let (command, argument) = match body.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (body, ""),
    };

    let required = |what: &str| -> Result<String, String> {
        if argument.is_empty() {
            Err(format!("/{} needs {}", command, what))
        } else {
            Ok(argument.to_string())
        }
    };

    let color = |what: &str| -> Result<ColorSetting, String> {
        let value = required(what)?;
        ColorSetting::parse(&value).ok_or_else(|| format!("Not a color: {}", value))
    };

    match command.to_ascii_lowercase().as_str() {
        "name" => required("a name").map(SlashCommand::Name),
        "group" => required("a group").map(SlashCommand::Group),
        "color" => color("a color").map(SlashCommand::Color),
        "text" => color("a color").map(SlashCommand::TextColor),
        "share" => match argument.to_ascii_lowercase().as_str() {
            "on" | "true" | "yes" => Ok(SlashCommand::Share(true)),
            "off" | "false" | "no" => Ok(SlashCommand::Share(false)),
            _ => Err("/share takes on or off".to_string()),
        },
        "clear" => Ok(SlashCommand::Clear),
        other => Err(format!("Unknown command /{}", other)),
    }
}

/// Apply a slash command, returning the status line to show.
pub fn apply_slash_command(
    command: SlashCommand,
    settings: &mut SettingsState,
    log: &mut RollLog,
) -> String {
    let s = &mut settings.settings;
    let status = match command {
        SlashCommand::Name(name) => {
            s.name = name;
            format!("You are now {}", s.name)
        }
        SlashCommand::Group(group) => {
            s.group = group;
            format!("Joined group {}", s.group)
        }
        SlashCommand::Color(color) => {
            s.dice_color = color;
            format!("Dice color set to {}", color.to_hex())
        }
        SlashCommand::TextColor(color) => {
            s.text_color = color;
            format!("Number color set to {}", color.to_hex())
        }
        SlashCommand::Share(share) => {
            s.share_rolls = share;
            if share {
                "Sharing rolls with your group".to_string()
            } else {
                "Rolls are private".to_string()
            }
        }
        SlashCommand::Clear => {
            log.clear();
            return "Roll log cleared".to_string();
        }
    };
    settings.modified = true;
    status
}

/// Turn submitted text into a throw request or a settings change.
pub fn submit_roll_input(
    text: &str,
    settings: &mut SettingsState,
    history: &mut NotationHistory,
    log: &mut RollLog,
) -> Result<Option<ThrowDiceRequest>, String> {
    let text = text.trim();

    if text.starts_with('/') {
        let command = parse_slash_command(text)?;
        let status = apply_slash_command(command, settings, log);
        info!("{}", status);
        return Ok(None);
    }

    let notation = if text.is_empty() { DEFAULT_NOTATION } else { text };
    history.add_notation(notation);

    let options = RollOptions {
        broadcast_before_roll: settings.settings.share_rolls,
        ..Default::default()
    };
    Ok(Some(ThrowDiceRequest::local(
        RollSpec::Notation(notation.to_string()),
        options,
    )))
}

/// Keyboard handling for the roll input line.
#[allow(clippy::too_many_arguments)]
pub fn handle_keyboard_input(
    mut keys: MessageReader<KeyboardInput>,
    mut input: ResMut<RollInput>,
    mut history: ResMut<NotationHistory>,
    mut settings: ResMut<SettingsState>,
    mut log: ResMut<RollLog>,
    mut status: ResMut<StatusMessage>,
    mut requests: MessageWriter<ThrowDiceRequest>,
    mut cancels: MessageWriter<CancelRoll>,
) {
    for key in keys.read() {
        if !key.state.is_pressed() {
            continue;
        }

        match &key.logical_key {
            Key::Enter => {
                let text = std::mem::take(&mut input.text);
                match submit_roll_input(&text, &mut settings, &mut history, &mut log) {
                    Ok(Some(request)) => {
                        requests.write(request);
                    }
                    Ok(None) => {
                        *status = StatusMessage::info(format!("{} applied", text.trim()));
                    }
                    Err(message) => {
                        *status = StatusMessage::error(message);
                        input.text = text;
                    }
                }
            }
            Key::Backspace => {
                input.text.pop();
            }
            Key::Escape => {
                cancels.write(CancelRoll);
            }
            Key::Tab => {
                let share = !settings.settings.share_rolls;
                let message = apply_slash_command(SlashCommand::Share(share), &mut settings, &mut log);
                *status = StatusMessage::info(message);
            }
            Key::ArrowUp => {
                if let Some(previous) = history.previous() {
                    input.text = previous.to_string();
                }
            }
            Key::ArrowDown => {
                input.text = history.next().map(str::to_string).unwrap_or_default();
            }
            Key::Space => push_text(&mut input.text, " "),
            Key::Character(characters) => push_text(&mut input.text, characters),
            _ => {}
        }
    }
}

fn push_text(buffer: &mut String, text: &str) {
    for c in text.chars().filter(|c| !c.is_control()) {
        if buffer.chars().count() >= MAX_INPUT_LEN {
            break;
        }
        buffer.push(c);
    }
}

//! UI-related types and components
//!
//! This module contains the text overlay markers, the roll input field and
//! the notation history used for recall with the arrow keys.

use bevy::prelude::*;

use super::database::NOTATION_HISTORY_LIMIT;

/// Marker for the player/group header text
#[derive(Component)]
pub struct PlayerInfoText;

/// Marker for the roll input line
#[derive(Component)]
pub struct RollInputText;

/// Marker for the status line (rolling, errors)
#[derive(Component)]
pub struct StatusText;

/// Marker for the roll log panel
#[derive(Component)]
pub struct RollLogText;

/// Resource for the roll input field
#[derive(Resource, Default)]
pub struct RollInput {
    pub text: String,
}

/// Last thing worth telling the player.
#[derive(Resource, Default, Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// Connection of the shared-roll channel, shown next to the player name.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareLink {
    pub label: Option<&'static str>,
}

/// Resource for storing previously thrown notations
#[derive(Resource, Default)]
pub struct NotationHistory {
    pub notations: Vec<String>,
    pub selected_index: Option<usize>,
    /// Set when the list changed and should be persisted.
    pub modified: bool,
}

impl NotationHistory {
    pub fn new(notations: Vec<String>) -> Self {
        Self {
            notations,
            ..Default::default()
        }
    }

    /// Record a notation, moving a repeat to the end.
    pub fn add_notation(&mut self, notation: &str) {
        let notation = notation.trim();
        if notation.is_empty() {
            return;
        }

        self.notations.retain(|n| n != notation);
        self.notations.push(notation.to_string());
        if self.notations.len() > NOTATION_HISTORY_LIMIT {
            self.notations.remove(0);
        }
        self.selected_index = None;
        self.modified = true;
    }

    /// Step back to an older notation.
    pub fn previous(&mut self) -> Option<&str> {
        if self.notations.is_empty() {
            return None;
        }
        let index = match self.selected_index {
            Some(0) => 0,
            Some(i) => i - 1,
            None => self.notations.len() - 1,
        };
        self.selected_index = Some(index);
        self.notations.get(index).map(String::as_str)
    }

    /// Step forward to a newer notation; past the newest clears the selection.
    pub fn next(&mut self) -> Option<&str> {
        let index = self.selected_index? + 1;
        if index >= self.notations.len() {
            self.selected_index = None;
            return None;
        }
        self.selected_index = Some(index);
        self.notations.get(index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_notation_moves_repeats_to_end() {
        let mut history = NotationHistory::default();
        history.add_notation("2d6");
        history.add_notation("d20");
        history.add_notation("2d6");
        assert_eq!(history.notations, vec!["d20", "2d6"]);
        assert!(history.modified);
    }

    #[test]
    fn test_add_notation_ignores_blank() {
        let mut history = NotationHistory::default();
        history.add_notation("   ");
        assert!(history.notations.is_empty());
    }

    #[test]
    fn test_recall_walks_back_and_forward() {
        let mut history = NotationHistory::new(vec!["1d6".into(), "2d8".into(), "3d10".into()]);
        assert_eq!(history.previous(), Some("3d10"));
        assert_eq!(history.previous(), Some("2d8"));
        assert_eq!(history.previous(), Some("1d6"));
        assert_eq!(history.previous(), Some("1d6"));
        assert_eq!(history.next(), Some("2d8"));
        assert_eq!(history.next(), Some("3d10"));
        assert_eq!(history.next(), None);
        assert_eq!(history.selected_index, None);
    }
}

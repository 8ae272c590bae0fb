//! Roll log
//!
//! Every finished roll, local or remote, becomes one line such as
//! `You threw 2d6 and 1d20: 3, 4; 17 (24)`.

use std::collections::BTreeMap;

use bevy::prelude::*;

use super::roll::{roll_total, Roll};

/// Entries kept in the log.
pub const ROLL_LOG_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LogEntryId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollLogEntry {
    pub id: LogEntryId,
    pub thrower: String,
    pub rolls: Vec<Roll>,
    /// Hidden entries are remote rolls whose replay has not settled yet.
    pub visible: bool,
}

#[derive(Resource, Debug, Default)]
pub struct RollLog {
    entries: Vec<RollLogEntry>,
    last_id: u64,
}

impl RollLog {
    pub fn push(&mut self, thrower: impl Into<String>, rolls: Vec<Roll>, visible: bool) -> LogEntryId {
        self.last_id += 1;
        let id = LogEntryId(self.last_id);
        self.entries.push(RollLogEntry {
            id,
            thrower: thrower.into(),
            rolls,
            visible,
        });

        if self.entries.len() > ROLL_LOG_LIMIT {
            let excess = self.entries.len() - ROLL_LOG_LIMIT;
            self.entries.drain(..excess);
        }

        id
    }

    /// Make an entry visible. Returns false if it is no longer in the log.
    pub fn reveal(&mut self, id: LogEntryId) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.visible = true;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: LogEntryId) {
        self.entries.retain(|e| e.id != id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[RollLogEntry] {
        &self.entries
    }

    /// Visible entries, newest first.
    pub fn visible_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.entries
            .iter()
            .rev()
            .filter(|e| e.visible)
            .map(|e| format_entry(&e.thrower, &e.rolls))
    }
}

/// Render one log line.
///
/// Dice are grouped by face count in ascending order. The groups are listed
/// as `2d6, 1d8 and 1d20`; values follow in the same grouping, separated by
/// `; `, with the total in parentheses.
pub fn format_entry(thrower: &str, rolls: &[Roll]) -> String {
    let mut groups: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for roll in rolls {
        groups.entry(roll.dice).or_default().push(roll.value);
    }

    let dice: Vec<String> = groups
        .iter()
        .map(|(faces, values)| format!("{}d{}", values.len(), faces))
        .collect();

    let dice = match dice.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} and {}", rest.join(", "), last),
        Some((last, _)) => last.clone(),
        None => String::new(),
    };

    let values = groups
        .values()
        .map(|values| {
            values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect::<Vec<_>>()
        .join("; ");

    format!("{} threw {}: {} ({})", thrower, dice, values, roll_total(rolls))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_single_group() {
        let rolls = [Roll::new(6, 3), Roll::new(6, 4)];
        assert_eq!(format_entry("You", &rolls), "You threw 2d6: 3, 4 (7)");
    }

    #[test]
    fn test_format_two_groups_uses_and() {
        let rolls = [Roll::new(20, 17), Roll::new(6, 3), Roll::new(6, 4)];
        assert_eq!(
            format_entry("You", &rolls),
            "You threw 2d6 and 1d20: 3, 4; 17 (24)"
        );
    }

    #[test]
    fn test_format_three_groups() {
        let rolls = [
            Roll::new(8, 2),
            Roll::new(10, 9),
            Roll::new(12, 11),
            Roll::new(8, 5),
        ];
        assert_eq!(
            format_entry("keen-otter", &rolls),
            "keen-otter threw 2d8, 1d10 and 1d12: 2, 5; 9; 11 (27)"
        );
    }

    #[test]
    fn test_hidden_entries_are_not_listed_until_revealed() {
        let mut log = RollLog::default();
        log.push("You", vec![Roll::new(6, 1)], true);
        let remote = log.push("swift-crane", vec![Roll::new(20, 20)], false);

        assert_eq!(log.visible_lines().count(), 1);
        assert!(log.reveal(remote));

        let lines: Vec<String> = log.visible_lines().collect();
        assert_eq!(lines[0], "swift-crane threw 1d20: 20 (20)");
        assert_eq!(lines[1], "You threw 1d6: 1 (1)");
    }

    #[test]
    fn test_log_is_bounded() {
        let mut log = RollLog::default();
        let first = log.push("You", vec![Roll::new(6, 1)], true);
        for _ in 0..ROLL_LOG_LIMIT {
            log.push("You", vec![Roll::new(6, 2)], true);
        }
        assert_eq!(log.entries().len(), ROLL_LOG_LIMIT);
        assert!(!log.reveal(first));
    }
}

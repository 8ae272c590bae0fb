//! Roll notation parsing
//!
//! Notation is a whitespace separated list of `[N]dF` terms, e.g. `2d6 d20`.
//! Parsing is lenient: terms that do not match are dropped. Validation is
//! strict and happens on the flattened list.

use std::collections::BTreeMap;

use crate::dice3d::types::{DiceType, Roll, RollError, MAX_DICE_PER_ROLL};

/// Notation used when the roll field is left empty.
pub const DEFAULT_NOTATION: &str = "2d6";

/// Leading token that is reserved and never parses to dice.
const RESERVED_PREFIX: &str = "cl";

/// One `[N]dF` term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotationTerm {
    pub count: u64,
    pub faces: u32,
}

/// Split notation into terms, silently dropping anything malformed.
pub fn parse_notation(text: &str) -> Vec<NotationTerm> {
    let mut tokens = text.split_whitespace().peekable();

    if tokens.peek() == Some(&RESERVED_PREFIX) {
        return Vec::new();
    }

    tokens.filter_map(parse_term).collect()
}

fn parse_term(token: &str) -> Option<NotationTerm> {
    let (count, faces) = token.split_once('d')?;

    let count = if count.is_empty() { 1 } else { parse_digits(count, u64::MAX)? };
    let faces = parse_digits(faces, u32::MAX)?;

    Some(NotationTerm { count, faces })
}

/// Decimal digits only. Values past `max` saturate instead of failing.
fn parse_digits<T: std::str::FromStr>(digits: &str, max: T) -> Option<T> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits.parse().unwrap_or(max))
}

/// Flatten terms into a validated list of dice.
///
/// Checks run in order: empty, too many, unsupported face count.
pub fn validate_terms(terms: &[NotationTerm]) -> Result<Vec<DiceType>, RollError> {
    let total = terms
        .iter()
        .fold(0u64, |acc, term| acc.saturating_add(term.count));

    if total == 0 {
        return Err(RollError::Parse);
    }
    if total > MAX_DICE_PER_ROLL as u64 {
        return Err(RollError::TooManyDice);
    }

    let mut dice = Vec::with_capacity(total as usize);
    for term in terms.iter().filter(|t| t.count > 0) {
        let die_type = DiceType::from_faces(term.faces).ok_or(RollError::UnsupportedDie(term.faces))?;
        dice.extend(std::iter::repeat(die_type).take(term.count as usize));
    }

    Ok(dice)
}

/// Parse and validate notation in one go.
pub fn resolve_notation(text: &str) -> Result<Vec<DiceType>, RollError> {
    validate_terms(&parse_notation(text))
}

/// Validate a pre-resolved roll list.
pub fn validate_rolls(rolls: &[Roll]) -> Result<Vec<DiceType>, RollError> {
    if rolls.is_empty() {
        return Err(RollError::Parse);
    }
    if rolls.len() > MAX_DICE_PER_ROLL {
        return Err(RollError::TooManyDice);
    }

    rolls
        .iter()
        .map(|roll| {
            let die_type =
                DiceType::from_faces(roll.dice).ok_or(RollError::UnsupportedDie(roll.dice))?;
            if roll.value == 0 || roll.value > die_type.max_value() {
                return Err(RollError::ValueOutOfRange {
                    dice: roll.dice,
                    value: roll.value,
                });
            }
            Ok(die_type)
        })
        .collect()
}

/// Canonical notation for a roll list, dice grouped by face count ("2d6 1d20").
pub fn describe_rolls(rolls: &[Roll]) -> String {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for roll in rolls {
        *counts.entry(roll.dice).or_default() += 1;
    }

    counts
        .iter()
        .map(|(faces, count)| format!("{}d{}", count, faces))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count_and_faces() {
        assert_eq!(
            parse_notation("2d6"),
            vec![NotationTerm { count: 2, faces: 6 }]
        );
        assert_eq!(
            parse_notation("d20"),
            vec![NotationTerm {
                count: 1,
                faces: 20
            }]
        );
    }

    #[test]
    fn test_parse_drops_malformed_tokens() {
        let terms = parse_notation("2d6 3dX junk d 4d -1d8 1d10");
        assert_eq!(
            terms,
            vec![
                NotationTerm { count: 2, faces: 6 },
                NotationTerm {
                    count: 1,
                    faces: 10
                }
            ]
        );
    }

    #[test]
    fn test_parse_tolerates_extra_whitespace() {
        assert_eq!(parse_notation("  2d6    d8 ").len(), 2);
    }

    #[test]
    fn test_reserved_prefix_yields_nothing() {
        assert!(parse_notation("cl 2d6").is_empty());
        assert_eq!(resolve_notation("cl 2d6"), Err(RollError::Parse));
        // Only reserved as the first token.
        assert_eq!(parse_notation("2d6 cl").len(), 1);
    }

    #[test]
    fn test_upper_case_d_is_not_notation() {
        assert_eq!(resolve_notation("2D6"), Err(RollError::Parse));
    }

    #[test]
    fn test_zero_count_contributes_nothing() {
        assert_eq!(resolve_notation("0d6"), Err(RollError::Parse));
        assert_eq!(resolve_notation("0d6 d8"), Ok(vec![DiceType::D8]));
    }

    #[test]
    fn test_huge_count_is_rejected_without_allocating() {
        assert_eq!(
            resolve_notation("99999999999999d6"),
            Err(RollError::TooManyDice)
        );
        assert_eq!(
            resolve_notation("18446744073709551615d6 18446744073709551615d6"),
            Err(RollError::TooManyDice)
        );
    }

    #[test]
    fn test_overflowing_digits_saturate() {
        assert_eq!(
            parse_notation("99999999999999999999d6"),
            vec![NotationTerm {
                count: u64::MAX,
                faces: 6
            }]
        );
        assert_eq!(
            resolve_notation("99999999999999999999d6 1d6"),
            Err(RollError::TooManyDice)
        );
        assert_eq!(
            resolve_notation("1d4294967296"),
            Err(RollError::UnsupportedDie(u32::MAX))
        );
    }

    #[test]
    fn test_too_many_is_checked_before_unsupported() {
        assert_eq!(resolve_notation("101d7"), Err(RollError::TooManyDice));
        assert_eq!(resolve_notation("2d7"), Err(RollError::UnsupportedDie(7)));
    }

    #[test]
    fn test_validate_rolls() {
        assert_eq!(
            validate_rolls(&[Roll::new(6, 3), Roll::new(20, 20)]),
            Ok(vec![DiceType::D6, DiceType::D20])
        );
        assert_eq!(validate_rolls(&[]), Err(RollError::Parse));
        assert_eq!(
            validate_rolls(&[Roll::new(4, 1)]),
            Err(RollError::UnsupportedDie(4))
        );
        assert_eq!(
            validate_rolls(&[Roll::new(6, 7)]),
            Err(RollError::ValueOutOfRange { dice: 6, value: 7 })
        );
        assert_eq!(
            validate_rolls(&[Roll::new(6, 0)]),
            Err(RollError::ValueOutOfRange { dice: 6, value: 0 })
        );
        assert_eq!(
            validate_rolls(&vec![Roll::new(6, 1); 101]),
            Err(RollError::TooManyDice)
        );
    }

    #[test]
    fn test_describe_rolls_groups_by_faces() {
        let rolls = [
            Roll::new(20, 4),
            Roll::new(6, 1),
            Roll::new(6, 5),
            Roll::new(8, 2),
        ];
        assert_eq!(describe_rolls(&rolls), "2d6 1d8 1d20");
    }
}

//! Dice-related types and components
//!
//! This module contains the die-level types: DiceType, the Die component,
//! the tray marker, launch state and the per-die settle tracker.

use bevy::prelude::*;

use super::roll::RollTicket;

/// Linear speed below which a die counts as resting.
pub const SETTLE_LINEAR_THRESHOLD: f32 = 0.1;
/// Angular speed below which a die counts as resting.
pub const SETTLE_ANGULAR_THRESHOLD: f32 = 0.1;
/// How long a die must stay below both thresholds before it is finished.
pub const SETTLE_HOLD_SECS: f32 = 0.5;

/// Component attached to each die entity
#[derive(Component)]
pub struct Die {
    pub die_type: DiceType,
    pub face_normals: Vec<(Vec3, u32)>,
    /// Value this die has to show once it settles.
    pub target: u32,
    pub ticket: RollTicket,
}

/// Marker component for the tray floor and walls
#[derive(Component)]
pub struct DiceBox;

/// Launch velocity held back until the pre-roll announcement went out.
#[derive(Component, Debug, Clone, Copy)]
pub struct PendingLaunch {
    pub linvel: Vec3,
    pub angvel: Vec3,
}

/// Marks a die whose orientation was snapped to its target value.
#[derive(Component)]
pub struct Reconciled;

/// All supported dice types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiceType {
    D6,
    D8,
    D10,
    D12,
    D20,
}

impl DiceType {
    pub const ALL: [DiceType; 5] = [
        DiceType::D6,
        DiceType::D8,
        DiceType::D10,
        DiceType::D12,
        DiceType::D20,
    ];

    pub fn max_value(&self) -> u32 {
        match self {
            DiceType::D6 => 6,
            DiceType::D8 => 8,
            DiceType::D10 => 10,
            DiceType::D12 => 12,
            DiceType::D20 => 20,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DiceType::D6 => "D6",
            DiceType::D8 => "D8",
            DiceType::D10 => "D10",
            DiceType::D12 => "D12",
            DiceType::D20 => "D20",
        }
    }

    /// Map a face count to a supported die.
    pub fn from_faces(faces: u32) -> Option<DiceType> {
        DiceType::ALL.into_iter().find(|d| d.max_value() == faces)
    }

    /// Get the physical density of the die for physics simulation.
    /// Larger dice are heavier, affecting how they roll and bounce.
    pub fn density(&self) -> f32 {
        match self {
            DiceType::D6 => 1.5,
            DiceType::D8 => 1.8,
            DiceType::D10 => 2.0,
            DiceType::D12 => 2.5,
            DiceType::D20 => 3.0,
        }
    }

    /// Get the scale factor for the die mesh.
    /// This affects both visual size and collision volume.
    pub fn scale(&self) -> f32 {
        match self {
            DiceType::D6 => 1.0,
            DiceType::D8 => 1.0,
            DiceType::D10 => 1.05,
            DiceType::D12 => 1.1,
            DiceType::D20 => 1.2,
        }
    }
}

/// Tracks how long a die has been resting.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct SettleTracker {
    pub still_for: f32,
    pub finished: bool,
}

impl SettleTracker {
    /// Feed one simulation step. Returns true once the die is finished.
    ///
    /// Finished is sticky: a die that has settled stays settled even if a
    /// neighbour nudges it afterwards.
    pub fn observe(&mut self, linvel: Vec3, angvel: Vec3, dt: f32) -> bool {
        if self.finished {
            return true;
        }

        if linvel.length() < SETTLE_LINEAR_THRESHOLD && angvel.length() < SETTLE_ANGULAR_THRESHOLD
        {
            self.still_for += dt;
            if self.still_for >= SETTLE_HOLD_SECS {
                self.finished = true;
            }
        } else {
            self.still_for = 0.0;
        }

        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dice_type_max_value() {
        assert_eq!(DiceType::D6.max_value(), 6);
        assert_eq!(DiceType::D8.max_value(), 8);
        assert_eq!(DiceType::D10.max_value(), 10);
        assert_eq!(DiceType::D12.max_value(), 12);
        assert_eq!(DiceType::D20.max_value(), 20);
    }

    #[test]
    fn test_dice_type_from_faces() {
        assert_eq!(DiceType::from_faces(6), Some(DiceType::D6));
        assert_eq!(DiceType::from_faces(20), Some(DiceType::D20));
        assert_eq!(DiceType::from_faces(4), None);
        assert_eq!(DiceType::from_faces(7), None);
        assert_eq!(DiceType::from_faces(100), None);
    }

    #[test]
    fn test_dice_type_density() {
        assert!(DiceType::D6.density() < DiceType::D8.density());
        assert!(DiceType::D8.density() < DiceType::D10.density());
        assert!(DiceType::D10.density() < DiceType::D12.density());
        assert!(DiceType::D12.density() < DiceType::D20.density());
    }

    #[test]
    fn test_settle_tracker_needs_sustained_rest() {
        let mut tracker = SettleTracker::default();
        let dt = 1.0 / 60.0;

        // 20 quiet steps is a third of a second: not yet.
        for _ in 0..20 {
            assert!(!tracker.observe(Vec3::ZERO, Vec3::ZERO, dt));
        }

        // A bounce resets the clock.
        assert!(!tracker.observe(Vec3::new(0.0, 1.0, 0.0), Vec3::ZERO, dt));
        assert_eq!(tracker.still_for, 0.0);

        let mut finished = false;
        for _ in 0..31 {
            finished = tracker.observe(Vec3::splat(0.01), Vec3::splat(0.01), dt);
        }
        assert!(finished);
    }

    #[test]
    fn test_settle_tracker_is_sticky() {
        let mut tracker = SettleTracker {
            still_for: SETTLE_HOLD_SECS,
            finished: true,
        };
        assert!(tracker.observe(Vec3::splat(5.0), Vec3::splat(5.0), 0.1));
    }
}

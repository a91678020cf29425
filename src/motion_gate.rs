//! Decides whether the remaining Cartesian error is still worth a new joint command.

use crate::kinematic_traits::Pose;
use crate::utils::translation_distance;

/// Default minimal position increment, 1 mm.
pub const DEFAULT_MIN_INCREMENT: f64 = 0.001;

/// True iff the goal position is farther than `min_increment` from the current position.
/// A distance of exactly `min_increment` does not advance. Orientation is not compared.
pub fn should_advance(current: &Pose, goal: &Pose, min_increment: f64) -> bool {
    translation_distance(goal, current) > min_increment
}

/// The gate with its threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionGate {
    pub min_increment: f64,
}

impl MotionGate {
    pub fn new(min_increment: f64) -> Self {
        MotionGate { min_increment }
    }

    pub fn should_advance(&self, current: &Pose, goal: &Pose) -> bool {
        should_advance(current, goal, self.min_increment)
    }
}

impl Default for MotionGate {
    fn default() -> Self {
        MotionGate::new(DEFAULT_MIN_INCREMENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Translation3, UnitQuaternion, Vector3};

    fn at(x: f64, y: f64, z: f64) -> Pose {
        Pose::from_parts(Translation3::new(x, y, z), UnitQuaternion::identity())
    }

    #[test]
    fn test_far_advances() {
        assert!(should_advance(&at(0.0, 0.0, 0.0), &at(0.0, 0.01, 0.0), 0.001));
    }

    #[test]
    fn test_close_holds() {
        assert!(!should_advance(&at(0.3, 0.2, 0.1), &at(0.3, 0.2, 0.1005), 0.001));
    }

    #[test]
    fn test_exact_threshold_holds() {
        // 0.5 is exact in binary, so the distance equals the threshold bit for bit.
        assert!(!should_advance(&at(0.0, 0.0, 0.0), &at(0.5, 0.0, 0.0), 0.5));
        assert!(should_advance(&at(0.0, 0.0, 0.0), &at(0.5, 0.0, 0.0), 0.4999));
    }

    #[test]
    fn test_orientation_ignored() {
        let rotated = Pose::from_parts(
            Translation3::new(0.0, 0.0, 0.0),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 1.0),
        );
        assert!(!MotionGate::default().should_advance(&at(0.0, 0.0, 0.0), &rotated));
    }
}

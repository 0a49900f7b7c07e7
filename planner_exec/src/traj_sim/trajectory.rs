//! # Trajectory

// ------------------------------------------------------------------------------------------------
// INCLUDES
// ------------------------------------------------------------------------------------------------

use serde::Serialize;

use crate::loc::{Pose, Velocity};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Cost given to a trajectory that leaves the map or hits an obstacle.
pub const INVALID_COST: f64 = -1.0;

/// Cost given to a trajectory that passed every check.
pub const VALID_COST: f64 = 0.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A simulated trajectory.
#[derive(Debug, Clone, Serialize)]
pub struct Trajectory {
    /// The poses sampled along the trajectory. For an invalid trajectory these stop at the last
    /// pose that passed the checks.
    pub poses: Vec<Pose>,

    /// The target velocity this trajectory was generated for
    pub velocity: Velocity,

    /// Negative if invalid, non-finite on a numerical fault, otherwise [`VALID_COST`].
    pub cost: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Reasons for a trajectory to be rejected.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum TrajFault {
    /// The trajectory leaves the known map or the footprint touches an obstacle.
    #[error("Trajectory leaves the map or is in collision")]
    Invalid,

    /// The footprint cost was not a finite number, which points at a bug in the world model
    /// rather than at a real obstacle.
    #[error("Trajectory cost is not finite ({0})")]
    NonFinite(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Trajectory {
    /// An empty, invalid, trajectory for the given target velocity.
    pub fn new(velocity: Velocity) -> Self {
        Self {
            poses: Vec::new(),
            velocity,
            cost: INVALID_COST,
        }
    }

    /// Classify the cost of this trajectory.
    pub fn fault(&self) -> Option<TrajFault> {
        if !self.cost.is_finite() {
            Some(TrajFault::NonFinite(self.cost))
        } else if self.cost < 0.0 {
            Some(TrajFault::Invalid)
        } else {
            None
        }
    }

    pub fn is_valid(&self) -> bool {
        self.fault().is_none()
    }

    /// Last pose of the trajectory, if any.
    pub fn end_pose(&self) -> Option<&Pose> {
        self.poses.last()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fault() {
        let mut traj = Trajectory::new(Velocity::zero());
        assert_eq!(traj.fault(), Some(TrajFault::Invalid));
        assert!(traj.end_pose().is_none());

        traj.cost = VALID_COST;
        assert!(traj.is_valid());

        traj.cost = std::f64::INFINITY;
        assert_eq!(traj.fault(), Some(TrajFault::NonFinite(std::f64::INFINITY)));

        traj.cost = std::f64::NAN;
        assert!(matches!(traj.fault(), Some(TrajFault::NonFinite(_))));
        assert!(!traj.is_valid());
    }
}

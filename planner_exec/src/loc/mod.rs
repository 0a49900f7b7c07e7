//! # Localisation module
//!
//! This module defines the planar pose and velocity types shared by the planner. Acquiring them
//! (from odometry or a localisation system) is the caller's business, the planner only consumes
//! one of each per control cycle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{UnitComplex, Vector2};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The pose (position and heading in the world frame) of the robot.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Pose {
    /// The position in the world frame
    pub position_m: Vector2<f64>,

    /// The heading of the robot, the angle to the positive world X axis, right hand rule about Z+.
    pub heading_rad: f64,
}

/// A planar velocity in the robot body frame.
///
/// Used both for the measured velocity of the robot and for commanded velocities.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Velocity {
    /// Linear velocity, X forwards and Y to the left.
    pub linear_ms: Vector2<f64>,

    /// Angular velocity about Z+, positive turns to the left.
    pub angular_rads: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self {
            position_m: Vector2::new(x_m, y_m),
            heading_rad,
        }
    }

    /// Euclidian distance between this pose's position and the given point.
    pub fn distance_to(&self, point_m: &Vector2<f64>) -> f64 {
        (point_m - self.position_m).norm()
    }

    /// Express a world frame point in the body frame of this pose.
    pub fn to_body(&self, point_m: &Vector2<f64>) -> Vector2<f64> {
        UnitComplex::new(self.heading_rad).inverse_transform_vector(&(point_m - self.position_m))
    }

    /// Express a body frame point (e.g. a footprint vertex) in the world frame.
    pub fn to_world(&self, point_m_rb: &Vector2<f64>) -> Vector2<f64> {
        self.position_m + UnitComplex::new(self.heading_rad).transform_vector(point_m_rb)
    }

    /// True if every component of the pose is finite.
    pub fn is_finite(&self) -> bool {
        self.position_m.iter().all(|v| v.is_finite()) && self.heading_rad.is_finite()
    }
}

impl Velocity {
    pub fn new(x_ms: f64, y_ms: f64, angular_rads: f64) -> Self {
        Self {
            linear_ms: Vector2::new(x_ms, y_ms),
            angular_rads,
        }
    }

    /// The zero velocity, commanding a full stop.
    pub fn zero() -> Self {
        Self::default()
    }

    /// A rotation on the spot at the given rate.
    pub fn in_place(angular_rads: f64) -> Self {
        Self::new(0.0, 0.0, angular_rads)
    }

    /// Returns `true` if there is no translational component.
    pub fn is_in_place(&self) -> bool {
        self.linear_ms[0] == 0.0 && self.linear_ms[1] == 0.0
    }

    /// True if every component of the velocity is finite.
    pub fn is_finite(&self) -> bool {
        self.linear_ms.iter().all(|v| v.is_finite()) && self.angular_rads.is_finite()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_body_transform() {
        let pose = Pose::new(1.0, 1.0, FRAC_PI_2);

        // A point directly "north" of the robot is straight ahead when facing +Y
        let body = pose.to_body(&Vector2::new(1.0, 3.0));
        assert!((body[0] - 2.0).abs() < 1e-9);
        assert!(body[1].abs() < 1e-9);

        // A point to the east is on the robot's right
        let body = pose.to_body(&Vector2::new(2.0, 1.0));
        assert!(body[0].abs() < 1e-9);
        assert!((body[1] + 1.0).abs() < 1e-9);

        // Round trip
        let world = pose.to_world(&Vector2::new(0.3, -0.2));
        let back = pose.to_body(&world);
        assert!((back - Vector2::new(0.3, -0.2)).norm() < 1e-9);
    }

    #[test]
    fn test_finite() {
        assert!(Pose::new(0.0, 0.0, 0.0).is_finite());
        assert!(!Pose::new(std::f64::NAN, 0.0, 0.0).is_finite());
        assert!(!Pose::new(0.0, 0.0, std::f64::INFINITY).is_finite());
    }
}

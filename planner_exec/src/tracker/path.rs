//! # Path
//!
//! The sequence of waypoints followed by the tracker.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::loc::Pose;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A path to follow, as an ordered list of waypoint poses.
///
/// Only the heading of the last pose is used, as the goal heading.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Path {
    pub poses: Vec<Pose>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PathError {
    #[error("Waypoint separation must be finite and greater than zero, found {0}")]
    InvalidSeparation(f64),

    #[error("Cannot build a path between non-finite poses")]
    NonFinitePose,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Path {
    /// Create a new empty path
    pub fn new_empty() -> Self {
        Self::default()
    }

    pub fn from_poses(poses: Vec<Pose>) -> Self {
        Self { poses }
    }

    /// Produces a direct path between the two poses, with each waypoint at most `point_sep_m`
    /// from the previous one.
    ///
    /// Waypoints face along the line, except for the last one which keeps the heading of `to`.
    pub fn direct(from: &Pose, to: &Pose, point_sep_m: f64) -> Result<Self, PathError> {
        if !point_sep_m.is_finite() || point_sep_m <= 0.0 {
            return Err(PathError::InvalidSeparation(point_sep_m));
        }

        if !from.is_finite() || !to.is_finite() {
            return Err(PathError::NonFinitePose);
        }

        let diff_vec = to.position_m - from.position_m;
        let dist = diff_vec.norm();
        let heading_rad = diff_vec.y.atan2(diff_vec.x);

        // Round the number of segments up so no two points end up more than the separation apart
        let num_segments = ((dist / point_sep_m).ceil() as usize).max(1);
        let delta = diff_vec / num_segments as f64;

        let mut poses: Vec<Pose> = (0..num_segments)
            .map(|i| {
                let p = from.position_m + delta * i as f64;
                Pose::new(p.x, p.y, heading_rad)
            })
            .collect();
        poses.push(*to);

        Ok(Self { poses })
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// The start of the path, if any.
    pub fn start(&self) -> Option<&Pose> {
        self.poses.first()
    }

    /// The goal of the path, if any.
    pub fn goal(&self) -> Option<&Pose> {
        self.poses.last()
    }

    /// Return the length of the path in meters.
    pub fn get_length(&self) -> f64 {
        self.poses
            .windows(2)
            .map(|w| w[1].distance_to(&w[0].position_m))
            .sum()
    }

    /// Indices of any waypoints which contain non-finite values.
    pub fn invalid_indices(&self) -> Vec<usize> {
        self.poses
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_finite())
            .map(|(i, _)| i)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

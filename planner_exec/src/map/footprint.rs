//! # Robot footprint

// ------------------------------------------------------------------------------------------------
// INCLUDES
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::loc::Pose;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The outline of the robot as a polygon in the robot body frame.
///
/// The inscribed and circumscribed radii are computed once on construction.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(from = "Vec<[f64; 2]>", into = "Vec<[f64; 2]>")]
pub struct Footprint {
    points_m_rb: Vec<Vector2<f64>>,

    /// Radius of the largest circle about the robot centre that fits inside the footprint
    inscribed_radius_m: f64,

    /// Radius of the smallest circle about the robot centre that contains the footprint
    circumscribed_radius_m: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Footprint {
    /// Create a footprint from its vertices, in order around the polygon.
    pub fn new(points_m_rb: Vec<Vector2<f64>>) -> Self {
        let mut inscribed_radius_m = std::f64::INFINITY;
        let mut circumscribed_radius_m = 0f64;

        for (i, point) in points_m_rb.iter().enumerate() {
            let next = &points_m_rb[(i + 1) % points_m_rb.len()];

            let vertex_dist = point.norm();
            let edge_dist = distance_to_segment(&Vector2::zeros(), point, next);

            inscribed_radius_m = inscribed_radius_m.min(vertex_dist).min(edge_dist);
            circumscribed_radius_m = circumscribed_radius_m.max(vertex_dist).max(edge_dist);
        }

        if points_m_rb.is_empty() {
            inscribed_radius_m = 0.0;
        }

        Self {
            points_m_rb,
            inscribed_radius_m,
            circumscribed_radius_m,
        }
    }

    /// A rectangle centred on the robot, `length_m` along the body X axis.
    pub fn rectangle(length_m: f64, width_m: f64) -> Self {
        let (hl, hw) = (0.5 * length_m, 0.5 * width_m);

        Self::new(vec![
            Vector2::new(hl, hw),
            Vector2::new(-hl, hw),
            Vector2::new(-hl, -hw),
            Vector2::new(hl, -hw),
        ])
    }

    pub fn points_m_rb(&self) -> &[Vector2<f64>] {
        &self.points_m_rb
    }

    pub fn inscribed_radius_m(&self) -> f64 {
        self.inscribed_radius_m
    }

    pub fn circumscribed_radius_m(&self) -> f64 {
        self.circumscribed_radius_m
    }

    /// Vertices of the footprint placed at the given pose, in the world frame.
    pub fn at_pose(&self, pose: &Pose) -> Vec<Vector2<f64>> {
        self.points_m_rb.iter().map(|p| pose.to_world(p)).collect()
    }
}

impl From<Vec<[f64; 2]>> for Footprint {
    fn from(points: Vec<[f64; 2]>) -> Self {
        Self::new(points.iter().map(|p| Vector2::new(p[0], p[1])).collect())
    }
}

impl From<Footprint> for Vec<[f64; 2]> {
    fn from(footprint: Footprint) -> Self {
        footprint.points_m_rb.iter().map(|p| [p.x, p.y]).collect()
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Shortest distance between `point` and the segment from `start` to `end`.
fn distance_to_segment(point: &Vector2<f64>, start: &Vector2<f64>, end: &Vector2<f64>) -> f64 {
    let seg = end - start;
    let len_sq = seg.norm_squared();

    if len_sq == 0.0 {
        return (point - start).norm();
    }

    let t = ((point - start).dot(&seg) / len_sq).max(0.0).min(1.0);

    (point - (start + seg * t)).norm()
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

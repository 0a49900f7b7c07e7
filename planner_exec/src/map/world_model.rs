//! # World model
//!
//! Scores a full robot footprint placed at a pose.

// ------------------------------------------------------------------------------------------------
// INCLUDES
// ------------------------------------------------------------------------------------------------

use std::sync::Arc;

use nalgebra::Vector2;

use super::CostMap;
use crate::loc::Pose;
use crate::raster;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Something which knows how costly it is for the robot to occupy a given pose.
pub trait WorldModel {
    /// Cost of placing the footprint polygon (body frame) at `pose`, or `None` if the footprint
    /// would touch an obstacle or unknown space.
    ///
    /// The radii are those of the footprint and may be used for cheap pre-checks.
    fn footprint_cost(
        &self,
        pose: &Pose,
        footprint_m_rb: &[Vector2<f64>],
        inscribed_radius_m: f64,
        circumscribed_radius_m: f64,
    ) -> Option<f64>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A [`WorldModel`] which checks the footprint outline against a [`CostMap`].
///
/// The robot centre cell must be traversable, then every edge of the polygon is ray traced. The
/// interior of the polygon is not checked, it is assumed that obstacles are inflated by at least
/// the inscribed radius.
#[derive(Debug, Clone)]
pub struct GridWorldModel<M> {
    cost_map: M,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<T: WorldModel + ?Sized> WorldModel for &T {
    fn footprint_cost(
        &self,
        pose: &Pose,
        footprint_m_rb: &[Vector2<f64>],
        inscribed_radius_m: f64,
        circumscribed_radius_m: f64,
    ) -> Option<f64> {
        (**self).footprint_cost(pose, footprint_m_rb, inscribed_radius_m, circumscribed_radius_m)
    }
}

impl<T: WorldModel + ?Sized> WorldModel for Arc<T> {
    fn footprint_cost(
        &self,
        pose: &Pose,
        footprint_m_rb: &[Vector2<f64>],
        inscribed_radius_m: f64,
        circumscribed_radius_m: f64,
    ) -> Option<f64> {
        (**self).footprint_cost(pose, footprint_m_rb, inscribed_radius_m, circumscribed_radius_m)
    }
}

impl<M: CostMap> GridWorldModel<M> {
    pub fn new(cost_map: M) -> Self {
        Self { cost_map }
    }
}

impl<M: CostMap> WorldModel for GridWorldModel<M> {
    fn footprint_cost(
        &self,
        pose: &Pose,
        footprint_m_rb: &[Vector2<f64>],
        _inscribed_radius_m: f64,
        _circumscribed_radius_m: f64,
    ) -> Option<f64> {
        let centre = self.cost_map.world_to_map(&pose.position_m)?;
        let centre_cost = raster::point_cost(&self.cost_map, centre)?;

        // Not a polygon, the centre is all there is to check
        if footprint_m_rb.len() < 3 {
            return Some(centre_cost);
        }

        let cells = footprint_m_rb
            .iter()
            .map(|p| self.cost_map.world_to_map(&pose.to_world(p)))
            .collect::<Option<Vec<_>>>()?;

        let mut footprint_cost = 0f64;

        for (i, cell) in cells.iter().enumerate() {
            let next = cells[(i + 1) % cells.len()];

            footprint_cost = footprint_cost.max(raster::line_cost(&self.cost_map, *cell, next)?);
        }

        Some(footprint_cost)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

//! # Planner Executable Parameters
//!
//! This module provide parameters for the planner executable, which drives a simulated robot
//! along a straight path through a static map.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::{
    loc::Pose,
    map::{CostGrid, CostGridError, Footprint},
    tracker::{self, Path, PathError},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PlannerExecParams {
    /// Maximum number of control cycles before giving up
    pub max_cycles: u64,

    /// If true each cycle waits for the controller period, otherwise the simulation runs as fast
    /// as possible
    pub realtime: bool,

    /// Number of consecutive failed cycles after which the run is aborted
    pub max_consec_failures: u64,

    /// Start pose as `[x, y, heading]`
    pub start: [f64; 3],

    /// Goal pose as `[x, y, heading]`
    pub goal: [f64; 3],

    /// Maximum separation between the waypoints of the path
    pub waypoint_sep_m: f64,

    /// Footprint polygon vertices in the robot body frame
    pub footprint: Footprint,

    pub map: MapParams,

    pub tracker: tracker::Params,

    /// Rectangular regions of the map with a fixed cost
    #[serde(default)]
    pub obstacles: Vec<ObstacleParams>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MapParams {
    pub num_cells: [usize; 2],
    pub resolution_m: f64,

    /// Position of the lower corner of the map
    pub origin_m: [f64; 2],

    /// Cost of every cell not covered by an obstacle
    #[serde(default)]
    pub default_cost: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ObstacleParams {
    pub min_m: [f64; 2],
    pub max_m: [f64; 2],
    pub cost: u8,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PlannerExecParams {
    pub fn start_pose(&self) -> Pose {
        Pose::new(self.start[0], self.start[1], self.start[2])
    }

    pub fn goal_pose(&self) -> Pose {
        Pose::new(self.goal[0], self.goal[1], self.goal[2])
    }

    /// Build the cost map with all obstacles applied.
    pub fn build_map(&self) -> Result<CostGrid, CostGridError> {
        let mut map = CostGrid::new(
            Vector2::new(self.map.num_cells[0], self.map.num_cells[1]),
            self.map.resolution_m,
            Vector2::new(self.map.origin_m[0], self.map.origin_m[1]),
            self.map.default_cost,
        )?;

        for obstacle in &self.obstacles {
            map.set_rect_cost(
                Vector2::new(obstacle.min_m[0], obstacle.min_m[1]),
                Vector2::new(obstacle.max_m[0], obstacle.max_m[1]),
                obstacle.cost,
            )?;
        }

        Ok(map)
    }

    /// Build the direct path from the start to the goal.
    pub fn build_path(&self) -> Result<Path, PathError> {
        Path::direct(&self.start_pose(), &self.goal_pose(), self.waypoint_sep_m)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::map::{CostMap, LETHAL_OBSTACLE, NO_INFORMATION};

    const PARAMS: &str = r#"
        max_cycles = 100
        realtime = false
        max_consec_failures = 10
        start = [0.0, 0.0, 0.0]
        goal = [2.0, 0.0, 1.0]
        waypoint_sep_m = 0.5
        footprint = [[0.2, 0.2], [-0.2, 0.2], [-0.2, -0.2], [0.2, -0.2]]

        [map]
        num_cells = [40, 20]
        resolution_m = 0.1
        origin_m = [-1.0, -1.0]

        [tracker]
        max_trans_acc_ms2 = 2.5
        max_rot_acc_rads2 = 3.2
        max_trans_vel_ms = 0.5
        min_trans_vel_ms = 0.1
        max_rot_vel_rads = 1.0
        min_rot_vel_rads = 0.4
        min_in_place_rot_vel_rads = 0.4
        yaw_goal_tolerance_rad = 0.05
        xy_goal_tolerance_m = 0.1
        wp_tolerance_m = 0.5
        sim_time_s = 1.0
        sim_granularity_m = 0.025
        angular_sim_granularity_rad = 0.1
        controller_freq_hz = 20.0

        [[obstacles]]
        min_m = [1.0, 0.5]
        max_m = [1.2, 0.7]
        cost = 254

        [[obstacles]]
        min_m = [-1.0, -1.0]
        max_m = [-0.95, 0.95]
        cost = 255
    "#;

    #[test]
    fn test_load() {
        let params: PlannerExecParams = util::params::load_str(PARAMS).unwrap();

        assert_eq!(params.footprint, Footprint::rectangle(0.4, 0.4));
        assert_eq!(params.obstacles.len(), 2);
        assert_eq!(params.tracker.validate(), Ok(()));

        let map = params.build_map().unwrap();
        assert_eq!(map.num_cells(), Vector2::new(40, 20));
        assert_eq!(map.origin_m(), Vector2::new(-1.0, -1.0));
        assert_eq!(
            map.cell_cost(map.world_to_map(&Vector2::new(1.1, 0.6)).unwrap()),
            LETHAL_OBSTACLE
        );
        assert_eq!(map.count_cost(NO_INFORMATION), 20);

        let path = params.build_path().unwrap();
        assert_eq!(path.len(), 5);
        assert_eq!(path.goal(), Some(&Pose::new(2.0, 0.0, 1.0)));
    }
}

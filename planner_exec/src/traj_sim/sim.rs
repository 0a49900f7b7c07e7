//! # Forward simulation of velocity commands

// ------------------------------------------------------------------------------------------------
// INCLUDES
// ------------------------------------------------------------------------------------------------

use log::{trace, warn};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::{TrajFault, Trajectory, VALID_COST};
use crate::{
    loc::{Pose, Velocity},
    map::{CostMap, Footprint, WorldModel},
};
use util::maths::approach;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Upper bound on the number of samples in a single trajectory.
pub const MAX_SIM_STEPS: usize = 10_000;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Horizon and sampling resolution of the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    /// Total time simulated forward
    pub sim_time_s: f64,

    /// Maximum distance travelled between two samples
    pub sim_granularity_m: f64,

    /// Maximum rotation between two samples
    pub angular_sim_granularity_rad: f64,
}

/// Acceleration limits applied independently to each velocity axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccLimits {
    pub linear_ms2: Vector2<f64>,
    pub angular_rads2: f64,
}

/// Simulates trajectories for a robot with a given footprint against a map and world model.
pub struct TrajSim<'a, M: ?Sized, W: ?Sized> {
    cost_map: &'a M,
    world_model: &'a W,
    footprint: &'a Footprint,
    params: SimParams,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimParams {
    /// Number of samples needed to keep every step within the granularities, before rounding.
    pub fn step_count(&self, target_vel: &Velocity) -> f64 {
        let linear_steps = target_vel.linear_ms.norm() * self.sim_time_s / self.sim_granularity_m;
        let angular_steps = target_vel.angular_rads.abs() / self.angular_sim_granularity_rad;

        // f64::max ignores NaNs
        if linear_steps.is_nan() || angular_steps.is_nan() {
            return std::f64::NAN;
        }

        linear_steps.max(angular_steps)
    }
}

impl AccLimits {
    pub fn new(x_ms2: f64, y_ms2: f64, angular_rads2: f64) -> Self {
        Self {
            linear_ms2: Vector2::new(x_ms2, y_ms2),
            angular_rads2,
        }
    }
}

impl<'a, M, W> TrajSim<'a, M, W>
where
    M: CostMap + ?Sized,
    W: WorldModel + ?Sized,
{
    pub fn new(
        cost_map: &'a M,
        world_model: &'a W,
        footprint: &'a Footprint,
        params: SimParams,
    ) -> Self {
        Self {
            cost_map,
            world_model,
            footprint,
            params,
        }
    }

    /// Number of samples needed to simulate the target velocity at the configured granularity.
    ///
    /// Always at least one so that the start pose is checked, and at most [`MAX_SIM_STEPS`], in
    /// which case the steps are longer than the granularity. `None` if the target velocity is not
    /// finite.
    pub fn num_steps(&self, target_vel: &Velocity) -> Option<usize> {
        let steps = self.params.step_count(target_vel);

        if !steps.is_finite() {
            return None;
        }

        Some((steps.ceil().min(MAX_SIM_STEPS as f64) as usize).max(1))
    }

    /// Simulate the robot starting at `start_pose` with `start_vel`, accelerating towards
    /// `target_vel`.
    ///
    /// Simulation stops at the first sample which is off the map or whose footprint is not
    /// clear, leaving the trajectory with a negative cost.
    pub fn generate_trajectory(
        &self,
        start_pose: &Pose,
        start_vel: &Velocity,
        target_vel: &Velocity,
        acc_lim: &AccLimits,
    ) -> Trajectory {
        let mut traj = Trajectory::new(*target_vel);

        let num_steps = match self.num_steps(target_vel) {
            Some(n) => n,
            None => {
                traj.cost = std::f64::NAN;
                return traj;
            }
        };
        let dt = self.params.sim_time_s / num_steps as f64;

        let mut pose = *start_pose;
        let mut vel = *start_vel;

        traj.poses.reserve(num_steps);

        for step in 0..num_steps {
            if self.cost_map.world_to_map(&pose.position_m).is_none() {
                trace!("Trajectory leaves the map at step {} ({:?})", step, pose);
                return traj;
            }

            match self.world_model.footprint_cost(
                &pose,
                self.footprint.points_m_rb(),
                self.footprint.inscribed_radius_m(),
                self.footprint.circumscribed_radius_m(),
            ) {
                None => {
                    trace!("Trajectory in collision at step {} ({:?})", step, pose);
                    return traj;
                }
                Some(c) if !c.is_finite() => {
                    traj.cost = c;
                    return traj;
                }
                Some(_) => (),
            }

            traj.poses.push(pose);

            for i in 0..2 {
                vel.linear_ms[i] = approach(
                    target_vel.linear_ms[i],
                    vel.linear_ms[i],
                    acc_lim.linear_ms2[i] * dt,
                );
            }
            vel.angular_rads = approach(
                target_vel.angular_rads,
                vel.angular_rads,
                acc_lim.angular_rads2 * dt,
            );

            pose = integrate(&pose, &vel, dt);
        }

        traj.cost = VALID_COST;
        traj
    }

    /// Generate a trajectory and report whether it can be driven.
    pub fn check_trajectory(
        &self,
        start_pose: &Pose,
        start_vel: &Velocity,
        target_vel: &Velocity,
        acc_lim: &AccLimits,
    ) -> Result<(), TrajFault> {
        let traj = self.generate_trajectory(start_pose, start_vel, target_vel, acc_lim);

        match traj.fault() {
            None => Ok(()),
            Some(TrajFault::NonFinite(c)) => {
                warn!(
                    "Numeric fault simulating from {:?} at {:?}: footprint cost is {}",
                    start_pose, start_vel, c
                );
                Err(TrajFault::NonFinite(c))
            }
            Some(f) => {
                warn!(
                    "Invalid trajectory from {:?} at {:?} (target {:?}), {} of {:?} samples clear",
                    start_pose,
                    start_vel,
                    target_vel,
                    traj.poses.len(),
                    self.num_steps(target_vel)
                );
                Err(f)
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Advance a pose by one step of `dt` seconds at the given body frame velocity.
pub fn integrate(pose: &Pose, vel: &Velocity, dt: f64) -> Pose {
    let (sin, cos) = pose.heading_rad.sin_cos();
    let (vx, vy) = (vel.linear_ms.x, vel.linear_ms.y);

    Pose::new(
        pose.position_m.x + (vx * cos - vy * sin) * dt,
        pose.position_m.y + (vx * sin + vy * cos) * dt,
        pose.heading_rad + vel.angular_rads * dt,
    )
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

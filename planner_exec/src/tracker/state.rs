//! Path tracker state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, info, trace, warn};
use serde::Serialize;

use super::{Params, ParamsError, Path};
use crate::{
    loc::{Pose, Velocity},
    map::{CostMap, Footprint, WorldModel},
    traj_sim::TrajSim,
};
use util::maths::{lin_map, signed_by};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Above this heading error to the waypoint the robot slows down and turns on the spot.
const ROTATE_TO_WP_THRESHOLD_RAD: f64 = 0.75;

/// Below this distance to the goal the speed demands are scaled down linearly.
const NEAR_GOAL_DIST_M: f64 = 1.5;

/// Heading errors below this don't produce any angular demand.
const HEADING_DEADBAND_RAD: f64 = 0.1;

/// An invalid command is replaced by a rotation on the spot if the heading error is above this,
/// otherwise the robot stops.
const FALLBACK_ROTATE_THRESHOLD_RAD: f64 = 0.09;

/// Linear demands below this are emitted even if they fail validation.
const NEGLIGIBLE_LINEAR_VEL_MS: f64 = 1e-4;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Tracks a path, producing a velocity command each cycle.
///
/// All of the mutable state sits behind a single lock, so plan updates, reconfigurations and
/// command computations are never observed half done.
pub struct PathTracker<M, W> {
    cost_map: M,
    world_model: W,
    footprint: Footprint,

    inner: Mutex<Inner>,
}

struct Inner {
    path: Path,
    start_pose: Pose,
    goal_pose: Pose,

    state: TrackerState,

    params: Params,

    /// Incremented on every successful reconfiguration
    params_version: u64,
}

/// Progress along the current path.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Progress {
    /// Index of the waypoint currently steered towards
    pub wp_index: usize,

    /// Set when a new plan has been given, the waypoint index is then searched for on the next
    /// tracking cycle.
    pub replan_pending: bool,
}

/// The status report containing the outcome of a cycle and various monitoring quantities.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct StatusReport {
    /// False if no safe command could be found this cycle
    pub success: bool,

    /// The mode of the tracker at the end of the cycle
    pub mode: TrackerMode,

    /// Index of the waypoint steered towards, if tracking
    pub wp_index: Option<usize>,

    pub dist_to_goal_m: f64,
    pub dist_to_start_m: f64,
    pub dist_to_wp_m: f64,

    /// Heading error to the waypoint when tracking, or to the goal heading when aligning
    pub heading_err_rad: f64,

    /// Set if the shaped command was rejected and replaced
    pub fallback: Option<Fallback>,

    /// Version of the parameters used this cycle
    pub params_version: u64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors that can occur during processing of the module.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrackerError {
    #[error("Invalid parameters: {0}")]
    InvalidParams(ParamsError),

    /// Attempted to load a plan containing non-finite poses. The contained vector provides the
    /// indices of the poses which were invalid.
    #[error("Plan contains non-finite poses at index(s) {0:?}")]
    PlanContainsNonFinite(Vec<usize>),
}

/// The state of the tracker. Each tracking state is handled by a `mode_xyz` function.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TrackerState {
    /// No path to follow
    Idle,

    /// Following the path towards the goal position
    Tracking(Progress),

    /// At the goal position, turning to the goal heading
    GoalAlignment(Progress),

    /// The goal has been reached and this hasn't been reported yet
    GoalReached,
}

/// Mode of the tracker, without the progress data.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum TrackerMode {
    Idle,
    Tracking,
    GoalAlignment,
    GoalReached,
}

/// Commands used in place of a rejected command.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum Fallback {
    RotateInPlace,
    Stop,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for TrackerMode {
    fn default() -> Self {
        Self::Idle
    }
}

impl TrackerState {
    pub fn mode(&self) -> TrackerMode {
        match self {
            Self::Idle => TrackerMode::Idle,
            Self::Tracking(_) => TrackerMode::Tracking,
            Self::GoalAlignment(_) => TrackerMode::GoalAlignment,
            Self::GoalReached => TrackerMode::GoalReached,
        }
    }

    pub fn progress(&self) -> Option<Progress> {
        match self {
            Self::Tracking(p) | Self::GoalAlignment(p) => Some(*p),
            _ => None,
        }
    }
}

impl<M, W> PathTracker<M, W>
where
    M: CostMap,
    W: WorldModel,
{
    /// Create a new idle tracker.
    pub fn new(
        cost_map: M,
        world_model: W,
        footprint: Footprint,
        params: Params,
    ) -> Result<Self, TrackerError> {
        params.validate().map_err(TrackerError::InvalidParams)?;

        Ok(Self {
            cost_map,
            world_model,
            footprint,
            inner: Mutex::new(Inner {
                path: Path::new_empty(),
                start_pose: Pose::default(),
                goal_pose: Pose::default(),
                state: TrackerState::Idle,
                params,
                params_version: 0,
            }),
        })
    }

    /// Replace the path being followed.
    ///
    /// A non-empty path restarts tracking from its beginning, the waypoint to steer to is
    /// searched for on the next cycle. An empty path makes the tracker idle. A path containing
    /// non-finite poses is rejected and the current one is kept. In all cases any unreported goal
    /// arrival is discarded.
    pub fn update_plan(&self, path: Path) -> Result<(), TrackerError> {
        let mut inner = self.lock();

        if inner.state == TrackerState::GoalReached {
            inner.state = TrackerState::Idle;
        }

        let invalid = path.invalid_indices();
        if !invalid.is_empty() {
            warn!("Plan rejected, non-finite poses at {:?}", invalid);
            return Err(TrackerError::PlanContainsNonFinite(invalid));
        }

        match (path.start(), path.goal()) {
            (Some(start), Some(goal)) => {
                info!(
                    "New plan with {} waypoints accepted, goal at {:?}",
                    path.len(),
                    goal
                );

                inner.start_pose = *start;
                inner.goal_pose = *goal;
                inner.state = TrackerState::Tracking(Progress {
                    wp_index: 0,
                    replan_pending: true,
                });
            }
            _ => {
                warn!("Empty plan received, tracker is now idle");
                inner.state = TrackerState::Idle;
            }
        }

        inner.path = path;

        Ok(())
    }

    /// Compute the velocity command for the current cycle.
    ///
    /// A command is always returned, `StatusReport::success` is false if the robot had to be
    /// stopped because no safe command exists.
    pub fn compute_command(&self, pose: &Pose, velocity: &Velocity) -> (Velocity, StatusReport) {
        let mut inner = self.lock();

        let mut report = StatusReport {
            success: true,
            params_version: inner.params_version,
            ..Default::default()
        };

        let (state, cmd) = match inner.state {
            TrackerState::Idle => (TrackerState::Idle, Velocity::zero()),
            // The arrival is only reportable until the next cycle
            TrackerState::GoalReached => (TrackerState::Idle, Velocity::zero()),
            s if !pose.is_finite() || !velocity.is_finite() => {
                warn!(
                    "Non-finite pose ({:?}) or velocity ({:?}) given, stopping",
                    pose, velocity
                );
                report.success = false;
                (s, Velocity::zero())
            }
            TrackerState::Tracking(progress) => {
                self.mode_tracking(&inner, progress, pose, velocity, &mut report)
            }
            TrackerState::GoalAlignment(progress) => {
                self.mode_goal_alignment(&inner, progress, pose, velocity, &mut report)
            }
        };

        inner.state = state;
        report.mode = state.mode();
        report.wp_index = state.progress().map(|p| p.wp_index);

        trace!("Tracker cycle: {:?} -> {:?}", report, cmd);

        (cmd, report)
    }

    /// Returns `true` exactly once per goal arrival.
    pub fn is_goal_reached(&self) -> bool {
        let mut inner = self.lock();

        if inner.state == TrackerState::GoalReached {
            inner.state = TrackerState::Idle;
            true
        } else {
            false
        }
    }

    /// Discard any unreported goal arrival.
    pub fn reset_goal(&self) {
        let mut inner = self.lock();

        if inner.state == TrackerState::GoalReached {
            inner.state = TrackerState::Idle;
        }
    }

    /// Replace all parameters at once, returning the new parameter version.
    pub fn reconfigure(&self, params: Params) -> Result<u64, TrackerError> {
        params.validate().map_err(TrackerError::InvalidParams)?;

        let mut inner = self.lock();
        inner.params = params;
        inner.params_version += 1;

        info!("Tracker reconfigured (version {})", inner.params_version);

        Ok(inner.params_version)
    }

    /// The current parameters and their version.
    pub fn params(&self) -> (u64, Params) {
        let inner = self.lock();
        (inner.params_version, inner.params.clone())
    }

    pub fn state(&self) -> TrackerState {
        self.lock().state
    }

    pub fn footprint(&self) -> &Footprint {
        &self.footprint
    }

    fn lock(&self) -> MutexGuard<Inner> {
        // The state is always left consistent, so a panic elsewhere doesn't invalidate it
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<M, W> PathTracker<M, W>
where
    M: CostMap,
    W: WorldModel,
{
    fn mode_tracking(
        &self,
        inner: &Inner,
        mut progress: Progress,
        pose: &Pose,
        velocity: &Velocity,
        report: &mut StatusReport,
    ) -> (TrackerState, Velocity) {
        let params = &inner.params;
        let poses = &inner.path.poses;

        let dist_goal = pose.distance_to(&inner.goal_pose.position_m);
        report.dist_to_goal_m = dist_goal;
        report.dist_to_start_m = pose.distance_to(&inner.start_pose.position_m);

        if dist_goal < params.xy_goal_tolerance_m {
            debug!("Within {} m of the goal, aligning", params.xy_goal_tolerance_m);
            return self.mode_goal_alignment(inner, progress, pose, velocity, report);
        }

        // On a new plan jump to the furthest waypoint already within tolerance
        if progress.replan_pending {
            progress.wp_index = poses
                .iter()
                .rposition(|wp| pose.distance_to(&wp.position_m) < params.wp_tolerance_m)
                .unwrap_or(0);
            progress.replan_pending = false;

            debug!("Tracking from waypoint {}", progress.wp_index);
        }

        while progress.wp_index + 1 < poses.len()
            && pose.distance_to(&poses[progress.wp_index].position_m) < params.wp_tolerance_m
        {
            progress.wp_index += 1;
        }

        let wp = match poses.get(progress.wp_index) {
            Some(wp) => wp,
            None => {
                warn!("Tracking without a path, stopping");
                report.success = false;
                return (TrackerState::Idle, Velocity::zero());
            }
        };

        let wp_local = pose.to_body(&wp.position_m);
        let heading_err = wp_local.y.atan2(wp_local.x);
        let dist_wp = pose.distance_to(&wp.position_m);

        report.dist_to_wp_m = dist_wp;
        report.heading_err_rad = heading_err;

        let mut vx;
        let mut vt;

        if heading_err.abs() > ROTATE_TO_WP_THRESHOLD_RAD {
            vx = (velocity.linear_ms.x - 1.0 / params.controller_freq_hz).max(0.0);
            vt = signed_by(params.min_in_place_rot_vel_rads, heading_err);
        } else if dist_goal < NEAR_GOAL_DIST_M {
            let range = (0.0, NEAR_GOAL_DIST_M);
            vx = lin_map(
                range,
                (params.min_trans_vel_ms, params.max_trans_vel_ms),
                dist_goal,
            );
            vt = lin_map(
                range,
                (params.min_rot_vel_rads, params.max_rot_vel_rads),
                dist_goal,
            );

            if heading_err < 0.0 {
                vt = -vt;
            }
        } else {
            vx = params.max_trans_vel_ms * (-heading_err.abs()).exp() * (4.0 * dist_wp).tanh();
            vt = params.max_rot_vel_rads * heading_err;
        }

        if heading_err.abs() < HEADING_DEADBAND_RAD {
            vt = 0.0;
        }

        if !vx.is_finite() {
            vx = 0.0;
        }

        let cmd = Velocity::new(vx, 0.0, vt);

        let sim = TrajSim::new(
            &self.cost_map,
            &self.world_model,
            &self.footprint,
            params.sim_params(),
        );
        let valid = sim
            .check_trajectory(
                pose,
                &cmd,
                &params.validation_target(),
                &params.acc_limits(),
            )
            .is_ok();

        let cmd = if valid || vx.abs() < NEGLIGIBLE_LINEAR_VEL_MS {
            cmd
        } else if heading_err.abs() > FALLBACK_ROTATE_THRESHOLD_RAD {
            debug!("Command {:?} rejected, rotating in place", cmd);
            report.fallback = Some(Fallback::RotateInPlace);
            Velocity::in_place(signed_by(params.min_in_place_rot_vel_rads, heading_err))
        } else {
            warn!("No safe command towards waypoint {}, stopping", progress.wp_index);
            report.fallback = Some(Fallback::Stop);
            report.success = false;
            Velocity::zero()
        };

        (TrackerState::Tracking(progress), cmd)
    }

    fn mode_goal_alignment(
        &self,
        inner: &Inner,
        progress: Progress,
        pose: &Pose,
        velocity: &Velocity,
        report: &mut StatusReport,
    ) -> (TrackerState, Velocity) {
        let params = &inner.params;

        let dist_goal = pose.distance_to(&inner.goal_pose.position_m);
        report.dist_to_goal_m = dist_goal;
        report.dist_to_start_m = pose.distance_to(&inner.start_pose.position_m);

        if dist_goal >= params.xy_goal_tolerance_m {
            debug!("Left the goal tolerance while aligning, resuming tracking");
            return self.mode_tracking(inner, progress, pose, velocity, report);
        }

        // Raw difference, no wrapping, so the turn direction follows the numerical comparison
        let heading_err = inner.goal_pose.heading_rad - pose.heading_rad;
        report.heading_err_rad = heading_err;

        if heading_err.abs() < params.yaw_goal_tolerance_rad {
            info!("Goal reached at {:?}", pose);
            return (TrackerState::GoalReached, Velocity::zero());
        }

        let vt = if inner.goal_pose.heading_rad > pose.heading_rad {
            params.min_in_place_rot_vel_rads
        } else {
            -params.min_in_place_rot_vel_rads
        };

        (TrackerState::GoalAlignment(progress), Velocity::in_place(vt))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

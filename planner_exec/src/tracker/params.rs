//! Path tracker parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::loc::Velocity;
use crate::traj_sim::{AccLimits, SimParams, MAX_SIM_STEPS};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target velocity the robot is assumed to accelerate towards while a command is validated.
const VALIDATION_TARGET_LINEAR_MS: f64 = 1.0;
const VALIDATION_TARGET_ANGULAR_RADS: f64 = 1.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the path tracker.
///
/// The whole set is replaced at once by [`super::PathTracker::reconfigure`].
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Params {
    /// Maximum linear acceleration
    pub max_trans_acc_ms2: f64,

    /// Maximum angular acceleration
    pub max_rot_acc_rads2: f64,

    /// Maximum forward speed demand
    pub max_trans_vel_ms: f64,

    /// Minimum forward speed demand, used when closing in on the goal
    pub min_trans_vel_ms: f64,

    /// Maximum turn rate demand
    pub max_rot_vel_rads: f64,

    /// Minimum turn rate demand, used when closing in on the goal
    pub min_rot_vel_rads: f64,

    /// Turn rate used for all rotations on the spot
    pub min_in_place_rot_vel_rads: f64,

    /// The goal heading is reached when the heading error is below this
    pub yaw_goal_tolerance_rad: f64,

    /// The goal position is reached when the robot is closer than this to it
    pub xy_goal_tolerance_m: f64,

    /// Waypoints closer than this to the robot are considered passed
    pub wp_tolerance_m: f64,

    /// Time horizon of the trajectory validation
    pub sim_time_s: f64,

    /// Maximum distance between trajectory validation samples
    pub sim_granularity_m: f64,

    /// Maximum rotation between trajectory validation samples
    pub angular_sim_granularity_rad: f64,

    /// Frequency at which commands are computed
    pub controller_freq_hz: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamsError {
    #[error("Parameter {0} must be finite and greater than zero, found {1}")]
    NotPositive(&'static str, f64),

    #[error("Parameter {0} must be finite and not negative, found {1}")]
    Negative(&'static str, f64),

    #[error("Simulation granularity too fine, validating a command would take {0} steps")]
    TooManySimSteps(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check the parameters can be used for tracking.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let positive = [
            ("xy_goal_tolerance_m", self.xy_goal_tolerance_m),
            ("wp_tolerance_m", self.wp_tolerance_m),
            ("sim_time_s", self.sim_time_s),
            ("sim_granularity_m", self.sim_granularity_m),
            ("angular_sim_granularity_rad", self.angular_sim_granularity_rad),
            ("controller_freq_hz", self.controller_freq_hz),
        ];

        for (name, value) in positive.iter() {
            if !value.is_finite() || *value <= 0.0 {
                return Err(ParamsError::NotPositive(*name, *value));
            }
        }

        let non_negative = [
            ("max_trans_acc_ms2", self.max_trans_acc_ms2),
            ("max_rot_acc_rads2", self.max_rot_acc_rads2),
            ("max_trans_vel_ms", self.max_trans_vel_ms),
            ("min_trans_vel_ms", self.min_trans_vel_ms),
            ("max_rot_vel_rads", self.max_rot_vel_rads),
            ("min_rot_vel_rads", self.min_rot_vel_rads),
            ("min_in_place_rot_vel_rads", self.min_in_place_rot_vel_rads),
            ("yaw_goal_tolerance_rad", self.yaw_goal_tolerance_rad),
        ];

        for (name, value) in non_negative.iter() {
            if !value.is_finite() || *value < 0.0 {
                return Err(ParamsError::Negative(*name, *value));
            }
        }

        let steps = self.sim_params().step_count(&self.validation_target());
        if steps > MAX_SIM_STEPS as f64 {
            return Err(ParamsError::TooManySimSteps(steps));
        }

        Ok(())
    }

    pub fn sim_params(&self) -> SimParams {
        SimParams {
            sim_time_s: self.sim_time_s,
            sim_granularity_m: self.sim_granularity_m,
            angular_sim_granularity_rad: self.angular_sim_granularity_rad,
        }
    }

    /// Velocity simulated from the commanded one when checking that a command is safe.
    pub fn validation_target(&self) -> Velocity {
        Velocity::new(
            VALIDATION_TARGET_LINEAR_MS,
            0.0,
            VALIDATION_TARGET_ANGULAR_RADS,
        )
    }

    /// Acceleration limits used to validate commands. The robot is not expected to strafe.
    pub fn acc_limits(&self) -> AccLimits {
        AccLimits::new(self.max_trans_acc_ms2, 0.0, self.max_rot_acc_rads2)
    }
}

/// Parameters matching the defaults of a small differential drive robot.
#[cfg(test)]
pub(crate) fn test_params() -> Params {
    util::params::load_str(
        r#"
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
        "#,
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_validate() {
        let params = test_params();
        assert_eq!(params.validate(), Ok(()));

        let mut bad = params.clone();
        bad.sim_granularity_m = 0.0;
        assert_eq!(
            bad.validate(),
            Err(ParamsError::NotPositive("sim_granularity_m", 0.0))
        );

        let mut bad = params.clone();
        bad.wp_tolerance_m = std::f64::NAN;
        assert!(matches!(
            bad.validate(),
            Err(ParamsError::NotPositive("wp_tolerance_m", _))
        ));

        let mut bad = params;
        bad.min_in_place_rot_vel_rads = -0.4;
        assert_eq!(
            bad.validate(),
            Err(ParamsError::Negative("min_in_place_rot_vel_rads", -0.4))
        );
    }

    #[test]
    fn test_validate_sim_steps() {
        let mut params = test_params();

        params.sim_granularity_m = 2e-4;
        assert_eq!(params.validate(), Ok(()));

        params.sim_granularity_m = 1e-7;
        assert!(matches!(
            params.validate(),
            Err(ParamsError::TooManySimSteps(s)) if s > 1e6
        ));

        params.sim_granularity_m = 1e-300;
        assert!(matches!(
            params.validate(),
            Err(ParamsError::TooManySimSteps(_))
        ));

        let mut params = test_params();
        params.angular_sim_granularity_rad = 1e-5;
        assert!(matches!(
            params.validate(),
            Err(ParamsError::TooManySimSteps(_))
        ));

        // A longer horizon needs more steps at the same granularity
        let mut params = test_params();
        params.sim_time_s = 1000.0;
        assert!(matches!(
            params.validate(),
            Err(ParamsError::TooManySimSteps(_))
        ));
    }

    #[test]
    fn test_derived() {
        let params = test_params();

        assert_eq!(params.acc_limits(), AccLimits::new(2.5, 0.0, 3.2));
        assert_eq!(params.sim_params().sim_granularity_m, 0.025);
        assert_eq!(params.validation_target(), Velocity::new(1.0, 0.0, 1.0));
    }
}

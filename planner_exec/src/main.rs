//! Main planner executable entry point.
//!
//! # Architecture
//!
//! The executable drives an ideal simulated robot with the path tracker:
//!
//!     - Initialise the session, logging and parameters
//!     - Build the cost map, world model, path and tracker
//!     - Main loop:
//!         - Compute the velocity command for the current pose
//!         - Check for goal arrival and consecutive failures
//!         - Integrate the command over one controller period
//!     - Save the driven path into the session directory

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use planner_lib::{
    loc::{Pose, Velocity},
    map::GridWorldModel,
    params::PlannerExecParams,
    traj_sim::integrate,
    tracker::{PathTracker, StatusReport},
};
use util::{
    logger::{logger_init, LevelFilter},
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Record of a single control cycle, saved at the end of the run.
#[derive(Serialize)]
struct CycleRecord {
    cycle: u64,
    sim_time_s: f64,
    pose: Pose,
    cmd: Velocity,
    report: StatusReport,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    // Initialise session
    let session =
        Session::new("planner_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    // Per sample simulation traces stay out even when tracing with $PLANNER_LOG_LEVEL
    logger_init(
        LevelFilter::Debug,
        &[("planner_lib::traj_sim", LevelFilter::Info)],
        &session,
    )
    .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Planner Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let params: PlannerExecParams = util::params::load("planner_exec.toml")
        .wrap_err("Could not load planner_exec params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    let map = Arc::new(params.build_map().wrap_err("Failed to build the cost map")?);
    info!(
        "Cost map of {:?} cells at {} m built, origin at ({}, {}) m",
        map.num_cells(),
        map.resolution_m(),
        map.origin_m().x,
        map.origin_m().y
    );

    let tracker = PathTracker::new(
        map.clone(),
        GridWorldModel::new(map.clone()),
        params.footprint.clone(),
        params.tracker.clone(),
    )
    .wrap_err("Failed to initialise the PathTracker")?;
    info!(
        "PathTracker initialised, footprint radii {:.3} m (inscribed) {:.3} m (circumscribed)",
        tracker.footprint().inscribed_radius_m(),
        tracker.footprint().circumscribed_radius_m()
    );

    let path = params.build_path().wrap_err("Failed to build the path")?;
    info!(
        "Path of {} waypoints, {:.2} m long",
        path.len(),
        path.get_length()
    );
    session
        .save_json("path.json", &path)
        .wrap_err("Failed to save the path")?;

    tracker
        .update_plan(path)
        .wrap_err("The tracker rejected the path")?;

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    let cycle_period_s = 1.0 / params.tracker.controller_freq_hz;

    let mut pose = params.start_pose();
    let mut vel = Velocity::zero();
    let mut records = Vec::new();
    let mut num_consec_failures = 0u64;
    let mut goal_reached = false;

    info!("Begining main loop\n");

    for cycle in 0..params.max_cycles {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        let (cmd, report) = tracker.compute_command(&pose, &vel);

        debug!(
            "[{}] pose ({:.3}, {:.3}, {:.3}) cmd ({:.3}, {:.3}) {:?} wp {:?}",
            cycle,
            pose.position_m.x,
            pose.position_m.y,
            pose.heading_rad,
            cmd.linear_ms.x,
            cmd.angular_rads,
            report.mode,
            report.wp_index
        );

        records.push(CycleRecord {
            cycle,
            sim_time_s: cycle as f64 * cycle_period_s,
            pose,
            cmd,
            report,
        });

        if tracker.is_goal_reached() {
            info!("Goal reached after {} cycles", cycle + 1);
            goal_reached = true;
            break;
        }

        if report.success {
            num_consec_failures = 0;
        } else {
            num_consec_failures += 1;
            warn!("No safe command ({} consecutive)", num_consec_failures);

            if num_consec_failures >= params.max_consec_failures {
                error!("Too many consecutive failures, aborting");
                break;
            }
        }

        // Ideal robot, the command is achieved immediately
        pose = integrate(&pose, &cmd, cycle_period_s);
        vel = cmd;

        if params.realtime {
            let cycle_dur = Instant::now() - cycle_start_instant;

            match Duration::from_secs_f64(cycle_period_s).checked_sub(cycle_dur) {
                Some(d) => thread::sleep(d),
                None => warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period_s
                ),
            }
        }
    }

    // ---- SHUTDOWN ----

    session
        .save_json("driven_path.json", &records)
        .wrap_err("Failed to save the driven path")?;

    info!(
        "{} cycles recorded, end pose {:?}, {:.3} s since session start",
        records.len(),
        pose,
        session::get_elapsed_seconds()
    );

    if goal_reached {
        Ok(())
    } else {
        Err(eyre!("The goal was not reached"))
    }
}

//! # Path tracker
//!
//! Pure pursuit style tracking of a precomputed path. Each cycle the tracker picks the next
//! waypoint that hasn't been passed yet, shapes a velocity command towards it, and validates the
//! command with the [`crate::traj_sim`] before emitting it. If the command is not safe the
//! tracker falls back to rotating on the spot, or stops and reports a failure.
//!
//! Once the robot is within the goal position tolerance it stops translating and turns on the
//! spot to the goal heading.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod path;
mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use path::*;
pub use state::*;

//! # Trajectory simulator
//!
//! Rolls a candidate velocity command forward in time under acceleration limits and checks every
//! sampled pose against the map. The result is a [`Trajectory`] which is either valid (every pose
//! was on the map and the footprint was clear at every pose) or invalid.
//!
//! Valid trajectories are not ranked, the cost of a valid trajectory is always zero.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod sim;
mod trajectory;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use sim::*;
pub use trajectory::*;

//! # Planner library.
//!
//! This library contains the local planner core, the path tracker and everything it needs to
//! validate its commands, so that it can be used by the executable, the benches and other crates
//! in the workspace.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Localisation types - the pose and velocity of the robot
pub mod loc;

/// Map interfaces - cost maps, footprints and world models
pub mod map;

/// Collision rasterizer - scores cells and lines of cells against a cost map
pub mod raster;

/// Trajectory simulator - rolls velocity commands forward and checks them against the map
pub mod traj_sim;

/// Path tracker - selects the velocity command that follows the path each cycle
pub mod tracker;

/// Parameters for the planner executable
pub mod params;

//! # Map module
//!
//! The planner only sees the world through two narrow interfaces:
//!
//! - [`CostMap`], a grid of `u8` costs with a bounds checked world to cell transform,
//! - [`WorldModel`], which scores a whole robot footprint at a given pose.
//!
//! Three cost values are reserved as sentinels that can never be traversed: [`LETHAL_OBSTACLE`],
//! [`INSCRIBED_INFLATED_OBSTACLE`] and [`NO_INFORMATION`]. Everything else is a traversal cost.
//!
//! [`CostGrid`] and [`GridWorldModel`] are simple in-memory implementations used by the
//! executable, the benches and the tests.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod cost_map;
mod footprint;
mod world_model;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use cost_map::*;
pub use footprint::*;
pub use world_model::*;

//! Toy simulations of systems approaching absolute zero.
//!
//! The core is the standing-wave energy field: two coherent waves travelling
//! in opposite directions, evaluated in closed form over a (position, time)
//! grid, and the search for the point where the field comes to rest.
//! Cooling curves and interference frames sit alongside it.

pub mod config;
pub mod cooling;
pub mod error;
pub mod extremum;
pub mod grid;
pub mod interference;
pub mod logging;
pub mod simulation;
pub mod visualisation;
pub mod wavefield;

pub use error::{FieldError, FieldResult};
pub use extremum::{argmin_row_major, find_minimum, find_rest_point, Extremum, DEFAULT_EPSILON};
pub use grid::{build_grid, Grid};
pub use wavefield::{evaluate_energy, EnergyField, FieldParams};

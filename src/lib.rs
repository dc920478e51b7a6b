//! # Line Cover Solver Library
//!
//! This library searches for the fewest straight, axis-aligned lines that a
//! single pen stroke needs to pass through every point of an N x N lattice,
//! never drawing the same unit edge twice.
//!
//! It is used by four binaries:
//! - `line_solver`: runs the depth-first solver for one grid size and prints
//!   the optimal route (text or JSON).
//! - `feasibility_check`: runs the breadth-first engine to decide whether a
//!   given line count is reachable.
//! - `order_evaluator`: compares direction-ordering strategies by search effort.
//! - `route_checker`: validates a route read from a file.
//!
//! ## Modules
//! - `engine`: lattice model (`Grid`, `Point`, `Direction`, `VisitedMask`, `Edge`)
//!   and the reversible `EdgeLedger`.
//! - `heuristics`: direction ordering strategies (`MoveOrder`).
//! - `solver`: the depth-first branch-and-bound engine and its `PathRecorder`.
//! - `verify`: the breadth-first feasibility engine.
//! - `utils`: zigzag baseline, route validation, parsing and rendering.
//!
//! ## Quick start
//! ```
//! use linecover_solver::solver::solve_grid;
//! use linecover_solver::verify::is_achievable;
//!
//! let solution = solve_grid(3).unwrap().expect("3x3 has a cover");
//! assert_eq!(solution.lines, 5);
//! assert!(is_achievable(3, 5).unwrap());
//! ```

pub mod engine;
pub mod heuristics;
pub mod solver;
pub mod utils;
pub mod verify;


//! Breadth-first feasibility check over (point, direction, visited mask) states.
//!
//! Unlike the depth-first solver this engine does not track edges and does not
//! produce a route: it answers whether a cover starting at the origin `(0, 0)`
//! can end with an exact number of lines, or reports the smallest number any
//! cover from the origin reaches.
//!
//! Line counts are kept in a dense table with one byte per state,
//! N² · 4 · 2^(N²) bytes in total, which limits the engine to N ≤ 4 (4 MiB).
use crate::engine::{Direction, Grid, Point, SolverError, VisitedMask};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{debug, info};

/// Largest grid the breadth-first engine accepts.
pub const MAX_VERIFY_SIZE: usize = 4;

/// Largest line target the table can store; `u8::MAX` marks unreached states.
pub const MAX_TARGET: u32 = u8::MAX as u32 - 1;

const UNREACHED: u8 = u8::MAX;

#[derive(Clone, Copy, Debug)]
struct State {
    point: Point,
    dir: Direction,
    visited: VisitedMask,
    lines: u32,
}

/// Outcome of a breadth-first run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Verification {
    pub size: usize,
    /// Line bound the run was pruned against.
    pub target: u32,
    /// Whether a complete cover with exactly `target` lines was dequeued.
    pub achievable: bool,
    /// Fewest lines over all complete covers seen, if any was seen.
    pub minimum: Option<u32>,
    /// States taken off the queue.
    pub states_explored: u64,
}

/// Dense table of the best line count seen per state.
struct StateTable {
    grid: Grid,
    lines: Vec<u8>,
}

impl StateTable {
    fn new(grid: Grid) -> Self {
        let points = grid.point_count();
        StateTable {
            grid,
            lines: vec![UNREACHED; points * 4 << points],
        }
    }

    fn index(&self, point: Point, dir: Direction, visited: VisitedMask) -> usize {
        let slot = self.grid.bit(point) * 4 + dir.index();
        (slot << self.grid.point_count()) | visited.bits() as usize
    }

    /// Stores `lines` for the state if it improves on what is stored.
    fn improve(&mut self, point: Point, dir: Direction, visited: VisitedMask, lines: u32) -> bool {
        let i = self.index(point, dir, visited);
        // `lines` never exceeds MAX_TARGET, so it fits below UNREACHED.
        let lines = lines as u8;
        if self.lines[i] == UNREACHED || self.lines[i] > lines {
            self.lines[i] = lines;
            true
        } else {
            false
        }
    }
}

fn verification_grid(size: usize) -> Result<Grid, SolverError> {
    if size > MAX_VERIFY_SIZE {
        return Err(SolverError::CapacityExceeded {
            size,
            max: MAX_VERIFY_SIZE,
        });
    }
    Grid::new(size)
}

/// Runs the breadth-first search, pruning transitions above `target`.
///
/// With `stop_at_target` the run ends as soon as a complete state with exactly
/// `target` lines is dequeued; otherwise the queue is drained so `minimum` is
/// exact.
fn explore(grid: Grid, target: u32, stop_at_target: bool) -> Verification {
    let mut table = StateTable::new(grid);
    let mut queue = VecDeque::new();
    let origin = Point::new(0, 0);
    let start_mask = grid.mask_of(origin);

    // Each starting direction opens the first line.
    for dir in Direction::ALL {
        table.improve(origin, dir, start_mask, 1);
        queue.push_back(State {
            point: origin,
            dir,
            visited: start_mask,
            lines: 1,
        });
    }

    let mut result = Verification {
        size: grid.size(),
        target,
        achievable: false,
        minimum: None,
        states_explored: 0,
    };

    while let Some(state) = queue.pop_front() {
        result.states_explored += 1;

        if grid.is_covered(state.visited) {
            result.minimum = Some(result.minimum.map_or(state.lines, |m| m.min(state.lines)));
            if state.lines == target {
                result.achievable = true;
                if stop_at_target {
                    break;
                }
            }
        }

        for dir in Direction::ALL {
            let Some(next) = grid.step(state.point, dir) else {
                continue;
            };
            let lines = state.lines + dir.turn_cost(Some(state.dir));
            if lines > target {
                continue;
            }
            let visited = state.visited.with(grid.bit(next));
            if table.improve(next, dir, visited, lines) {
                queue.push_back(State {
                    point: next,
                    dir,
                    visited,
                    lines,
                });
            }
        }
    }

    debug!(
        size = grid.size(),
        target,
        states = result.states_explored,
        achievable = result.achievable,
        "breadth-first search finished"
    );
    result
}

/// Decides whether a cover from the origin can use exactly `target_lines` lines.
///
/// # Returns
/// * `Ok(true)` if such a cover exists.
/// * `Ok(false)` once the whole bounded state space has been enumerated
///   without finding one.
/// * `Err(SolverError)` for sizes outside `1..=MAX_VERIFY_SIZE` or targets
///   above `MAX_TARGET`.
///
/// # Examples
/// ```
/// use linecover_solver::verify::is_achievable;
/// assert!(is_achievable(3, 5).unwrap());
/// assert!(!is_achievable(3, 4).unwrap());
/// ```
pub fn is_achievable(size: usize, target_lines: u32) -> Result<bool, SolverError> {
    Ok(verify(size, target_lines)?.achievable)
}

/// Like [`is_achievable`], but returns the full run report.
pub fn verify(size: usize, target_lines: u32) -> Result<Verification, SolverError> {
    let grid = verification_grid(size)?;
    if target_lines > MAX_TARGET {
        return Err(SolverError::TargetOutOfRange {
            target: target_lines,
            max: MAX_TARGET,
        });
    }
    let result = explore(grid, target_lines, true);
    info!(size, target = target_lines, achievable = result.achievable, "verification done");
    Ok(result)
}

/// The conjectured minimum `2N − 2` checked by [`is_achievable`] by default.
pub fn conjectured_target(size: usize) -> u32 {
    (2 * size).saturating_sub(2) as u32
}

/// Fewest lines of any cover starting at the origin.
///
/// The search is bounded by the zigzag route's count (2N − 1, or 1 for a
/// single point), which every grid achieves from the origin, so the result is
/// always `Some` for a valid size.
pub fn minimum_lines(size: usize) -> Result<Option<u32>, SolverError> {
    let grid = verification_grid(size)?;
    let bound = if size == 1 { 1 } else { 2 * size as u32 - 1 };
    let result = explore(grid, bound, false);
    info!(size, minimum = ?result.minimum, "minimum search done");
    Ok(result.minimum)
}

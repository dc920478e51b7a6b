use crate::engine::{Direction, Edge, EdgeLedger, Grid, Point, SolverError, VisitedMask};
use crate::heuristics::{MoveOrder, MoveOrderer};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// Which points the depth-first search uses as path origins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum StartPolicy {
    /// The 3x3 block around the grid center (see [`Grid::center_starts`]).
    #[default]
    CenterAdjacent,
    /// Every lattice point.
    All,
}

/// Tuning knobs for [`LineCoverSolver`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolverConfig {
    pub order: MoveOrder,
    pub starts: StartPolicy,
    /// Enables the transposition memo. Disabling it never changes the optimum.
    pub memo: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            order: MoveOrder::Constrained,
            starts: StartPolicy::CenterAdjacent,
            memo: true,
        }
    }
}

/// Counters collected during one solve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    /// Search states entered.
    pub nodes: u64,
    /// States cut because their line count already matched the best cover.
    pub pruned: u64,
    /// States cut by the memo.
    pub memo_hits: u64,
    /// Times a strictly better cover replaced the recorded one.
    pub improvements: u64,
}

/// Holds the best complete cover found so far.
///
/// A new cover replaces the stored one only if it uses strictly fewer lines,
/// so among equal covers the first one found is kept.
#[derive(Clone, Debug, Default)]
pub struct PathRecorder {
    best: Option<(u32, Vec<Point>)>,
}

impl PathRecorder {
    pub fn new() -> Self {
        PathRecorder { best: None }
    }

    /// Offers a complete cover.
    ///
    /// # Returns
    /// `true` if `lines` beat the stored count (or nothing was stored) and the
    /// path was copied in; `false` otherwise.
    pub fn record(&mut self, path: &[Point], lines: u32) -> bool {
        match self.best {
            Some((best, _)) if lines >= best => false,
            _ => {
                self.best = Some((lines, path.to_vec()));
                true
            }
        }
    }

    /// The stored cover, or `None` if no complete cover has been recorded.
    pub fn best(&self) -> Option<(u32, &[Point])> {
        self.best.as_ref().map(|(lines, path)| (*lines, path.as_slice()))
    }

    pub fn best_lines(&self) -> Option<u32> {
        self.best.as_ref().map(|(lines, _)| *lines)
    }

    pub fn clear(&mut self) {
        self.best = None;
    }
}

/// An optimal cover produced by [`LineCoverSolver::solve`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Solution {
    /// Points per side of the grid.
    pub size: usize,
    /// Number of straight segments in `path`.
    pub lines: u32,
    /// Every point the pen passes through, in order, starting at the origin.
    pub path: Vec<Point>,
    pub order: MoveOrder,
    pub starts: StartPolicy,
    pub stats: SearchStats,
}

impl Solution {
    /// Number of unit edges drawn.
    pub fn edge_count(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

/// Memo key: everything that determines which moves remain and when the
/// cover is complete. The line count is deliberately absent; it enters
/// through the stored budget instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct StateKey {
    point: usize,
    incoming: Option<Direction>,
    visited: u64,
    edges: u128,
}

/// Depth-first branch-and-bound search for the minimum-line cover of a grid.
///
/// The solver owns all mutable search state: the edge ledger, the point
/// sequence of the path under construction, the memo, and the best cover.
/// A solver can be reused; every call to [`LineCoverSolver::solve`] starts
/// from a clean state.
///
/// # Memo
/// The memo maps a [`StateKey`] to the largest *budget* (best line count minus
/// lines already used) under which that state was fully explored. Once a state
/// has been explored with budget `b`, no completion from it needs fewer than
/// `b` additional lines, or the search would have recorded it. A later visit
/// whose budget is not larger cannot improve anything and is cut. This holds
/// however the global bound moves afterwards, and across start points.
///
/// # Examples
/// ```
/// use linecover_solver::engine::Grid;
/// use linecover_solver::solver::{LineCoverSolver, SolverConfig};
///
/// let grid = Grid::new(3).unwrap();
/// let mut solver = LineCoverSolver::new(grid, SolverConfig::default());
/// let solution = solver.solve().unwrap();
/// assert_eq!(solution.lines, 5);
/// assert_eq!(solution.path.len(), solution.edge_count() + 1);
/// ```
pub struct LineCoverSolver {
    grid: Grid,
    config: SolverConfig,
    ledger: EdgeLedger,
    path: Vec<Point>,
    memo: HashMap<StateKey, u32>,
    recorder: PathRecorder,
    orderer: MoveOrderer,
    stats: SearchStats,
}

impl LineCoverSolver {
    pub fn new(grid: Grid, config: SolverConfig) -> Self {
        LineCoverSolver {
            grid,
            config,
            ledger: EdgeLedger::new(grid),
            path: Vec::with_capacity(grid.edge_count() + 1),
            memo: HashMap::new(),
            recorder: PathRecorder::new(),
            orderer: MoveOrderer::new(config.order),
            stats: SearchStats::default(),
        }
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Best cover recorded so far.
    pub fn best(&self) -> Option<(u32, &[Point])> {
        self.recorder.best()
    }

    fn reset(&mut self) {
        self.ledger.rewind(0);
        self.path.clear();
        self.memo.clear();
        self.recorder.clear();
        self.orderer = MoveOrderer::new(self.config.order);
        self.stats = SearchStats::default();
    }

    /// Searches from every start point allowed by the configuration.
    ///
    /// # Returns
    /// * `Some(Solution)` holding the fewest-line cover found.
    /// * `None` if the search was exhausted without completing any cover.
    pub fn solve(&mut self) -> Option<Solution> {
        self.reset();
        let starts = match self.config.starts {
            StartPolicy::CenterAdjacent => self.grid.center_starts(),
            StartPolicy::All => self.grid.points().collect(),
        };

        for start in starts {
            let found = self.search_from(start);
            debug!(%start, ?found, best = ?self.recorder.best_lines(), "start exhausted");
        }

        let stats = self.stats;
        let Some((lines, path)) = self.recorder.best() else {
            info!(size = self.grid.size(), nodes = stats.nodes, "search exhausted without a cover");
            return None;
        };
        info!(
            size = self.grid.size(),
            lines,
            nodes = stats.nodes,
            memo_hits = stats.memo_hits,
            "search finished"
        );
        Some(Solution {
            size: self.grid.size(),
            lines,
            path: path.to_vec(),
            order: self.config.order,
            starts: self.config.starts,
            stats,
        })
    }

    /// Runs the search rooted at `start`, keeping the memo and best cover
    /// from earlier roots.
    ///
    /// # Returns
    /// The line count of the cover this root recorded, or `None` if it could
    /// not improve on the best cover already known.
    pub fn search_from(&mut self, start: Point) -> Option<u32> {
        debug_assert!(self.grid.contains(start));
        self.ledger.rewind(0);
        self.path.clear();
        self.path.push(start);
        let found = self.search(start, None, self.grid.mask_of(start), 0);
        self.path.clear();
        found
    }

    /// Lines still available to a state that has used `lines_used`.
    fn budget(&self, lines_used: u32) -> u32 {
        self.recorder
            .best_lines()
            .map_or(u32::MAX, |best| best.saturating_sub(lines_used))
    }

    /// Explores every continuation of the current path.
    ///
    /// `self.path` must end at `point` and `self.ledger` must hold exactly the
    /// edges of `self.path`.
    ///
    /// # Returns
    /// * `Some(n)`: a better cover was recorded below this state, and `n` is the
    ///   fewest additional lines among the covers recorded here.
    /// * `None`: nothing below this state beats the bound.
    fn search(
        &mut self,
        point: Point,
        incoming: Option<Direction>,
        visited: VisitedMask,
        lines_used: u32,
    ) -> Option<u32> {
        self.stats.nodes += 1;
        debug_assert_eq!(self.ledger.len() + 1, self.path.len());
        debug_assert_eq!(self.path.last(), Some(&point));

        if self.grid.is_covered(visited) {
            // A path without edges is still drawn as one line.
            let lines = lines_used.max(1);
            if self.recorder.record(&self.path, lines) {
                self.stats.improvements += 1;
                debug!(lines, points = self.path.len(), "recorded better cover");
                return Some(lines - lines_used);
            }
            return None;
        }

        if self.recorder.best_lines().is_some_and(|best| lines_used >= best) {
            self.stats.pruned += 1;
            return None;
        }

        let key = StateKey {
            point: self.grid.bit(point),
            incoming,
            visited: visited.bits(),
            edges: self.ledger.bits(),
        };
        if self.config.memo {
            if let Some(&proven) = self.memo.get(&key) {
                if proven >= self.budget(lines_used) {
                    self.stats.memo_hits += 1;
                    return None;
                }
            }
        }

        let mut answer: Option<u32> = None;
        let order = self.orderer.order(&self.grid, point, visited);
        for d in order {
            let cost = d.turn_cost(incoming);
            let checkpoint = self.ledger.checkpoint();
            let path_mark = self.path.len();
            let mut mask = visited;
            let mut cur = point;

            while let Some(next) = self.grid.step(cur, d) {
                if !self.ledger.acquire(Edge::new(cur, next)) {
                    break;
                }
                mask = mask.with(self.grid.bit(next));
                self.path.push(next);
                let sub = self.search(next, Some(d), mask, lines_used + cost);

                if let Some(extra) = sub {
                    let total = extra + cost;
                    answer = Some(answer.map_or(total, |a| a.min(total)));
                }
                cur = next;
            }

            self.ledger.rewind(checkpoint);
            self.path.truncate(path_mark);
        }
        debug_assert_eq!(self.ledger.bits(), key.edges);
        debug_assert_eq!(self.path.last(), Some(&point));

        if self.config.memo {
            let budget = self.budget(lines_used);
            let proven = self.memo.entry(key).or_insert(0);
            *proven = (*proven).max(budget);
        }
        answer
    }
}

/// Solves an N x N grid with the default configuration.
///
/// # Returns
/// * `Err(SolverError)` if `size` is zero or beyond [`crate::engine::MAX_GRID_SIZE`].
/// * `Ok(None)` if no complete cover exists.
/// * `Ok(Some(solution))` otherwise.
pub fn solve_grid(size: usize) -> Result<Option<Solution>, SolverError> {
    solve_grid_with(size, SolverConfig::default())
}

pub fn solve_grid_with(size: usize, config: SolverConfig) -> Result<Option<Solution>, SolverError> {
    let grid = Grid::new(size)?;
    Ok(LineCoverSolver::new(grid, config).solve())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{check_route, zigzag_route};
    use proptest::prelude::*;

    fn solved(size: usize, config: SolverConfig) -> Solution {
        solve_grid_with(size, config)
            .expect("valid size")
            .expect("every grid has a cover")
    }

    #[test]
    fn test_recorder_keeps_strictly_better_only() {
        let mut recorder = PathRecorder::new();
        assert_eq!(recorder.best(), None);

        let first = [Point::new(0, 0), Point::new(0, 1)];
        let tie = [Point::new(1, 1), Point::new(1, 0)];
        assert!(recorder.record(&first, 5));
        assert!(!recorder.record(&tie, 5));
        assert_eq!(recorder.best(), Some((5, &first[..])));

        assert!(!recorder.record(&tie, 6));
        assert!(recorder.record(&tie, 4));
        assert_eq!(recorder.best_lines(), Some(4));
        assert_eq!(recorder.best(), Some((4, &tie[..])));
    }

    #[test]
    fn test_solve_grid_rejects_bad_sizes() {
        assert!(matches!(solve_grid(0), Err(SolverError::InvalidSize { size: 0 })));
        assert!(matches!(solve_grid(9), Err(SolverError::CapacityExceeded { .. })));
    }

    #[test]
    fn test_single_point_grid_is_one_line() {
        let sol = solved(1, SolverConfig::default());
        assert_eq!(sol.lines, 1);
        assert_eq!(sol.path, vec![Point::new(0, 0)]);
        assert_eq!(sol.edge_count(), 0);
    }

    #[test]
    fn test_small_grids_need_two_n_minus_one_lines() {
        for size in 2..=4 {
            let sol = solved(size, SolverConfig::default());
            assert_eq!(sol.lines as usize, 2 * size - 1, "size {}", size);

            let grid = Grid::new(size).unwrap();
            let summary = check_route(&grid, &sol.path).expect("solver route must be valid");
            assert_eq!(summary.lines, sol.lines);
            assert_eq!(summary.edges, sol.edge_count());
        }
    }

    #[test]
    fn test_three_by_three_matches_zigzag_baseline() {
        let grid = Grid::new(3).unwrap();
        let baseline = check_route(&grid, &zigzag_route(&grid)).unwrap();
        let sol = solved(3, SolverConfig::default());
        assert_eq!(sol.lines, baseline.lines);
        assert!(grid.center_starts().contains(&sol.path[0]));
    }

    #[test]
    fn test_solve_is_repeatable() {
        let grid = Grid::new(3).unwrap();
        let mut solver = LineCoverSolver::new(grid, SolverConfig::default());
        let first = solver.solve().unwrap();
        let second = solver.solve().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_memo_does_not_change_optimum() {
        for size in 1..=3 {
            let with = solved(size, SolverConfig::default());
            let without = solved(
                size,
                SolverConfig {
                    memo: false,
                    ..SolverConfig::default()
                },
            );
            assert_eq!(with.lines, without.lines);
            assert_eq!(without.stats.memo_hits, 0);
            assert!(with.stats.nodes <= without.stats.nodes);
        }
    }

    #[test]
    fn test_order_and_start_policy_do_not_change_optimum() {
        let reference = solved(3, SolverConfig::default()).lines;
        let configs = [
            SolverConfig {
                order: MoveOrder::Declared,
                ..SolverConfig::default()
            },
            SolverConfig {
                starts: StartPolicy::All,
                ..SolverConfig::default()
            },
            SolverConfig {
                order: MoveOrder::Shuffled { seed: 11 },
                starts: StartPolicy::All,
                memo: false,
            },
        ];
        for config in configs {
            assert_eq!(solved(3, config).lines, reference, "{:?}", config);
        }
    }

    #[test]
    fn test_search_from_leaves_ledger_empty() {
        let grid = Grid::new(3).unwrap();
        let mut solver = LineCoverSolver::new(grid, SolverConfig::default());
        let found = solver.search_from(Point::new(1, 1));
        assert!(solver.ledger.is_empty());
        assert!(solver.path.is_empty());
        // The root's answer is the full line count of the cover it recorded.
        assert_eq!(found, solver.best().map(|(lines, _)| lines));

        // The center already admits the 5-line spiral, so no later root can improve.
        assert_eq!(found, Some(5));
        assert_eq!(solver.search_from(Point::new(0, 0)), None);
        assert!(solver.ledger.is_empty());
    }

    #[test]
    fn test_multi_step_walks_record_contiguous_routes() {
        // Declared order from a corner walks straight down two cells before turning.
        let grid = Grid::new(3).unwrap();
        let config = SolverConfig {
            order: MoveOrder::Declared,
            ..SolverConfig::default()
        };
        let mut solver = LineCoverSolver::new(grid, config);
        let found = solver.search_from(Point::new(0, 0));
        assert!(solver.ledger.is_empty());
        assert!(solver.path.is_empty());

        let (lines, path) = solver.best().expect("a corner start covers the grid");
        assert_eq!(found, Some(lines));
        let summary = check_route(&grid, path).expect("recorded route must be contiguous");
        assert_eq!(summary.lines, lines);
        assert_eq!(path[0], Point::new(0, 0));
    }

    #[test]
    fn test_every_root_returns_its_recorded_cover() {
        let grid = Grid::new(3).unwrap();
        for memo in [true, false] {
            let config = SolverConfig {
                memo,
                ..SolverConfig::default()
            };
            for start in grid.points() {
                let mut solver = LineCoverSolver::new(grid, config);
                let found = solver.search_from(start);
                assert!(solver.ledger.is_empty(), "memo {} start {}", memo, start);
                assert!(solver.path.is_empty(), "memo {} start {}", memo, start);
                assert!(solver.stats().nodes > 0);

                let (lines, path) = solver.best().expect("every start covers a 3x3 grid");
                assert_eq!(found, Some(lines), "memo {} start {}", memo, start);
                assert_eq!(lines, 5, "memo {} start {}", memo, start);
                assert_eq!(path[0], start);
                let summary = check_route(&grid, path)
                    .unwrap_or_else(|e| panic!("memo {} start {}: {}", memo, start, e));
                assert_eq!(summary.lines, lines);
            }
        }
    }

    #[test]
    fn test_bound_prunes_after_first_cover() {
        let sol = solved(3, SolverConfig::default());
        assert!(sol.stats.improvements >= 1);
        assert!(sol.stats.pruned > 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_shuffled_orders_find_same_optimum(seed in any::<u64>(), size in 1usize..=3) {
            let config = SolverConfig {
                order: MoveOrder::Shuffled { seed },
                ..SolverConfig::default()
            };
            let sol = solved(size, config);
            let expected = if size == 1 { 1 } else { 2 * size as u32 - 1 };
            prop_assert_eq!(sol.lines, expected);

            let grid = Grid::new(size).unwrap();
            let summary = check_route(&grid, &sol.path);
            prop_assert!(summary.is_ok(), "{:?}", summary);
        }
    }
}

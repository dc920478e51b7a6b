use crate::engine::{Direction, Grid, Point, VisitedMask};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::cmp::Reverse;
use std::fmt;

/// Strategy used to order the four directions tried at each search node.
///
/// Any order yields the same optimum; the strategy only changes how quickly
/// a good cover is found and therefore how tight the pruning bound is early on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum MoveOrder {
    /// Directions whose first step lands on the point with the most unvisited
    /// neighbors come first. Ties keep declaration order.
    #[default]
    Constrained,
    /// Declaration order: up, down, left, right.
    Declared,
    /// A fresh random permutation at every node, drawn from a seeded `SmallRng`.
    Shuffled { seed: u64 },
}

impl fmt::Display for MoveOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveOrder::Constrained => write!(f, "constrained"),
            MoveOrder::Declared => write!(f, "declared"),
            MoveOrder::Shuffled { seed } => write!(f, "shuffled(seed={})", seed),
        }
    }
}

/// Score of stepping from `p` in direction `d`.
///
/// # Returns
/// * `Some(n)` where `n` is the number of unvisited neighbors of the point one
///   step away.
/// * `None` if that step leaves the grid. `None` orders below every `Some`.
pub fn neighbor_score(grid: &Grid, p: Point, d: Direction, visited: VisitedMask) -> Option<usize> {
    grid.step(p, d)
        .map(|next| grid.unvisited_neighbors(next, visited))
}

/// Orders directions by descending [`neighbor_score`], keeping declaration
/// order among equal scores.
///
/// # Examples
/// ```
/// use linecover_solver::engine::{Direction, Grid, Point};
/// use linecover_solver::heuristics::constrained_order;
///
/// let grid = Grid::new(3).unwrap();
/// let start = Point::new(0, 0);
/// let order = constrained_order(&grid, start, grid.mask_of(start));
/// // Both in-grid moves score 2; the off-grid ones sink to the end.
/// assert_eq!(order, [Direction::Down, Direction::Right, Direction::Up, Direction::Left]);
/// ```
pub fn constrained_order(grid: &Grid, p: Point, visited: VisitedMask) -> [Direction; 4] {
    let mut order = Direction::ALL;
    // sort_by_key is stable, so equal scores stay in declaration order.
    order.sort_by_key(|&d| Reverse(neighbor_score(grid, p, d, visited)));
    order
}

/// Stateful direction orderer owned by a search context.
///
/// Only `MoveOrder::Shuffled` consumes randomness; the generator is seeded
/// from the strategy so that two runs with the same seed explore identically.
#[derive(Clone, Debug)]
pub struct MoveOrderer {
    strategy: MoveOrder,
    rng: SmallRng,
}

impl MoveOrderer {
    pub fn new(strategy: MoveOrder) -> Self {
        let seed = match strategy {
            MoveOrder::Shuffled { seed } => seed,
            _ => 0,
        };
        MoveOrderer {
            strategy,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Returns the four directions in the order they should be tried at `p`.
    pub fn order(&mut self, grid: &Grid, p: Point, visited: VisitedMask) -> [Direction; 4] {
        match self.strategy {
            MoveOrder::Constrained => constrained_order(grid, p, visited),
            MoveOrder::Declared => Direction::ALL,
            MoveOrder::Shuffled { .. } => {
                let mut order = Direction::ALL;
                order.shuffle(&mut self.rng);
                order
            }
        }
    }
}

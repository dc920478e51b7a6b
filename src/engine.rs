//! Lattice model for the line-cover search.
//!
//! This module defines the data every search engine works on:
//! - `Point` and `Direction`: lattice coordinates and the four unit moves.
//! - `Grid`: the N x N lattice, its bit indexing and the center-adjacent start points.
//! - `VisitedMask`: the set of points already drawn, as a dense `u64` bitset.
//! - `Edge` and `EdgeLedger`: unit edges and the reversible record of which ones
//!   the path under construction currently occupies.
//! - `SolverError`: the capacity and argument errors shared by both engines.
use serde::Serialize;
use std::fmt;

/// Largest grid the depth-first engine accepts.
///
/// The visited mask is a `u64` (N² ≤ 64) and the edge set a `u128`
/// (2·N·(N−1) ≤ 128), so N = 8 is the last size both fit.
pub const MAX_GRID_SIZE: usize = 8;

/// Errors reported by the solver library.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SolverError {
    /// A grid must have at least one point per side.
    InvalidSize { size: usize },
    /// The requested grid does not fit the engine's fixed-width state.
    CapacityExceeded { size: usize, max: usize },
    /// The line target cannot be represented by the verification table.
    TargetOutOfRange { target: u32, max: u32 },
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSize { size } => write!(f, "invalid grid size {size}: must be at least 1"),
            Self::CapacityExceeded { size, max } => {
                write!(f, "grid size {size} exceeds engine capacity (max {max})")
            }
            Self::TargetOutOfRange { target, max } => {
                write!(f, "line target {target} out of range (max {max})")
            }
        }
    }
}

impl std::error::Error for SolverError {}

/// A lattice point, addressed by row and column from the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Point {
    pub row: usize,
    pub col: usize,
}

impl Point {
    pub const fn new(row: usize, col: usize) -> Self {
        Point { row, col }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// One of the four axis-aligned unit moves.
///
/// The declaration order (up, down, left, right) is the stable tie-break
/// order used by every move ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All directions in declaration order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Declared index of the direction, in `0..4`.
    pub fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    /// Row and column offset of one step.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    /// Lines added by stepping in `self` after arriving with `incoming`.
    ///
    /// The first step of a path (no incoming direction) always opens a line;
    /// afterwards only a change of direction does.
    pub fn turn_cost(self, incoming: Option<Direction>) -> u32 {
        match incoming {
            Some(d) if d == self => 0,
            _ => 1,
        }
    }
}

/// Set of visited points, one bit per point at index `row * N + col`.
///
/// Bits are only ever added: `with` returns a new mask and leaves `self`
/// untouched, so a mask captured on the call stack is its own undo record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VisitedMask(u64);

impl VisitedMask {
    pub fn empty() -> Self {
        VisitedMask(0)
    }

    /// Returns a copy of the mask with `bit` set.
    pub fn with(self, bit: usize) -> Self {
        VisitedMask(self.0 | (1u64 << bit))
    }

    pub fn contains(self, bit: usize) -> bool {
        self.0 & (1u64 << bit) != 0
    }

    /// Number of points in the set.
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn bits(self) -> u64 {
        self.0
    }
}

/// An undirected unit edge between two adjacent points.
///
/// The endpoints are stored smaller-first, so `Edge::new(p, q)` and
/// `Edge::new(q, p)` compare and hash identically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    a: Point,
    b: Point,
}

impl Edge {
    /// Builds the canonical edge between two adjacent points.
    ///
    /// Callers must pass points at Manhattan distance 1; use [`Edge::between`]
    /// for unchecked input.
    pub fn new(p: Point, q: Point) -> Self {
        debug_assert!(are_adjacent(p, q), "{p} and {q} are not adjacent");
        if p <= q {
            Edge { a: p, b: q }
        } else {
            Edge { a: q, b: p }
        }
    }

    /// Like [`Edge::new`], but returns `None` when `p` and `q` are not adjacent.
    pub fn between(p: Point, q: Point) -> Option<Self> {
        are_adjacent(p, q).then(|| Edge::new(p, q))
    }

    pub fn endpoints(&self) -> (Point, Point) {
        (self.a, self.b)
    }

    pub fn is_horizontal(&self) -> bool {
        self.a.row == self.b.row
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.a, self.b)
    }
}

fn are_adjacent(p: Point, q: Point) -> bool {
    p.row.abs_diff(q.row) + p.col.abs_diff(q.col) == 1
}

/// The N x N lattice.
///
/// `Grid` is a small `Copy` value; engines keep their own copy rather than
/// borrowing one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grid {
    size: usize,
}

impl Grid {
    /// Creates a grid with `size` points per side.
    ///
    /// # Returns
    /// * `Err(SolverError::InvalidSize)` for `size == 0`.
    /// * `Err(SolverError::CapacityExceeded)` for `size > MAX_GRID_SIZE`.
    ///
    /// # Examples
    /// ```
    /// use linecover_solver::engine::{Grid, Point};
    /// let grid = Grid::new(3).unwrap();
    /// assert_eq!(grid.point_count(), 9);
    /// assert_eq!(grid.bit(Point::new(1, 2)), 5);
    /// assert!(Grid::new(0).is_err());
    /// ```
    pub fn new(size: usize) -> Result<Self, SolverError> {
        if size == 0 {
            return Err(SolverError::InvalidSize { size });
        }
        if size > MAX_GRID_SIZE {
            return Err(SolverError::CapacityExceeded {
                size,
                max: MAX_GRID_SIZE,
            });
        }
        Ok(Grid { size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn point_count(&self) -> usize {
        self.size * self.size
    }

    /// Number of unit edges in the lattice: N·(N−1) horizontal plus as many vertical.
    pub fn edge_count(&self) -> usize {
        2 * self.size * (self.size - 1)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.row < self.size && p.col < self.size
    }

    /// Bit index of `p` in a visited mask.
    pub fn bit(&self, p: Point) -> usize {
        p.row * self.size + p.col
    }

    /// Inverse of [`Grid::bit`].
    pub fn point(&self, bit: usize) -> Point {
        Point::new(bit / self.size, bit % self.size)
    }

    /// The point one step from `p` in direction `d`, or `None` off the lattice.
    pub fn step(&self, p: Point, d: Direction) -> Option<Point> {
        let (dr, dc) = d.delta();
        let row = p.row.checked_add_signed(dr)?;
        let col = p.col.checked_add_signed(dc)?;
        let next = Point::new(row, col);
        self.contains(next).then_some(next)
    }

    /// Mask with every point of the grid set.
    pub fn full_mask(&self) -> VisitedMask {
        let count = self.point_count();
        if count >= 64 {
            VisitedMask(u64::MAX)
        } else {
            VisitedMask((1u64 << count) - 1)
        }
    }

    pub fn mask_of(&self, p: Point) -> VisitedMask {
        VisitedMask::empty().with(self.bit(p))
    }

    pub fn is_covered(&self, mask: VisitedMask) -> bool {
        mask == self.full_mask()
    }

    /// Dense index of an edge in `0..edge_count()`.
    ///
    /// Horizontal edges come first, numbered by their left endpoint; vertical
    /// edges follow, numbered by their upper endpoint.
    pub fn edge_index(&self, edge: Edge) -> usize {
        let (a, _) = edge.endpoints();
        if edge.is_horizontal() {
            a.row * (self.size - 1) + a.col
        } else {
            self.size * (self.size - 1) + a.row * self.size + a.col
        }
    }

    /// Number of neighbors of `p` that are not yet in `visited`.
    pub fn unvisited_neighbors(&self, p: Point, visited: VisitedMask) -> usize {
        Direction::ALL
            .iter()
            .filter_map(|&d| self.step(p, d))
            .filter(|&q| !visited.contains(self.bit(q)))
            .count()
    }

    /// The up-to-nine points of the 3x3 block around the center `(N/2, N/2)`,
    /// in row-major order.
    pub fn center_starts(&self) -> Vec<Point> {
        let mid = self.size / 2;
        let mut starts = Vec::with_capacity(9);
        for row in mid.saturating_sub(1)..=mid + 1 {
            for col in mid.saturating_sub(1)..=mid + 1 {
                let p = Point::new(row, col);
                if self.contains(p) {
                    starts.push(p);
                }
            }
        }
        starts
    }

    /// All points in row-major (bit) order.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.point_count()).map(move |bit| self.point(bit))
    }
}

/// Reversible record of the edges occupied by the path under construction.
///
/// Edges are acquired one at a time and kept on a trail. A caller takes a
/// `checkpoint()` before a run of acquisitions and hands it back to `rewind`,
/// which releases everything acquired since, newest first.
#[derive(Clone, Debug)]
pub struct EdgeLedger {
    grid: Grid,
    used: u128,
    trail: Vec<Edge>,
}

impl EdgeLedger {
    pub fn new(grid: Grid) -> Self {
        EdgeLedger {
            grid,
            used: 0,
            trail: Vec::with_capacity(grid.edge_count()),
        }
    }

    /// Marks `edge` as occupied.
    ///
    /// # Returns
    /// * `true` if the edge was free and is now held.
    /// * `false` if it was already held; the ledger is left unchanged.
    pub fn acquire(&mut self, edge: Edge) -> bool {
        let bit = 1u128 << self.grid.edge_index(edge);
        if self.used & bit != 0 {
            return false;
        }
        self.used |= bit;
        self.trail.push(edge);
        true
    }

    /// Frees `edge`. Releasing an edge that is not held does nothing.
    pub fn release(&mut self, edge: Edge) {
        let bit = 1u128 << self.grid.edge_index(edge);
        if self.used & bit == 0 {
            return;
        }
        self.used &= !bit;
        if let Some(pos) = self.trail.iter().rposition(|&e| e == edge) {
            self.trail.remove(pos);
        }
    }

    /// Current trail length, to be passed back to [`EdgeLedger::rewind`].
    pub fn checkpoint(&self) -> usize {
        self.trail.len()
    }

    /// Releases every edge acquired after `checkpoint`, in reverse order.
    pub fn rewind(&mut self, checkpoint: usize) {
        while self.trail.len() > checkpoint {
            if let Some(edge) = self.trail.pop() {
                self.used &= !(1u128 << self.grid.edge_index(edge));
            }
        }
    }

    pub fn contains(&self, edge: Edge) -> bool {
        self.used & (1u128 << self.grid.edge_index(edge)) != 0
    }

    /// Number of edges currently held.
    pub fn len(&self) -> usize {
        self.trail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trail.is_empty()
    }

    /// Held edges as a bitset over [`Grid::edge_index`].
    pub fn bits(&self) -> u128 {
        self.used
    }

    /// Held edges in acquisition order.
    pub fn edges(&self) -> &[Edge] {
        &self.trail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn all_edges(grid: Grid) -> Vec<Edge> {
        let mut edges = Vec::new();
        for p in grid.points() {
            for d in [Direction::Down, Direction::Right] {
                if let Some(q) = grid.step(p, d) {
                    edges.push(Edge::new(p, q));
                }
            }
        }
        edges
    }

    #[test]
    fn test_grid_new_rejects_bad_sizes() {
        assert_eq!(Grid::new(0), Err(SolverError::InvalidSize { size: 0 }));
        assert_eq!(
            Grid::new(MAX_GRID_SIZE + 1),
            Err(SolverError::CapacityExceeded {
                size: MAX_GRID_SIZE + 1,
                max: MAX_GRID_SIZE
            })
        );
        assert!(Grid::new(1).is_ok());
        assert!(Grid::new(MAX_GRID_SIZE).is_ok());
    }

    #[test]
    fn test_bit_and_point_are_inverse() {
        let grid = Grid::new(4).unwrap();
        let bits: HashSet<usize> = grid.points().map(|p| grid.bit(p)).collect();
        assert_eq!(bits.len(), 16);
        assert!(bits.iter().all(|&b| b < 16));
        assert_eq!(grid.point(grid.bit(Point::new(2, 3))), Point::new(2, 3));
    }

    #[test]
    fn test_step_stays_inside_grid() {
        let grid = Grid::new(3).unwrap();
        let corner = Point::new(0, 0);
        assert_eq!(grid.step(corner, Direction::Up), None);
        assert_eq!(grid.step(corner, Direction::Left), None);
        assert_eq!(grid.step(corner, Direction::Down), Some(Point::new(1, 0)));
        assert_eq!(grid.step(corner, Direction::Right), Some(Point::new(0, 1)));
        assert_eq!(grid.step(Point::new(2, 2), Direction::Down), None);
        assert_eq!(grid.step(Point::new(2, 2), Direction::Right), None);
    }

    #[test]
    fn test_full_mask_and_coverage() {
        let grid = Grid::new(3).unwrap();
        assert_eq!(grid.full_mask().bits(), 0b1_1111_1111);
        assert_eq!(Grid::new(8).unwrap().full_mask().bits(), u64::MAX);

        let mut mask = VisitedMask::empty();
        for p in grid.points() {
            assert!(!grid.is_covered(mask));
            mask = mask.with(grid.bit(p));
        }
        assert!(grid.is_covered(mask));
        assert_eq!(mask.len(), 9);
    }

    #[test]
    fn test_mask_with_returns_a_new_mask() {
        let a = VisitedMask::empty().with(3);
        let b = a.with(5);
        assert!(a.contains(3) && !a.contains(5));
        assert!(b.contains(3) && b.contains(5));
    }

    #[test]
    fn test_turn_cost() {
        assert_eq!(Direction::Up.turn_cost(None), 1);
        assert_eq!(Direction::Up.turn_cost(Some(Direction::Up)), 0);
        assert_eq!(Direction::Up.turn_cost(Some(Direction::Left)), 1);
        assert_eq!(Direction::Up.turn_cost(Some(Direction::Down)), 1);
    }

    #[test]
    fn test_center_starts() {
        let one = Grid::new(1).unwrap().center_starts();
        assert_eq!(one, vec![Point::new(0, 0)]);

        let three = Grid::new(3).unwrap().center_starts();
        assert_eq!(three.len(), 9);
        assert_eq!(three[0], Point::new(0, 0));

        let five = Grid::new(5).unwrap().center_starts();
        assert_eq!(five.len(), 9);
        assert_eq!(five[0], Point::new(1, 1));
        assert_eq!(five[8], Point::new(3, 3));

        // mid = 1 for N = 2, so the block is clipped to the whole grid.
        assert_eq!(Grid::new(2).unwrap().center_starts().len(), 4);
    }

    #[test]
    fn test_unvisited_neighbors() {
        let grid = Grid::new(3).unwrap();
        let center = Point::new(1, 1);
        assert_eq!(grid.unvisited_neighbors(center, VisitedMask::empty()), 4);
        let mask = grid.mask_of(Point::new(0, 1)).with(grid.bit(Point::new(1, 0)));
        assert_eq!(grid.unvisited_neighbors(center, mask), 2);
        assert_eq!(grid.unvisited_neighbors(Point::new(0, 0), mask), 0);
    }

    #[test]
    fn test_edge_is_canonical() {
        let p = Point::new(1, 1);
        let q = Point::new(1, 2);
        assert_eq!(Edge::new(p, q), Edge::new(q, p));
        assert_eq!(Edge::new(q, p).endpoints(), (p, q));
        assert!(Edge::new(p, q).is_horizontal());
        assert_eq!(Edge::between(Point::new(0, 0), Point::new(1, 1)), None);
        assert_eq!(Edge::between(p, p), None);
    }

    #[test]
    fn test_edge_index_is_dense() {
        for size in 1..=MAX_GRID_SIZE {
            let grid = Grid::new(size).unwrap();
            let edges = all_edges(grid);
            assert_eq!(edges.len(), grid.edge_count());
            let indices: HashSet<usize> = edges.iter().map(|&e| grid.edge_index(e)).collect();
            assert_eq!(indices.len(), grid.edge_count());
            assert!(indices.iter().all(|&i| i < grid.edge_count()));
        }
    }

    #[test]
    fn test_ledger_rejects_reuse() {
        let grid = Grid::new(3).unwrap();
        let mut ledger = EdgeLedger::new(grid);
        let e = Edge::new(Point::new(0, 0), Point::new(0, 1));
        assert!(ledger.acquire(e));
        assert!(!ledger.acquire(Edge::new(Point::new(0, 1), Point::new(0, 0))));
        assert_eq!(ledger.len(), 1);
        ledger.release(e);
        assert!(ledger.is_empty());
        assert!(ledger.acquire(e));
    }

    #[test]
    fn test_ledger_rewind_restores_checkpoint() {
        let grid = Grid::new(3).unwrap();
        let mut ledger = EdgeLedger::new(grid);
        let first = Edge::new(Point::new(1, 1), Point::new(1, 0));
        assert!(ledger.acquire(first));
        let mark = ledger.checkpoint();
        let bits = ledger.bits();

        assert!(ledger.acquire(Edge::new(Point::new(1, 0), Point::new(0, 0))));
        assert!(ledger.acquire(Edge::new(Point::new(0, 0), Point::new(0, 1))));
        ledger.rewind(mark);

        assert_eq!(ledger.bits(), bits);
        assert_eq!(ledger.edges(), &[first]);
        assert!(!ledger.contains(Edge::new(Point::new(0, 0), Point::new(0, 1))));
    }

    proptest! {
        #[test]
        fn prop_ledger_rewind_undoes_any_acquisitions(
            size in 2usize..=MAX_GRID_SIZE,
            picks in proptest::collection::vec(any::<usize>(), 0..40),
            split in 0usize..40,
        ) {
            let grid = Grid::new(size).unwrap();
            let edges = all_edges(grid);
            let mut ledger = EdgeLedger::new(grid);
            let split = split.min(picks.len());

            let mut held = HashSet::new();
            for &i in &picks[..split] {
                let e = edges[i % edges.len()];
                prop_assert_eq!(ledger.acquire(e), held.insert(e));
            }
            let mark = ledger.checkpoint();
            let before = ledger.bits();
            for &i in &picks[split..] {
                ledger.acquire(edges[i % edges.len()]);
            }
            ledger.rewind(mark);

            prop_assert_eq!(ledger.bits(), before);
            prop_assert_eq!(ledger.len(), held.len());
        }

        #[test]
        fn prop_edge_canonical_both_ways(row in 0usize..7, col in 0usize..7, down in any::<bool>()) {
            let p = Point::new(row, col);
            let q = if down { Point::new(row + 1, col) } else { Point::new(row, col + 1) };
            let grid = Grid::new(MAX_GRID_SIZE).unwrap();
            prop_assert_eq!(Edge::new(p, q), Edge::new(q, p));
            prop_assert_eq!(grid.edge_index(Edge::new(p, q)), grid.edge_index(Edge::new(q, p)));
        }
    }
}

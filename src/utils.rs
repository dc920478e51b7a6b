use crate::engine::{Direction, Edge, EdgeLedger, Grid, Point};
use serde::Serialize;

/// Facts about a route that passed [`check_route`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    /// Straight segments in the route (a single point counts as one).
    pub lines: u32,
    /// Unit edges drawn.
    pub edges: usize,
    /// Steps that land on a point the route already passed through.
    pub revisits: usize,
}

/// Direction of the unit move from `p` to `q`, if it is one.
pub fn direction_between(p: Point, q: Point) -> Option<Direction> {
    Direction::ALL.into_iter().find(|d| {
        let (dr, dc) = d.delta();
        p.row.checked_add_signed(dr) == Some(q.row) && p.col.checked_add_signed(dc) == Some(q.col)
    })
}

/// Counts the straight segments of a route made of unit moves.
///
/// Returns 0 for an empty route and 1 for a single point. Steps that are not
/// unit moves are skipped; run [`check_route`] first when the input is untrusted.
pub fn count_lines(route: &[Point]) -> u32 {
    match route.len() {
        0 => 0,
        1 => 1,
        _ => {
            let mut lines = 0;
            let mut incoming = None;
            for pair in route.windows(2) {
                if let Some(d) = direction_between(pair[0], pair[1]) {
                    lines += d.turn_cost(incoming);
                    incoming = Some(d);
                }
            }
            lines
        }
    }
}

/// Boustrophedon route: row 0 left to right, row 1 right to left, and so on,
/// dropping one point down between rows.
///
/// This is the simple baseline cover. It uses 2N − 1 lines for N ≥ 2 and
/// starts at the origin.
///
/// # Examples
/// ```
/// use linecover_solver::engine::{Grid, Point};
/// use linecover_solver::utils::{count_lines, zigzag_route};
///
/// let grid = Grid::new(3).unwrap();
/// let route = zigzag_route(&grid);
/// assert_eq!(route[0], Point::new(0, 0));
/// assert_eq!(route[3], Point::new(1, 2));
/// assert_eq!(count_lines(&route), 5);
/// ```
pub fn zigzag_route(grid: &Grid) -> Vec<Point> {
    let n = grid.size();
    let mut route = Vec::with_capacity(grid.point_count());
    for row in 0..n {
        if row % 2 == 0 {
            route.extend((0..n).map(|col| Point::new(row, col)));
        } else {
            route.extend((0..n).rev().map(|col| Point::new(row, col)));
        }
    }
    route
}

/// Validates a route as a pen path covering `grid`.
///
/// # Checks
/// - The route is non-empty and every point lies inside the grid.
/// - Consecutive points are one unit move apart.
/// - No unit edge is drawn twice (points may be crossed again).
/// - Every lattice point appears somewhere on the route.
///
/// # Returns
/// * `Ok(RouteSummary)` if all checks pass.
/// * `Err(String)` describing the first violation.
pub fn check_route(grid: &Grid, route: &[Point]) -> Result<RouteSummary, String> {
    let Some(&first) = route.first() else {
        return Err("Route is empty".to_string());
    };

    for (i, &p) in route.iter().enumerate() {
        if !grid.contains(p) {
            return Err(format!(
                "Point {} at position {} is outside the {}x{} grid",
                p,
                i,
                grid.size(),
                grid.size()
            ));
        }
    }

    let mut ledger = EdgeLedger::new(*grid);
    let mut visited = grid.mask_of(first);
    let mut revisits = 0;
    for (step, pair) in route.windows(2).enumerate() {
        let (p, q) = (pair[0], pair[1]);
        let edge = Edge::between(p, q)
            .ok_or_else(|| format!("Step {} from {} to {} is not a unit move", step, p, q))?;
        if !ledger.acquire(edge) {
            return Err(format!("Edge {} is drawn twice (step {})", edge, step));
        }
        let bit = grid.bit(q);
        if visited.contains(bit) {
            revisits += 1;
        }
        visited = visited.with(bit);
    }

    if !grid.is_covered(visited) {
        let missing: Vec<Point> = grid
            .points()
            .filter(|&p| !visited.contains(grid.bit(p)))
            .collect();
        return Err(format!(
            "Route misses {} point(s), first {}",
            missing.len(),
            missing[0]
        ));
    }

    Ok(RouteSummary {
        lines: count_lines(route),
        edges: ledger.len(),
        revisits,
    })
}

/// Formats a route the way the solver reports it: `(r, c) -> (r, c) -> END`.
pub fn format_route(route: &[Point]) -> String {
    let mut out = String::new();
    for p in route {
        out.push_str(&format!("{} -> ", p));
    }
    out.push_str("END");
    out
}

/// Parses a route in the [`format_route`] format.
///
/// Whitespace (including newlines) around tokens is ignored, and a trailing
/// `END` marker is optional.
///
/// # Examples
/// ```
/// use linecover_solver::engine::Point;
/// use linecover_solver::utils::parse_route;
///
/// let route = parse_route("(0, 0) -> (0, 1) -> END").unwrap();
/// assert_eq!(route, vec![Point::new(0, 0), Point::new(0, 1)]);
/// assert!(parse_route("(0, 0) -> (x, 1)").is_err());
/// ```
pub fn parse_route(s: &str) -> Result<Vec<Point>, String> {
    let tokens: Vec<&str> = s.split("->").map(str::trim).collect();
    let mut route = Vec::with_capacity(tokens.len());

    for (i, token) in tokens.iter().enumerate() {
        if token.is_empty() {
            continue;
        }
        if *token == "END" {
            if i + 1 != tokens.len() {
                return Err(format!("END marker at token {} is not the last token", i));
            }
            break;
        }
        let inner = token
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .ok_or_else(|| format!("Token {} '{}' is not of the form (row, col)", i, token))?;
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        if parts.len() != 2 {
            return Err(format!("Token {} '{}' must have exactly two coordinates", i, token));
        }
        let row = parts[0]
            .parse::<usize>()
            .map_err(|e| format!("Invalid row '{}' in token {}: {}", parts[0], i, e))?;
        let col = parts[1]
            .parse::<usize>()
            .map_err(|e| format!("Invalid column '{}' in token {}: {}", parts[1], i, e))?;
        route.push(Point::new(row, col));
    }

    Ok(route)
}

/// Draws a route onto the lattice as text.
///
/// Points are `S` (start), `E` (end), `o` (on the route) or `.` (not covered);
/// drawn edges are `-` and `|`. Points outside the grid are ignored.
///
/// ```text
/// o-o-o
/// |   |
/// o-S o
///     |
/// E-o-o
/// ```
pub fn render_route(grid: &Grid, route: &[Point]) -> String {
    let n = grid.size();
    let width = 2 * n - 1;
    let mut canvas = vec![vec![' '; width]; width];
    for p in grid.points() {
        canvas[2 * p.row][2 * p.col] = '.';
    }

    for pair in route.windows(2) {
        let (p, q) = (pair[0], pair[1]);
        if !grid.contains(p) || !grid.contains(q) {
            continue;
        }
        if let Some(edge) = Edge::between(p, q) {
            let (a, b) = edge.endpoints();
            let (row, col) = (a.row + b.row, a.col + b.col);
            canvas[row][col] = if edge.is_horizontal() { '-' } else { '|' };
        }
    }
    for &p in route.iter().filter(|&&p| grid.contains(p)) {
        canvas[2 * p.row][2 * p.col] = 'o';
    }
    if let Some(&last) = route.last().filter(|p| grid.contains(**p)) {
        canvas[2 * last.row][2 * last.col] = 'E';
    }
    if let Some(&first) = route.first().filter(|p| grid.contains(**p)) {
        canvas[2 * first.row][2 * first.col] = 'S';
    }

    canvas
        .into_iter()
        .map(|row| row.into_iter().collect::<String>().trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

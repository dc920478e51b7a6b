use anyhow::{anyhow, Context, Result};
use clap::Parser;
use linecover_solver::engine::{Grid, Point};
use linecover_solver::utils::{check_route, parse_route, render_route};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::fmt::SubscriberBuilder;

#[derive(Parser, Debug)]
#[command(author, version, about = "Validate a pen route over an N x N lattice", long_about = None)]
struct Args {
    /// Number of lattice points per side
    #[arg(short, long)]
    size: usize,

    /// File holding the route, e.g. "(0, 0) -> (0, 1) -> ... -> END"
    route_file: PathBuf,
}

fn read_route_file(path: &PathBuf) -> Result<Vec<Point>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read route file {}", path.display()))?;
    parse_route(&content).map_err(|e| anyhow!("invalid route format: {}", e))
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).with_writer(std::io::stderr).init();
    let args = Args::parse();

    let grid = Grid::new(args.size)?;
    let route = read_route_file(&args.route_file)?;
    println!("Loaded route with {} points from {}\n", route.len(), args.route_file.display());
    println!("{}\n", render_route(&grid, &route));

    let summary = check_route(&grid, &route).map_err(|e| anyhow!("route rejected: {}", e))?;
    println!("Route covers the {0}x{0} grid.", args.size);
    println!("  Lines: {}", summary.lines);
    println!("  Edges: {}", summary.edges);
    println!("  Revisited points: {}", summary.revisits);
    Ok(())
}

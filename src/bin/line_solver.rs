use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use linecover_solver::engine::Grid;
use linecover_solver::heuristics::MoveOrder;
use linecover_solver::solver::{LineCoverSolver, Solution, SolverConfig, StartPolicy};
use linecover_solver::utils::{check_route, format_route, render_route, zigzag_route};
use linecover_solver::verify::{self, Verification, MAX_VERIFY_SIZE};
use serde::Serialize;
use tracing::Level;
use tracing_subscriber::fmt::SubscriberBuilder;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OrderArg {
    Constrained,
    Declared,
    Shuffled,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StartsArg {
    /// The 3x3 block around the grid center
    Center,
    /// Every lattice point
    All,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Find the fewest straight lines covering an N x N lattice", long_about = None)]
struct Args {
    /// Number of lattice points per side (practical up to 5)
    #[arg(short, long)]
    size: usize,

    /// Direction ordering used by the search
    #[arg(long, value_enum, default_value_t = OrderArg::Constrained)]
    order: OrderArg,

    /// Seed for the shuffled ordering
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Start points to search from
    #[arg(long, value_enum, default_value_t = StartsArg::Center)]
    starts: StartsArg,

    /// Disable the transposition memo
    #[arg(long)]
    no_memo: bool,

    /// Cross-check the conjectured 2N-2 target with the breadth-first engine
    #[arg(long)]
    verify: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct Report<'a> {
    solution: &'a Solution,
    route: String,
    baseline_lines: u32,
    conjectured_target: u32,
    verification: Option<Verification>,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    SubscriberBuilder::default()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn config_from(args: &Args) -> SolverConfig {
    SolverConfig {
        order: match args.order {
            OrderArg::Constrained => MoveOrder::Constrained,
            OrderArg::Declared => MoveOrder::Declared,
            OrderArg::Shuffled => MoveOrder::Shuffled { seed: args.seed },
        },
        starts: match args.starts {
            StartsArg::Center => StartPolicy::CenterAdjacent,
            StartsArg::All => StartPolicy::All,
        },
        memo: !args.no_memo,
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let grid = Grid::new(args.size).with_context(|| format!("cannot solve a grid of size {}", args.size))?;
    let config = config_from(&args);
    let baseline = check_route(&grid, &zigzag_route(&grid))
        .map_err(anyhow::Error::msg)
        .context("zigzag baseline is not a valid cover")?;
    let target = verify::conjectured_target(args.size);

    let verification = if args.verify {
        if args.size <= MAX_VERIFY_SIZE {
            Some(verify::verify(args.size, target)?)
        } else {
            tracing::warn!(size = args.size, max = MAX_VERIFY_SIZE, "grid too large to verify, skipping");
            None
        }
    } else {
        None
    };

    if !args.json {
        println!("Solving {0}x{0} grid ({1} order, {2:?} starts)...\n", args.size, config.order, config.starts);
    }

    let mut solver = LineCoverSolver::new(grid, config);
    let Some(solution) = solver.solve() else {
        println!("No solution found.");
        return Ok(());
    };

    if args.json {
        let report = Report {
            solution: &solution,
            route: format_route(&solution.path),
            baseline_lines: baseline.lines,
            conjectured_target: target,
            verification,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Minimum number of lines: {} (Target: {}, zigzag baseline: {})", solution.lines, target, baseline.lines);
    println!("\nPath (straight line segments):\n{}", format_route(&solution.path));
    println!("\n{}\n", render_route(&grid, &solution.path));
    println!(
        "Search: {} nodes, {} pruned by bound, {} memo hits, {} improvements",
        solution.stats.nodes, solution.stats.pruned, solution.stats.memo_hits, solution.stats.improvements
    );
    if let Some(v) = verification {
        if v.achievable {
            println!("Breadth-first check: {} lines are achievable from the origin", v.target);
        } else {
            println!(
                "Breadth-first check: {} lines are not achievable from the origin ({} states explored)",
                v.target, v.states_explored
            );
        }
    }
    Ok(())
}

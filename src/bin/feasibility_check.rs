use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use linecover_solver::verify;
use tracing::Level;
use tracing_subscriber::fmt::SubscriberBuilder;

#[derive(Parser, Debug)]
#[command(author, version, about = "Breadth-first check of a line target on an N x N lattice", long_about = None)]
struct Args {
    /// Number of lattice points per side (at most 4)
    #[arg(short, long)]
    size: usize,

    /// Exact number of lines to look for [default: 2N-2]
    #[arg(short, long)]
    target: Option<u32>,

    /// Report the fewest lines reachable from the origin instead
    #[arg(long, conflicts_with = "target")]
    minimum: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    SubscriberBuilder::default()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if !args.json {
        println!("Solving for grid size N = {}", args.size);
    }

    if args.minimum {
        let minimum = verify::minimum_lines(args.size)
            .with_context(|| format!("cannot search a grid of size {}", args.size))?;
        if args.json {
            println!("{}", serde_json::json!({ "size": args.size, "minimum": minimum }));
        } else {
            match minimum {
                Some(lines) => println!("Minimum number of lines used: {}", lines),
                None => println!("No cover starting at the origin was found"),
            }
        }
        return Ok(());
    }

    let target = args.target.unwrap_or_else(|| verify::conjectured_target(args.size));
    let report = verify::verify(args.size, target)
        .with_context(|| format!("cannot verify a grid of size {}", args.size))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.achievable {
        println!("A cover with exactly {} lines exists ({} states explored)", target, report.states_explored);
    } else {
        println!(
            "It is not possible to solve with exactly {} lines for N = {} ({} states explored)",
            target, args.size, report.states_explored
        );
    }
    Ok(())
}

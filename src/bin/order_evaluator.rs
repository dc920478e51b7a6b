use anyhow::{bail, Result};
use clap::Parser;
use linecover_solver::heuristics::MoveOrder;
use linecover_solver::solver::{solve_grid_with, SolverConfig};
use std::collections::BTreeMap;
use tracing_subscriber::fmt::SubscriberBuilder;

#[derive(Parser, Debug)]
#[command(author, version, about = "Compare direction orderings by search effort", long_about = None)]
struct Args {
    /// Grid sizes to evaluate
    #[arg(long, value_delimiter = ',', default_values_t = [2usize, 3, 4])]
    sizes: Vec<usize>,

    /// Number of shuffled orderings (seeds 0..N) to include
    #[arg(long, default_value_t = 5)]
    seeds: u64,
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).with_writer(std::io::stderr).init();
    let args = Args::parse();

    let mut strategies = vec![MoveOrder::Constrained, MoveOrder::Declared];
    strategies.extend((0..args.seeds).map(|seed| MoveOrder::Shuffled { seed }));

    // strategy label -> node counts, one per size
    let mut all_nodes: BTreeMap<String, Vec<u64>> = BTreeMap::new();

    println!("Evaluating {} orderings on sizes {:?}...", strategies.len(), args.sizes);

    for &size in &args.sizes {
        println!("\nGrid {0}x{0}", size);
        let mut optimum: Option<u32> = None;

        for &order in &strategies {
            let config = SolverConfig {
                order,
                ..SolverConfig::default()
            };
            let Some(solution) = solve_grid_with(size, config)? else {
                println!("  Ordering: {:<18} no cover found", order.to_string());
                continue;
            };
            println!(
                "  Ordering: {:<18} Lines: {:<3} Nodes: {:<10} Memo hits: {}",
                order.to_string(),
                solution.lines,
                solution.stats.nodes,
                solution.stats.memo_hits
            );

            match optimum {
                None => optimum = Some(solution.lines),
                Some(lines) if lines != solution.lines => bail!(
                    "ordering {} found {} lines on size {}, expected {}",
                    order,
                    solution.lines,
                    size,
                    lines
                ),
                Some(_) => {}
            }
            all_nodes.entry(order.to_string()).or_default().push(solution.stats.nodes);
        }
    }

    println!("\n--- Evaluation Complete ---");
    println!("\n--- Average Nodes ---");

    let mut averages: Vec<(String, f64)> = all_nodes
        .into_iter()
        .filter(|(_, nodes)| !nodes.is_empty())
        .map(|(name, nodes)| {
            let total: u64 = nodes.iter().sum();
            (name, total as f64 / nodes.len() as f64)
        })
        .collect();

    // Fewest nodes first
    averages.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    for (name, avg) in averages {
        println!("Ordering {:<18}: Average Nodes = {:.1}", name, avg);
    }
    Ok(())
}

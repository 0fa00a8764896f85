//! tinyspice command-line interface.

mod deck;
mod output;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use log::{LevelFilter, info};
use tinyspice_core::{Layout, NodeIndex};
use tinyspice_solver::{
    AnalysisConfig, NewtonConfig, solve_ac, solve_dc_operating_point, solve_dc_sweep,
    solve_transient,
};

use crate::deck::{Analysis, Deck};

#[derive(Parser)]
#[command(name = "tinyspice")]
#[command(about = "A small MNA circuit simulator for DC, AC and transient analysis")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the analysis described by a deck
    Run {
        /// Path to the JSON deck
        deck: PathBuf,

        /// Print the assembled system before solving
        #[arg(long)]
        dump_matrix: bool,

        /// Iteration cap for circuits with diodes
        #[arg(long, value_name = "N")]
        max_iter: Option<usize>,

        /// Absolute convergence tolerance
        #[arg(long)]
        abstol: Option<f64>,

        /// Relative convergence tolerance
        #[arg(long)]
        reltol: Option<f64>,
    },

    /// Print the unknown layout of a deck's circuit
    Nodes {
        /// Path to the JSON deck
        deck: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    let level = match verbose {
        0 => None,
        1 => Some(LevelFilter::Info),
        2 => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    };
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            deck,
            dump_matrix,
            max_iter,
            abstol,
            reltol,
        } => {
            let mut newton = NewtonConfig::default();
            if let Some(n) = max_iter {
                newton = newton.with_max_iterations(n);
            }
            if let Some(tol) = abstol {
                newton = newton.with_abs_tol(tol);
            }
            if let Some(tol) = reltol {
                newton = newton.with_rel_tol(tol);
            }
            let config = AnalysisConfig::default().with_newton(newton);
            run(&deck, dump_matrix, &config)
        }
        Commands::Nodes { deck } => print_nodes(&deck),
    }
}

fn run(path: &Path, dump_matrix: bool, config: &AnalysisConfig) -> Result<()> {
    let deck = Deck::load(path)?;
    info!("loaded {} ({} devices)", path.display(), deck.circuit.devices().len());

    if let Some(title) = &deck.circuit.title {
        println!("{title}");
        println!();
    }
    if dump_matrix {
        output::print_dump(&deck.circuit, &deck.analysis, config)?;
    }

    let analysis = deck.analysis.name();
    match &deck.analysis {
        Analysis::Op => {
            let solution = solve_dc_operating_point(&deck.circuit, config)
                .with_context(|| format!("{analysis} analysis failed"))?;
            output::print_operating_point(&solution, &deck.probes(&solution.nodes))
        }
        Analysis::Dc(params) => {
            let result = solve_dc_sweep(&deck.circuit, params, config)
                .with_context(|| format!("{analysis} analysis failed"))?;
            output::print_dc_sweep(&result, &deck.probes(&result.nodes))
        }
        Analysis::Ac(params) => {
            let result = solve_ac(&deck.circuit, params, config)
                .with_context(|| format!("{analysis} analysis failed"))?;
            output::print_ac(&result, &deck.probes(&result.nodes))
        }
        Analysis::Tran(params) => {
            let result = solve_transient(&deck.circuit, params, config)
                .with_context(|| format!("{analysis} analysis failed"))?;
            output::print_transient(&result, &deck.probes(&result.nodes))
        }
    }
}

fn print_nodes(path: &Path) -> Result<()> {
    let deck = Deck::load(path)?;

    for (title, layout) in [
        ("DC / AC unknowns", Layout::FrequencyDomain),
        ("Transient unknowns", Layout::Transient),
    ] {
        let index = NodeIndex::build(&deck.circuit, layout)?;
        println!(
            "{title} ({} nodes, {} branches):",
            index.node_count(),
            index.branch_count()
        );
        for (i, name) in index.names().enumerate() {
            println!("{i:>6}  {name}");
        }
        println!();
    }
    Ok(())
}

/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Command-line driver.
//!
//! `run` schedules a task-graph file against a deadline; `generate` writes
//! a random graph for experiments.  Exit code is non-zero on parse,
//! topology or internal failures; soft shortfalls (infeasible deadline,
//! unimprovable plan) are printed but still exit 0 with the best-effort
//! plan.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dvsched::generator::{self, GeneratorSpec};
use dvsched::{format, gantt, RunConfig, Scheduler};

#[derive(Parser)]
#[command(
    name = "dvsched",
    version,
    about = "Energy-aware deadline-constrained DAG scheduler"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Schedule a task graph against a deadline.
    Run {
        /// Task-graph input file.
        graph: PathBuf,

        /// Deadline in the graph's time units.
        #[arg(short, long)]
        deadline: i64,

        /// Core count (overrides the configuration file).
        #[arg(short, long)]
        cores: Option<usize>,

        /// Optional YAML run configuration.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the per-core timelines.
        #[arg(long)]
        gantt: bool,
    },

    /// Generate a random task graph and write it in canonical form.
    Generate {
        /// Output file.
        out: PathBuf,

        #[arg(long, default_value_t = 12)]
        tasks: usize,

        #[arg(long, default_value_t = 3)]
        points: usize,

        #[arg(long, default_value_t = 7)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Run {
            graph,
            deadline,
            cores,
            config,
            gantt: show_gantt,
        } => run(&graph, deadline, cores, config.as_deref(), show_gantt),
        Command::Generate {
            out,
            tasks,
            points,
            seed,
        } => {
            let graph = generator::generate(&GeneratorSpec { tasks, points, seed });
            format::write_task_graph(&out, &graph)?;
            println!(
                "wrote {} task(s), {} transfer(s) to {}",
                graph.len(),
                graph.transfers.len(),
                out.display()
            );
            Ok(())
        }
    }
}

fn run(
    graph_path: &std::path::Path,
    deadline: i64,
    cores: Option<usize>,
    config_path: Option<&std::path::Path>,
    show_gantt: bool,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => RunConfig::load_from_file(path)?,
        None => RunConfig::default(),
    };
    if let Some(cores) = cores {
        config.cores = cores;
    }

    let mut graph = format::read_task_graph(graph_path)?;
    let outcome = Scheduler::from_config(&config).run(&mut graph, deadline)?;

    println!(
        "makespan {} (deadline {}), total energy {}",
        outcome.makespan, deadline, outcome.total_energy
    );
    println!(
        "policies: {}",
        outcome
            .policies
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    );
    for shortfall in &outcome.shortfalls {
        println!("warning: {shortfall}");
    }
    if show_gantt {
        print!("{}", gantt::render(&outcome.plan));
    }

    Ok(())
}

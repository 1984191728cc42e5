//! # lwwset
//!
//! Stress and convergence harness for the LWW element set. Replicas mutate
//! concurrently, merge in random pairs, and are checked for convergence.

use clap::{Args, Parser, Subcommand};
use lwwset_core::{Bias, LwwError};
use lwwset_gossip::NetworkConfig;
use std::process::ExitCode;
use stress_test::{gossip_simulation, stress_test_lwwset, stress_test_scaling, StressConfig};
use tracing::error;
use tracing_subscriber::EnvFilter;


// ─── CLI ───────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "lwwset")]
#[command(about = "Stress and convergence harness for the LWW element set")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Concurrent replicas, random pairwise merges, final convergence check
    Run(WorkloadArgs),
    /// Repeat the run at increasing replica counts
    Scaling {
        #[arg(long, default_value_t = 20)]
        max_replicas: usize,
        #[arg(long, default_value_t = 2)]
        step: usize,
        #[command(flatten)]
        workload: WorkloadArgs,
    },
    /// Gossip over a simulated network with loss, duplication and reordering
    Gossip {
        #[arg(long, default_value_t = 0.1)]
        loss: f64,
        #[arg(long, default_value_t = 0.2)]
        dups: f64,
        #[arg(long, default_value_t = 0.3)]
        reorder: f64,
        #[arg(long, default_value_t = 50)]
        max_rounds: usize,
        #[command(flatten)]
        workload: WorkloadArgs,
    },
}

#[derive(Args, Clone)]
struct WorkloadArgs {
    /// Number of replicas
    #[arg(long, default_value_t = 4)]
    replicas: usize,
    /// Local operations per replica
    #[arg(long, default_value_t = 100)]
    ops: usize,
    /// Random pairwise merges
    #[arg(long, default_value_t = 200)]
    syncs: usize,
    /// Distinct elements to draw from
    #[arg(long, default_value_t = 50)]
    elements: usize,
    /// Probability that an operation is a remove
    #[arg(long, default_value_t = 0.3)]
    remove_ratio: f64,
    /// Tie-break policy: add-wins or remove-wins
    #[arg(long, default_value = "remove-wins")]
    bias: Bias,
    /// Seed for reproducible workloads
    #[arg(long)]
    seed: Option<u64>,
}

impl Default for WorkloadArgs {
    fn default() -> Self {
        let defaults = StressConfig::default();
        Self {
            replicas: defaults.num_replicas,
            ops: defaults.ops_per_replica,
            syncs: defaults.num_syncs,
            elements: defaults.element_pool,
            remove_ratio: defaults.remove_ratio,
            bias: defaults.bias,
            seed: defaults.seed,
        }
    }
}

impl From<WorkloadArgs> for StressConfig {
    fn from(args: WorkloadArgs) -> Self {
        Self {
            num_replicas: args.replicas,
            ops_per_replica: args.ops,
            num_syncs: args.syncs,
            element_pool: args.elements,
            remove_ratio: args.remove_ratio,
            bias: args.bias,
            seed: args.seed,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Commands::Run(WorkloadArgs::default()));

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(async_main(command)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            error!("replicas did not converge");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn async_main(command: Commands) -> Result<bool, LwwError> {
    println!("Started at {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));

    match command {
        Commands::Run(workload) => {
            let stats = stress_test_lwwset(&workload.into()).await?;
            stats.print();
            Ok(stats.converged)
        }
        Commands::Scaling {
            max_replicas,
            step,
            workload,
        } => {
            let all = stress_test_scaling(max_replicas, step, &workload.into()).await?;
            println!("\n✓ Scaling analysis completed ({} runs)", all.len());
            Ok(all.iter().all(|s| s.converged))
        }
        Commands::Gossip {
            loss,
            dups,
            reorder,
            max_rounds,
            workload,
        } => {
            let config: StressConfig = workload.into();
            let network = NetworkConfig {
                loss_rate: loss,
                dup_rate: dups,
                reorder_rate: reorder,
                seed: config.seed.unwrap_or_default(),
            };
            let report = gossip_simulation(&config, network, max_rounds)?;
            println!("\nGossip simulation");
            println!("  Rounds:             {}", report.rounds);
            println!("  Messages sent:      {}", report.messages_sent);
            println!("  Messages delivered: {}", report.messages_delivered);
            println!("  Duplicates:         {}", report.duplicated);
            println!("  Visible elements:   {}", report.visible_elements);
            println!("  Converged:          {}", report.converged);
            Ok(report.converged)
        }
    }
}

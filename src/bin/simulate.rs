//! Simulation Binary
//!
//! Drives one auto-scaling run from command-line parameters and
//! prints the summary, or the full trace, as JSON.

use clap::Parser;
use upfsim::policy::migration::Migration;
use upfsim::policy::placement::Placement;
use upfsim::sim::config::Config;
use upfsim::sim::config::Throughput;
use upfsim::sim::scheduler::Scheduler;

#[derive(Parser)]
#[command(about = "event-driven simulation of UPF auto-scaling")]
struct Args {
    /// id of this simulation run
    #[arg(long, default_value_t = 0)]
    run_id: u32,
    /// placement rule: 1 first-fit, 2 least-loaded, 3 most-loaded
    #[arg(long, default_value_t = 1)]
    upf_case: u8,
    /// migration regime, 1 through 6
    #[arg(long, default_value_t = 1)]
    migration_case: u8,
    /// maximum number of UPF instances (L)
    #[arg(long)]
    max_upfs: usize,
    /// minimum number of UPF instances (M)
    #[arg(long, default_value_t = 0)]
    min_upfs: usize,
    /// sessions per UPF instance (C)
    #[arg(long)]
    max_sessions_per_upf: usize,
    /// scale-out threshold (T1)
    #[arg(long, default_value_t = 0)]
    scale_out_threshold: usize,
    /// scale-in threshold (T2)
    #[arg(long, default_value_t = 0)]
    scale_in_threshold: usize,
    /// simulation time in milliseconds
    #[arg(long)]
    simulation_time: u64,
    /// mean arrivals per second (λ)
    #[arg(long)]
    arrival_rate: f64,
    /// inverse mean session duration in seconds (μ)
    #[arg(long)]
    mu: f64,
    /// seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
    /// per-session demand rate (β); enables the throughput variant
    #[arg(long, requires = "upf_throughput_capacity")]
    throughput_rate: Option<f64>,
    /// per-instance throughput capacity
    #[arg(long, requires = "throughput_rate")]
    upf_throughput_capacity: Option<f64>,
    /// dump the full trace instead of just the summary
    #[arg(long)]
    trace: bool,
    /// narrate every event to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    upfsim::init(match args.verbose {
        true => log::LevelFilter::Debug,
        false => log::LevelFilter::Info,
    });
    let config = Config {
        run_id: args.run_id,
        placement: Placement::try_from(args.upf_case)?,
        migration: Migration::try_from(args.migration_case)?,
        max_upfs: args.max_upfs,
        min_upfs: args.min_upfs,
        capacity: args.max_sessions_per_upf,
        scale_out: args.scale_out_threshold,
        scale_in: args.scale_in_threshold,
        simulation_time: args.simulation_time,
        arrival_rate: args.arrival_rate,
        mu: args.mu,
        seed: args.seed,
        throughput: match (args.throughput_rate, args.upf_throughput_capacity) {
            (Some(rate), Some(capacity)) => Some(Throughput { rate, capacity }),
            _ => None,
        },
    };
    let outcome = Scheduler::new(config)?.run()?;
    match args.trace {
        true => println!("{}", serde_json::to_string_pretty(&outcome.trace)?),
        false => println!("{}", serde_json::to_string(&outcome.summary)?),
    }
    Ok(())
}

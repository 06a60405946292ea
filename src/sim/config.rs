use crate::Load;
use crate::Rate;
use crate::policy::migration::Migration;
use crate::policy::placement::Placement;
use serde::Deserialize;
use serde::Serialize;

/// throughput-aware variant: sessions carry an exponentially
/// distributed demand and instances a matching capacity that
/// placement must also respect.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Throughput {
    /// rate for per-session demand draws (β)
    pub rate: Rate,
    /// per-instance throughput capacity
    pub capacity: Load,
}

/// the full parameter set for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub run_id: u32,
    pub placement: Placement,
    pub migration: Migration,
    /// instance-count envelope (L and M)
    pub max_upfs: usize,
    pub min_upfs: usize,
    /// sessions per instance (C)
    pub capacity: usize,
    /// pre-warming margin (T1)
    pub scale_out: usize,
    /// consolidation margin (T2)
    pub scale_in: usize,
    /// virtual horizon in milliseconds
    pub simulation_time: u64,
    /// mean arrivals per second (λ)
    pub arrival_rate: Rate,
    /// inverse mean session duration in seconds (μ)
    pub mu: Rate,
    /// omit for a non-reproducible run
    pub seed: Option<u64>,
    pub throughput: Option<Throughput>,
}

impl Config {
    /// reject parameter combinations that cannot be simulated
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.max_upfs >= 1, "at least one upf instance is required");
        anyhow::ensure!(
            self.min_upfs <= self.max_upfs,
            "min upf instances exceeds max upf instances"
        );
        anyhow::ensure!(self.capacity >= 1, "vanishing per-instance session capacity");
        anyhow::ensure!(self.simulation_time > 0, "vanishing simulation time");
        anyhow::ensure!(self.arrival_rate > 0., "vanishing arrival rate");
        anyhow::ensure!(self.mu > 0., "vanishing service rate");
        if let Some(throughput) = self.throughput {
            anyhow::ensure!(throughput.rate > 0., "vanishing demand rate");
            anyhow::ensure!(throughput.capacity > 0., "vanishing throughput capacity");
        }
        Ok(())
    }
}

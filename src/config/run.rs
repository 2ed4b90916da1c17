//! Configuration for runs and replication execution
//!
//! A run is one seeded simulation up to a horizon. Replications repeat a run
//! with different seeds, sequentially or on a rayon pool.

use crate::core::errors::{Result, SimError};
use crate::core::types::SimTime;
use serde::{Deserialize, Serialize};

/// Seed, horizon and telemetry interval of a single run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub name: String,
    pub seed: u64,
    /// Simulated seconds to run
    pub horizon_sec: SimTime,
    /// Width of production aggregation intervals
    pub telemetry_interval_sec: SimTime,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new(8.0 * 3600.0)
    }
}

impl RunConfig {
    /// Create a run with default seed and telemetry interval
    pub fn new(horizon_sec: SimTime) -> Self {
        Self {
            name: "run".to_string(),
            seed: 42,
            horizon_sec,
            telemetry_interval_sec: 300.0,
        }
    }

    pub fn from_hours(hours: f64) -> Self {
        Self::new(hours * 3600.0)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_telemetry_interval(mut self, interval_sec: SimTime) -> Self {
        self.telemetry_interval_sec = interval_sec;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let context = format!("run '{}'", self.name);
        if !self.horizon_sec.is_finite() || self.horizon_sec < 0.0 {
            return Err(SimError::configuration(
                context,
                format!("horizon_sec must be a non-negative number, got {}", self.horizon_sec),
            ));
        }
        if !self.telemetry_interval_sec.is_finite() || self.telemetry_interval_sec <= 0.0 {
            return Err(SimError::configuration(
                context,
                format!("telemetry_interval_sec must be positive, got {}", self.telemetry_interval_sec),
            ));
        }
        Ok(())
    }
}

/// Enumeration of supported concurrency modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConcurrencyMode {
    /// Replications run one after another on the calling thread
    Sequential,
    /// Replications run concurrently on a rayon thread pool
    Rayon,
}

impl Default for ConcurrencyMode {
    fn default() -> Self {
        ConcurrencyMode::Sequential
    }
}

/// Configuration for a set of independent replications
///
/// Each seed produces one simulation; results are identical whichever
/// concurrency mode is selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicationConfig {
    /// One replication per seed, reported in this order
    pub seeds: Vec<u64>,
    /// The concurrency mode to use for execution
    pub concurrency_mode: ConcurrencyMode,
    /// The size of the thread pool for parallel execution
    /// Only relevant when concurrency_mode is Rayon
    pub thread_pool_size: Option<usize>,
}

impl ReplicationConfig {
    /// Create a replication configuration with default values
    ///
    /// Default configuration runs no seeds in Sequential mode
    pub fn new() -> Self {
        Self {
            seeds: Vec::new(),
            concurrency_mode: ConcurrencyMode::default(),
            thread_pool_size: None,
        }
    }

    /// Seeds `first..first + count`
    pub fn with_seed_range(mut self, first: u64, count: u64) -> Self {
        self.seeds = (first..first + count).collect();
        self
    }

    pub fn with_seeds(mut self, seeds: Vec<u64>) -> Self {
        self.seeds = seeds;
        self
    }

    /// Set the concurrency mode for the replications
    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = mode;
        self
    }

    /// Set the thread pool size for parallel execution
    ///
    /// # Note
    /// This setting only affects execution when concurrency_mode is Rayon
    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.thread_pool_size = Some(size);
        self
    }
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self::new()
    }
}

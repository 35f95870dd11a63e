//! Seeded multi-scenario campaign runner.

use tracing::{debug, info};

use crate::feed::DeliveryConfig;
use crate::oracle::{ConvergenceOracle, OracleResult};

/// Campaign parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CampaignConfig {
    /// First seed; scenarios run for `seeds` consecutive values.
    pub base_seed: u64,
    /// How many seeded worlds to run.
    pub seeds: u64,
    /// Randomized delivery orders compared per world.
    pub orders_per_world: usize,
    pub delivery: DeliveryConfig,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            base_seed: 0,
            seeds: 64,
            orders_per_world: 8,
            delivery: DeliveryConfig::default(),
        }
    }
}

/// Outcome of a campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignReport {
    pub scenarios: u64,
    /// Failing seeds with their oracle diagnostics.
    pub failures: Vec<(u64, OracleResult)>,
}

impl CampaignReport {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run the oracle over `config.seeds` consecutive seeded worlds.
#[must_use]
pub fn run_campaign(config: &CampaignConfig) -> CampaignReport {
    let oracle = ConvergenceOracle {
        orders: config.orders_per_world,
        config: config.delivery,
    };

    let mut failures = Vec::new();
    for seed in config.base_seed..config.base_seed + config.seeds {
        let result = oracle.check_all(seed);
        if result.passed {
            debug!(seed, "scenario passed");
        } else {
            info!(seed, violations = result.violations.len(), "scenario failed");
            failures.push((seed, result));
        }
    }

    CampaignReport {
        scenarios: config.seeds,
        failures,
    }
}

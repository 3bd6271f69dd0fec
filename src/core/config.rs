/*!
# Evoclus Configuration

This module defines the knobs of the clustering engine. All fields have sane
defaults, so `ClusteringConfig::default()` is a valid single-round configuration.
Configs serialize to and from JSON for experiment scripting.

Diagnostics are emitted through `tracing`; embedders that do not install their
own subscriber can opt in with [`init_logging`].
*/

use crate::core::error::Result;
use serde::{Deserialize, Serialize};
use tracing::Level;

/// Configuration of the evolutionary clustering engine.
///
/// The `lm_` prefix covers the Louvain multilevel optimizer, the `mh_` prefix the
/// metaheuristic (population and operators).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Random seed. Each island derives its own seed as
    /// `seed * island_count + island_rank`.
    pub seed: u64,
    /// Time limit in seconds; 0 performs a single round.
    pub time_limit: f64,
    /// Cap on the weighted size of a cluster during size-constrained label
    /// propagation; 0 means effectively unbounded.
    pub cluster_upperbound: i64,
    /// Minimum modularity improvement necessary to perform another node-move
    /// pass in the Louvain method.
    pub lm_minimum_quality_improvement: f64,
    /// Number of label propagation levels used before the Louvain method.
    pub lm_number_of_label_propagation_levels: u32,
    /// Number of iterations per label propagation level.
    pub lm_number_of_label_propagation_iterations: u32,
    /// 0 uses unconstrained label propagation for pre-coarsening; a positive
    /// factor switches to the size-constrained variant.
    pub lm_cluster_coarsening_factor: u32,
    /// Maximum population size per island.
    pub mh_pool_size: usize,
    /// Fraction of clusters eligible for splitting per mutation.
    pub mh_mutate_fraction: f64,
    /// Fraction of the time limit budgeted for seeding the initial population.
    pub mh_initial_population_fraction: f64,
    /// Number of evolve-and-insert steps per round.
    pub local_partitioning_repetitions: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        ClusteringConfig {
            seed: 0,
            time_limit: 0.0,
            cluster_upperbound: 0,
            lm_minimum_quality_improvement: 1e-6,
            lm_number_of_label_propagation_levels: 0,
            lm_number_of_label_propagation_iterations: 3,
            lm_cluster_coarsening_factor: 0,
            mh_pool_size: 250,
            mh_mutate_fraction: 0.1,
            mh_initial_population_fraction: 10.0,
            local_partitioning_repetitions: 1,
        }
    }
}

impl ClusteringConfig {
    /// Parses a configuration from a JSON string; missing fields keep defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the configuration to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Weighted cluster-size bound used by constrained pre-coarsening.
    ///
    /// An explicit `cluster_upperbound` wins; otherwise the bound is derived
    /// from the total node weight and the coarsening factor.
    pub fn effective_cluster_upperbound(&self, total_node_weight: i64) -> i64 {
        if self.cluster_upperbound > 0 {
            self.cluster_upperbound
        } else if self.lm_cluster_coarsening_factor > 0 {
            (total_node_weight / self.lm_cluster_coarsening_factor as i64).max(1)
        } else {
            i64::MAX / 2
        }
    }
}

/// Installs a tracing subscriber for the engine's diagnostics.
///
/// Rounds, operator decisions, and population improvements log at debug level
/// when `verbose`, only warnings otherwise. Does nothing when a subscriber is
/// already installed, so embedders keep control of their logging setup.
pub fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let _ = tracing_subscriber::fmt().with_max_level(level).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_roundtrip_keeps_defaults() {
        let config = ClusteringConfig::from_json(r#"{ "seed": 7, "time_limit": 2.5 }"#)
            .expect("valid json");
        assert_eq!(config.seed, 7);
        assert_eq!(config.time_limit, 2.5);
        assert_eq!(config.mh_pool_size, 250);
        assert_eq!(config.lm_number_of_label_propagation_iterations, 3);

        let json = config.to_json().expect("serializable");
        let reparsed = ClusteringConfig::from_json(&json).expect("valid json");
        assert_eq!(reparsed.seed, config.seed);
    }
}

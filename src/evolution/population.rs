/*!
# Population Manager

Bounded pool of candidate clusterings with diversity-aware replacement. When the
pool is full, a new individual that is not worse than the current worst evicts
the weaker individual it resembles most (smallest symmetric difference between
cut-edge fingerprints), which keeps the pool from collapsing onto near-copies of
one clustering.
*/

use crate::core::graph::CsrGraph;
use crate::evolution::individual::Individual;
use ordered_float::OrderedFloat;
use rand::prelude::*;
use rand::rngs::StdRng;
use tracing::{debug, info};

/// Bounded multiset of individuals with tournament selection.
#[derive(Debug)]
pub struct Population {
    individuals: Vec<Individual>,
    pool_size: usize,
    best_objective: f64,
}

impl Population {
    pub fn new(pool_size: usize) -> Self {
        Population {
            individuals: Vec::new(),
            pool_size,
            best_objective: f64::NEG_INFINITY,
        }
    }

    pub fn set_pool_size(&mut self, pool_size: usize) {
        self.pool_size = pool_size;
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.individuals.len() >= self.pool_size
    }

    /// Inserts `individual`, evicting by the diversity rule when full.
    ///
    /// A full pool discards the newcomer when it is worse than every member;
    /// otherwise, among the members it does not lose to, the one with the most
    /// similar cut-edge fingerprint is replaced.
    ///
    /// # Returns
    /// Whether the individual was kept.
    pub fn insert(&mut self, individual: Individual) -> bool {
        if individual.objective > self.best_objective {
            self.best_objective = individual.objective;
            info!(objective = individual.objective, "new best individual");
        }

        if self.individuals.len() < self.pool_size {
            self.individuals.push(individual);
            return true;
        }

        let worst_objective = self
            .individuals
            .iter()
            .map(|ind| ind.objective)
            .fold(f64::INFINITY, f64::min);
        if individual.objective < worst_objective {
            return false;
        }

        let mut smallest_difference = usize::MAX;
        let mut evict_index = 0;
        for (i, other) in self.individuals.iter().enumerate() {
            if other.objective <= individual.objective {
                let difference = other.fingerprint_distance(&individual);
                if difference < smallest_difference {
                    smallest_difference = difference;
                    evict_index = i;
                }
            }
        }

        debug!(
            evicted = self.individuals[evict_index].objective,
            inserted = individual.objective,
            "diversity replacement"
        );
        self.individuals[evict_index] = individual;
        true
    }

    /// Removes every individual from the pool.
    pub fn extinction(&mut self) {
        self.individuals.clear();
    }

    /// Two distinct uniformly random slots. Requires at least two individuals.
    pub fn two_random_indices(&self, rng: &mut StdRng) -> (usize, usize) {
        assert!(
            self.individuals.len() >= 2,
            "selection needs at least two individuals"
        );
        let first = rng.random_range(0..self.individuals.len());
        let mut second = rng.random_range(0..self.individuals.len());
        while first == second {
            second = rng.random_range(0..self.individuals.len());
        }
        (first, second)
    }

    /// Winner of one two-candidate tournament.
    pub fn tournament_one(&self, rng: &mut StdRng) -> &Individual {
        let (one, two) = self.two_random_indices(rng);
        if self.individuals[one].objective > self.individuals[two].objective {
            &self.individuals[one]
        } else {
            &self.individuals[two]
        }
    }

    /// Winners of two independent tournaments.
    ///
    /// When both winners tie on the objective, the second slot falls back to
    /// the `>=` winner of the second pair.
    pub fn tournament_pair(&self, rng: &mut StdRng) -> (&Individual, &Individual) {
        let (a, b) = self.two_random_indices(rng);
        let first = if self.individuals[a].objective > self.individuals[b].objective {
            a
        } else {
            b
        };

        let (c, d) = self.two_random_indices(rng);
        let mut second = if self.individuals[c].objective > self.individuals[d].objective {
            c
        } else {
            d
        };
        if self.individuals[first].objective == self.individuals[second].objective {
            second = if self.individuals[c].objective >= self.individuals[d].objective {
                c
            } else {
                d
            };
        }

        (&self.individuals[first], &self.individuals[second])
    }

    /// A uniformly random individual.
    pub fn random_individual(&self, rng: &mut StdRng) -> &Individual {
        let index = rng.random_range(0..self.individuals.len());
        &self.individuals[index]
    }

    /// The individual with the maximum objective.
    pub fn best(&self) -> Option<&Individual> {
        self.individuals
            .iter()
            .max_by_key(|ind| OrderedFloat(ind.objective))
    }

    /// Copies the fittest individual's clustering into the graph.
    ///
    /// # Returns
    /// The objective of the applied individual, or `f64::NEG_INFINITY` when the
    /// population is empty.
    pub fn apply_fittest(&self, graph: &mut CsrGraph) -> f64 {
        match self.best() {
            Some(best) => {
                graph.apply_partition(&best.partition_map);
                best.objective
            }
            None => f64::NEG_INFINITY,
        }
    }
}

/*!
# Island Controller

The per-island driver of the evolutionary search. Until the population is full
every round seeds it with fresh Louvain individuals (randomized label
propagation depth); once full, rounds pick a recombination or mutation operator
by a weighted decision and insert the child through the diversity filter.
Islands gossip their best clustering between rounds and elect a global winner
when the time budget runs out.

[`cluster`] and [`cluster_parallel`] are the public entry points: the former
runs a single island, the latter one island per thread connected through the
channel transport.
*/

use crate::clustering::louvain::perform_clustering;
use crate::clustering::modularity::modularity;
use crate::core::config::ClusteringConfig;
use crate::core::error::{EvoclusError, Result};
use crate::core::graph::{Clustering, CsrGraph};
use crate::core::random::island_rng;
use crate::core::timer::Stopwatch;
use crate::evolution::combine::{
    combine_basic_flat, combine_improved_flat, combine_improved_flat_with_partitioning,
    combine_improved_flat_with_sclp, combine_improved_multilevel,
};
use crate::evolution::exchange::Exchanger;
use crate::evolution::individual::Individual;
use crate::evolution::mutation::mutate;
use crate::evolution::partitioning::{KwayPartitioner, RegionGrowingPartitioner};
use crate::evolution::population::Population;
use crate::transport::{ChannelTransport, MessageTransport, SingleProcess};
use rand::prelude::*;
use rand::rngs::StdRng;
use tracing::{debug, info};

const ROOT: usize = 0;

/// Result of a clustering run.
#[derive(Debug, Clone)]
pub struct ClusteringOutcome {
    /// Modularity of the returned clustering.
    pub modularity: f64,
    /// Number of clusters.
    pub num_clusters: usize,
    /// Canonical cluster id per node.
    pub clustering: Clustering,
}

/// Creates one Louvain individual with randomized settings.
///
/// The cluster bound for the constrained pre-coarsening is drawn from
/// `[n/10, n]`, and the number of label propagation levels follows the skewed
/// draw `{0..=7} -> 0, 8 -> 1, 9 -> 2, 10 -> 3`.
pub fn create_individual(
    config: &ClusteringConfig,
    graph: &mut CsrGraph,
    rng: &mut StdRng,
) -> Individual {
    let n = graph.number_of_nodes();
    let mut copy = config.clone();
    copy.lm_cluster_coarsening_factor = 1;
    copy.cluster_upperbound = rng.random_range((n / 10).max(1)..=n.max(1)) as i64;
    copy.lm_number_of_label_propagation_levels = match rng.random_range(0..=10) {
        0..=7 => 0,
        8 => 1,
        9 => 2,
        _ => 3,
    };

    perform_clustering(&copy, graph, true, rng);
    Individual::from_graph(graph)
}

/// One island of the asynchronous evolutionary search.
pub struct EvolutionaryClustering<T: MessageTransport> {
    transport: T,
    partitioner: Box<dyn KwayPartitioner>,
    time_limit: f64,
    rounds: usize,
}

impl<T: MessageTransport> EvolutionaryClustering<T> {
    /// Creates an island with the default region-growing partitioner.
    pub fn new(transport: T) -> Self {
        Self::with_partitioner(transport, Box::new(RegionGrowingPartitioner))
    }

    /// Creates an island with a custom balanced k-way partitioner.
    pub fn with_partitioner(transport: T, partitioner: Box<dyn KwayPartitioner>) -> Self {
        EvolutionaryClustering {
            transport,
            partitioner,
            time_limit: 0.0,
            rounds: 0,
        }
    }

    /// Runs the island until the time budget is exhausted and leaves the
    /// globally best clustering on the graph.
    ///
    /// # Returns
    /// The objective of the globally best individual.
    pub fn perform_clustering(&mut self, config: &ClusteringConfig, graph: &mut CsrGraph) -> f64 {
        let size = self.transport.size();
        let rank = self.transport.rank();
        let mut rng = island_rng(config.seed, size, rank);
        self.time_limit = config.time_limit;

        let mut population = Population::new(config.mh_pool_size);
        let mut working = config.clone();
        let stopwatch = Stopwatch::start();
        self.initialize(&mut working, graph, &mut population, &mut rng);

        let mut exchanger = Exchanger::new();
        loop {
            self.perform_local_round(&working, graph, &mut population, &stopwatch, &mut rng);

            if stopwatch.elapsed() <= self.time_limit && size > 1 {
                let messages = (size as f64).ln().ceil() as usize;
                for _ in 0..messages {
                    exchanger.push_best(&mut self.transport, &population);
                    exchanger.recv_incoming(&mut self.transport, graph, &mut population);
                }
            }

            self.rounds += 1;
            if stopwatch.elapsed() > self.time_limit {
                break;
            }
        }
        debug!(rank, rounds = self.rounds, "island finished");

        self.collect_best(graph, &population)
    }

    /// Seeds the population and agrees on the pool size.
    ///
    /// Rank 0 estimates how many individuals fit into the seeding budget from
    /// the wall time of the first Louvain call and broadcasts the result.
    fn initialize(
        &mut self,
        working: &mut ClusteringConfig,
        graph: &mut CsrGraph,
        population: &mut Population,
        rng: &mut StdRng,
    ) {
        let creation = Stopwatch::start();
        let first = create_individual(working, graph, rng);
        let time_spent = creation.elapsed().max(1e-9);
        debug!(objective = first.objective, "created initial individual");
        population.insert(first);

        let mut pool_size_buf = vec![0u32];
        if self.transport.rank() == ROOT {
            let seeding_budget = self.time_limit / working.mh_initial_population_fraction;
            pool_size_buf[0] = (seeding_budget / time_spent)
                .ceil()
                .clamp(0.0, u32::MAX as f64) as u32;
        }
        self.transport.broadcast(ROOT, &mut pool_size_buf);

        let pool_size = (pool_size_buf[0] as usize)
            .max(10)
            .min(working.mh_pool_size.max(1));
        population.set_pool_size(pool_size);
        working.mh_pool_size = pool_size;
        debug!(pool_size, "population size set");
    }

    /// One round of local evolution.
    fn perform_local_round(
        &self,
        working: &ClusteringConfig,
        graph: &mut CsrGraph,
        population: &mut Population,
        stopwatch: &Stopwatch,
        rng: &mut StdRng,
    ) {
        for _ in 0..working.local_partitioning_repetitions.max(1) {
            if !population.is_full() {
                let individual = create_individual(working, graph, rng);
                population.insert(individual);
            } else {
                let (first, second) = population.tournament_pair(rng);
                let decision = rng.random_range(0..=86);
                let child = match decision {
                    0..=20 => combine_basic_flat(working, graph, first, second, rng),
                    21..=40 => combine_improved_flat(working, graph, first, second, rng),
                    41..=60 => combine_improved_flat_with_sclp(working, graph, first, rng),
                    61..=80 => combine_improved_multilevel(graph, first, second, rng),
                    81..=83 => combine_improved_flat_with_partitioning(
                        working,
                        graph,
                        first,
                        self.partitioner.as_ref(),
                        rng,
                    ),
                    _ => mutate(
                        working,
                        graph,
                        first,
                        second,
                        self.partitioner.as_ref(),
                        rng,
                    ),
                };
                population.insert(child);
            }

            if stopwatch.elapsed() > self.time_limit {
                break;
            }
        }

        population.apply_fittest(graph);
    }

    /// Elects the globally best clustering and applies it to the graph.
    fn collect_best(&mut self, graph: &mut CsrGraph, population: &Population) -> f64 {
        let local_best = population.apply_fittest(graph);
        let global_best = self.transport.all_reduce_max(local_best);

        let candidate = if local_best == global_best {
            self.transport.rank() as u64
        } else {
            u64::MAX
        };
        let broadcaster = self.transport.all_reduce_min(candidate) as usize;

        let mut buffer: Vec<u32> = (0..graph.number_of_nodes())
            .map(|node| graph.partition_index(node) as u32)
            .collect();
        self.transport.broadcast(broadcaster, &mut buffer);
        for (node, &cluster) in buffer.iter().enumerate() {
            graph.set_partition_index(node, cluster as usize);
        }
        graph.set_partition_count(graph.partition_count_compute());

        info!(global_best, "collected best clustering");
        global_best
    }
}

/// Clusters the graph with a single island.
///
/// The graph keeps the best clustering found; the outcome carries its
/// modularity, cluster count, and canonical cluster ids. An empty graph yields
/// the trivial empty clustering.
pub fn cluster(graph: &mut CsrGraph, config: &ClusteringConfig) -> Result<ClusteringOutcome> {
    if graph.number_of_nodes() == 0 {
        return Ok(ClusteringOutcome {
            modularity: 0.0,
            num_clusters: 0,
            clustering: Vec::new(),
        });
    }

    let mut island = EvolutionaryClustering::new(SingleProcess);
    island.perform_clustering(config, graph);

    Ok(outcome_from_graph(graph))
}

/// Clusters the graph with `islands` islands running on threads of this
/// process, connected through the channel transport.
pub fn cluster_parallel(
    graph: &CsrGraph,
    config: &ClusteringConfig,
    islands: usize,
) -> Result<ClusteringOutcome> {
    if islands == 0 {
        return Err(EvoclusError::invalid_argument(
            "at least one island is required",
        ));
    }
    if graph.number_of_nodes() == 0 {
        return Ok(ClusteringOutcome {
            modularity: 0.0,
            num_clusters: 0,
            clustering: Vec::new(),
        });
    }
    if islands == 1 {
        let mut local = graph.clone();
        return cluster(&mut local, config);
    }

    let transports = ChannelTransport::create_group(islands);
    let mut results = crossbeam::thread::scope(|scope| {
        let handles: Vec<_> = transports
            .into_iter()
            .map(|transport| {
                let mut local = graph.clone();
                let island_config = config.clone();
                scope.spawn(move |_| {
                    let mut island = EvolutionaryClustering::new(transport);
                    island.perform_clustering(&island_config, &mut local);
                    local
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("island thread panicked"))
            .collect::<Vec<CsrGraph>>()
    })
    .expect("island scope failed");

    // all islands agreed on the winner, rank 0's graph carries it
    let winner = results.swap_remove(0);
    Ok(outcome_from_graph(&winner))
}

fn outcome_from_graph(graph: &CsrGraph) -> ClusteringOutcome {
    let clustering = graph.extract_canonical_partition();
    let num_clusters = clustering.iter().max().map_or(0, |&c| c + 1);
    ClusteringOutcome {
        modularity: modularity(graph),
        num_clusters,
        clustering,
    }
}

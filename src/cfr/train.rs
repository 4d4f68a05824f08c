//! Training driver: runs traversals, advances iterations, tracks progress.
//!
//! A [`Trainer`] owns the root of the game, a [`PolicyTable`] and the engine
//! selected by its [`SolverConfig`]. Each iteration performs `batch_size`
//! runs against the same strategies and then calls
//! [`StrategyProfile::update`].

use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::cfr::config::{SolverConfig, TrainingStats};
use crate::cfr::error::Result;
use crate::cfr::game::GameTreeNode;
use crate::cfr::policy::StrategyProfile;
use crate::cfr::pool::SharedPool;
use crate::cfr::sampler::SamplerConfig;
use crate::cfr::solver::Solver;
use crate::cfr::storage::PolicyTable;

/// Engine type driven by a [`Trainer`].
pub type TrainerSolver = Solver<PolicyTable, SamplerConfig, SharedPool>;

/// Drives a CFR variant on one game.
///
/// # Example
/// ```
/// use cfr_solver::cfr::{SolverConfig, Trainer};
/// use cfr_solver::games::kuhn::KuhnNode;
///
/// let mut trainer = Trainer::new(KuhnNode::new(), SolverConfig::vanilla().with_seed(42)).unwrap();
/// let stats = trainer.train(100);
/// assert_eq!(stats.iterations, 100);
///
/// // Player 0 holding the King at the first decision
/// let strategy = trainer.average_strategy(0, b"2:", 2);
/// assert!((strategy.iter().sum::<f32>() - 1.0).abs() < 1e-5);
/// ```
pub struct Trainer<N: GameTreeNode> {
    /// Root of the game tree, cloned for every run.
    root: N,

    /// Configuration for the trainer.
    config: SolverConfig,

    /// Engine and the profile it updates.
    solver: TrainerSolver,

    /// Random number generator for sequential runs.
    rng: StdRng,

    /// Base seed, also used to derive per-run seeds in parallel batches.
    seed: u64,

    /// Statistics tracking.
    stats: TrainingStats,
}

impl<N: GameTreeNode> Trainer<N> {
    /// Create a trainer for the game rooted at `root`.
    ///
    /// # Arguments
    /// * `root` - Root node of the game
    /// * `config` - Configuration, validated here
    pub fn new(root: N, config: SolverConfig) -> Result<Self> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(rand::random);
        let profile = Arc::new(PolicyTable::new(2, config.discount));
        let solver = Solver::new(
            profile,
            config.variant.sampler(),
            SharedPool::new(),
            config.variant.traversal(),
        );

        Ok(Self {
            root,
            config,
            solver,
            rng: StdRng::seed_from_u64(seed),
            seed,
            stats: TrainingStats::new(),
        })
    }

    /// Run one iteration: `batch_size` runs, then an update.
    ///
    /// # Returns
    /// The mean root value of the batch, for player 0 when the root is a
    /// chance node.
    pub fn run_iteration(&mut self) -> f64 {
        let batch = self.config.batch_size;
        let mut total = 0.0;
        for _ in 0..batch {
            let mut root = self.root.clone();
            total += self.solver.run(&mut root, &mut self.rng) as f64;
        }
        self.finish_iteration(total, batch)
    }

    /// One iteration whose runs are spread over the current rayon pool.
    fn run_iteration_parallel(&mut self) -> f64 {
        let batch = self.config.batch_size;
        let iteration = self.solver.profile().iter();
        let seed = self.seed;
        let solver = &self.solver;
        let root = &self.root;

        let total: f64 = (0..batch)
            .into_par_iter()
            .map(|run| {
                let mut rng = StdRng::seed_from_u64(run_seed(seed, iteration, run as u64));
                let mut node = root.clone();
                solver.run(&mut node, &mut rng) as f64
            })
            .sum();

        self.finish_iteration(total, batch)
    }

    fn finish_iteration(&mut self, total: f64, batch: usize) -> f64 {
        self.solver.profile().update();
        self.stats.iterations += 1;
        self.stats.record_values(total, batch as u64);

        let interval = self.config.progress_interval;
        if interval > 0 && self.stats.iterations % interval == 0 {
            info!(
                "iteration {}: {} info sets, {:.0} it/s, mean root value {:.5}",
                self.stats.iterations,
                self.num_info_sets(),
                self.stats.iterations_per_second,
                self.stats.mean_root_value
            );
        }

        total / batch as f64
    }

    /// Train for a specified number of iterations.
    ///
    /// # Arguments
    /// * `iterations` - Number of iterations to run
    ///
    /// # Returns
    /// Statistics accumulated so far.
    pub fn train(&mut self, iterations: u64) -> &TrainingStats {
        let start = Instant::now();
        let before = self.stats.elapsed_seconds;

        for _ in 0..iterations {
            self.run_iteration();
        }

        self.refresh_stats(before, start);
        &self.stats
    }

    /// Train with a callback for progress tracking.
    ///
    /// # Arguments
    /// * `iterations` - Number of iterations to run
    /// * `callback_interval` - How often to call the callback
    /// * `callback` - Function called every `callback_interval` iterations
    pub fn train_with_callback<F>(
        &mut self,
        iterations: u64,
        callback_interval: u64,
        mut callback: F,
    ) -> &TrainingStats
    where
        F: FnMut(&TrainingStats),
    {
        let start = Instant::now();
        let before = self.stats.elapsed_seconds;
        let interval = callback_interval.max(1);

        for i in 0..iterations {
            self.run_iteration();

            if (i + 1) % interval == 0 {
                self.refresh_stats(before, start);
                callback(&self.stats);
            }
        }

        self.refresh_stats(before, start);
        &self.stats
    }

    /// Train with each iteration's batch spread over worker threads.
    ///
    /// Runs of one batch share the same strategies and only differ by their
    /// random draws, each seeded from the base seed, the iteration and the
    /// run index. Variants with simultaneous updates run their batches
    /// sequentially.
    pub fn train_parallel(&mut self, iterations: u64) -> Result<&TrainingStats> {
        let start = Instant::now();
        let before = self.stats.elapsed_seconds;

        if !self.config.variant.is_alternating() {
            debug!("{:?} updates both players per run, training sequentially", self.config.variant);
            for _ in 0..iterations {
                self.run_iteration();
            }
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.num_threads.unwrap_or(0))
                .build()?;
            debug!(
                "training {} iterations of {} runs on {} threads",
                iterations,
                self.config.batch_size,
                pool.current_num_threads()
            );

            pool.install(|| {
                for _ in 0..iterations {
                    self.run_iteration_parallel();
                }
            });
        }

        self.refresh_stats(before, start);
        Ok(&self.stats)
    }

    fn refresh_stats(&mut self, before: f64, start: Instant) {
        self.stats.info_sets = self.num_info_sets();
        self.stats.elapsed_seconds = before + start.elapsed().as_secs_f64();
        self.stats.update_rate();
    }

    /// Average strategy of `player` at `key`, uniform if never visited.
    ///
    /// This returns the time-averaged strategy which converges to Nash equilibrium.
    pub fn average_strategy(&self, player: usize, key: &[u8], num_actions: usize) -> Vec<f32> {
        self.profile().average_strategy_for(player, key, num_actions)
    }

    /// Current (regret-matched) strategy of `player` at `key`.
    pub fn current_strategy(&self, player: usize, key: &[u8], num_actions: usize) -> Vec<f32> {
        self.profile().current_strategy_for(player, key, num_actions)
    }

    /// Write a snapshot of the policy table.
    pub fn save<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.profile().save(writer)
    }

    /// Replace the policy table with a snapshot.
    pub fn load<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        self.profile().load(reader)?;
        self.stats.info_sets = self.num_info_sets();
        Ok(())
    }

    /// Get the current iteration of the policy table.
    pub fn iteration(&self) -> u64 {
        self.profile().iter()
    }

    /// Get the number of information sets discovered.
    pub fn num_info_sets(&self) -> usize {
        self.profile().num_records()
    }

    /// Get reference to the policy table for analysis.
    pub fn profile(&self) -> &PolicyTable {
        self.solver.profile()
    }

    /// Get reference to the engine.
    pub fn solver(&self) -> &TrainerSolver {
        &self.solver
    }

    /// Get current statistics.
    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Get reference to the root node.
    pub fn root(&self) -> &N {
        &self.root
    }
}

/// Seed of one run in a parallel batch.
fn run_seed(seed: u64, iteration: u64, run: u64) -> u64 {
    seed ^ iteration.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ run.wrapping_mul(0xBF58_476D_1CE4_E5B9)
}

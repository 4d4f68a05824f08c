//! CFR (Counterfactual Regret Minimization) solver module.
//!
//! This module provides one traversal engine for the CFR family of
//! regret-minimization algorithms on two-player zero-sum extensive-form
//! games.
//!
//! # Overview
//!
//! A game is described by a [`GameTreeNode`]: a node knows its type, its
//! children and, at decision points, the information set of the acting
//! player. The [`Solver`] walks the tree from the root and writes regrets and
//! strategy weights into a [`StrategyProfile`], by default a sharded
//! [`PolicyTable`] keyed on information set bytes. Strategies only change
//! when the profile is updated, so several runs per iteration (and parallel
//! runs for the alternating variants) read the same strategies.
//!
//! # Supported Variants
//!
//! - **Vanilla CFR**: full traversal, both players updated every run
//! - **Chance-sampled CFR**: one chance outcome per chance node
//! - **External sampling**: traverser enumerates, opponent and chance sampled
//! - **Outcome sampling**: one action for the traverser with exploration
//! - **Average strategy sampling**: traverser actions kept by average strategy
//! - **Probing and baselines**: lower variance estimates for unsampled actions
//! - **CFR+, Linear and Discounted CFR**: update rules in [`DiscountParams`]
//!
//! # Example
//!
//! ```
//! use cfr_solver::cfr::{SolverConfig, Trainer};
//! use cfr_solver::games::kuhn::KuhnNode;
//!
//! let mut trainer = Trainer::new(KuhnNode::new(), SolverConfig::cfr_plus().with_seed(7)).unwrap();
//! let stats = trainer.train(1_000);
//! println!("Trained {} info sets in {:.2}s", stats.info_sets, stats.elapsed_seconds);
//!
//! // Player 1 holding the Jack, facing a bet
//! let strategy = trainer.average_strategy(1, b"0:b", 2);
//! assert!(strategy[0] > 0.9);
//! ```
//!
//! # Theory
//!
//! **Regret**: The difference between the value of an action and the value of the current strategy.
//! ```text
//! Regret(a) = Value(a) - Value(current_strategy)
//! ```
//!
//! **Regret Matching**: Set strategy proportional to positive regrets.
//! ```text
//! Strategy(a) = max(0, Regret(a)) / sum(max(0, Regret(a')))
//! ```
//!
//! Sampled variants weight each update by the inverse probability of having
//! reached the node, which keeps the expected update equal to the vanilla
//! one.
//!
//! # References
//!
//! - Zinkevich, M., et al. "Regret Minimization in Games with Incomplete Information" (2007)
//! - Lanctot, M., et al. "Monte Carlo Sampling for Regret Minimization in Extensive Games" (2009)
//! - Gibson, R., et al. "Generalized Sampling and Variance in Counterfactual Regret Minimization" (2012)
//! - Tammelin, O. "Solving Large Imperfect Information Games Using CFR+" (2014)
//! - Schmid, M., et al. "Variance Reduction in Monte Carlo Counterfactual Regret Minimization" (2019)
//! - Brown, N., Sandholm, T. "Solving Imperfect-Information Games via Discounted Regret Minimization" (2019)

pub mod config;
pub mod discount;
pub mod error;
pub mod game;
pub mod policy;
pub mod pool;
pub mod sampler;
pub mod solver;
pub mod storage;
pub mod train;
pub mod tree;

// Re-export main types for convenient access
pub use config::{ConfigError, SolverConfig, TrainingStats, Variant};
pub use discount::DiscountParams;
pub use error::{CfrError, Result};
pub use game::{GameTreeNode, InfoSet, NodeType};
pub use policy::{NodePolicy, Record, StrategyProfile};
pub use pool::{LocalPool, Pool, PoolStats, SharedPool};
pub use sampler::{
    AverageStrategySampler, ExternalSampler, MultiOutcomeSampler, OutcomeSampler, RobustSampler, Sampler,
    SamplerConfig,
};
pub use solver::{ChanceMode, Solver, Traversal, UpdateMode};
pub use storage::PolicyTable;
pub use train::Trainer;

//! # CFR Solver
//!
//! A generic Counterfactual Regret Minimization (CFR) engine for computing
//! Nash equilibrium strategies in two-player zero-sum extensive-form games.
//!
//! ## Features
//!
//! - **One Traversal Core**: Vanilla, chance-sampled and Monte Carlo CFR share one engine
//! - **Pluggable Samplers**: External, outcome, average-strategy and robust sampling
//! - **Variance Reduction**: Probing and per-action baselines
//! - **Thread-Safe Storage**: A sharded policy table shared by parallel traversals
//! - **Checkpointing**: Save and resume the policy table as a binary snapshot
//!
//! ## Quick Start
//!
//! ```
//! use cfr_solver::cfr::{SolverConfig, Trainer};
//! use cfr_solver::games::kuhn::KuhnNode;
//!
//! // 1. Implement GameTreeNode for your game (Kuhn poker ships with the crate)
//! // 2. Create a trainer
//! let mut trainer = Trainer::new(KuhnNode::new(), SolverConfig::default().with_seed(3)).unwrap();
//!
//! // 3. Train
//! trainer.train(1_000);
//!
//! // 4. Get strategies
//! let strategy = trainer.average_strategy(0, b"1:", 2);
//! assert_eq!(strategy.len(), 2);
//! ```
//!
//! ## Modules
//!
//! - [`cfr`]: Core CFR algorithm, samplers, storage and training
//! - [`games`]: Example game implementations (Kuhn Poker)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Trainer                                  │
//! │  - Batches of runs        - Progress and snapshots              │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Solver                                   │
//! │  - Chance / player nodes  - Sampler for the traverser           │
//! │  - Regret estimators      - Scratch pool                        │
//! └─────────────────────────────────────────────────────────────────┘
//!                │                                  │
//!                │ walks GameTreeNode               │ updates StrategyProfile
//!                ▼                                  ▼
//!         ┌─────────────┐                  ┌─────────────────┐
//!         │ Kuhn Poker  │                  │  PolicyTable    │
//!         └─────────────┘                  └─────────────────┘
//! ```

#![warn(missing_docs)]

/// CFR (Counterfactual Regret Minimization) solver module.
///
/// This is the core module containing the generic CFR engine.
pub mod cfr;

/// Game implementations module.
///
/// Contains example games like Kuhn Poker for testing and validation.
pub mod games;

// Re-export commonly used types at crate root for convenience
pub use cfr::{CfrError, GameTreeNode, PolicyTable, Solver, SolverConfig, Trainer, TrainingStats};

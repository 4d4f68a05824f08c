//! Game implementations for the CFR solver.
//!
//! Games with known equilibria verify the engine end to end and show how to
//! implement [`GameTreeNode`](crate::cfr::GameTreeNode) for a new game.
//!
//! ## Available Games
//!
//! - [`kuhn`]: Kuhn Poker - A simplified 3-card poker game with known Nash equilibrium

pub mod kuhn;

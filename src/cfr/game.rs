//! Game tree node contract consumed by every traversal engine.
//!
//! Any game that implements [`GameTreeNode`] can be solved. The engines never
//! mutate game state; they only walk the tree, read chance probabilities,
//! information sets and terminal utilities, and call [`GameTreeNode::close`]
//! once they are done with a node.

use std::fmt::Debug;

use rand::Rng;

/// Kind of a node in the game tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// Nature moves: children are drawn with fixed probabilities.
    Chance,
    /// Game over: [`GameTreeNode::utility`] is defined.
    Terminal,
    /// A player decides: [`GameTreeNode::player`] is defined.
    Player,
}

/// The information partition visible to the acting player.
///
/// Two histories the player cannot tell apart must produce the same key.
/// The key is the sole identity of a regret/strategy record.
pub trait InfoSet {
    /// Opaque, stable byte string identifying this information set.
    fn key(&self) -> &[u8];
}

impl InfoSet for Vec<u8> {
    fn key(&self) -> &[u8] {
        self
    }
}

impl InfoSet for Box<[u8]> {
    fn key(&self) -> &[u8] {
        self
    }
}

impl InfoSet for String {
    fn key(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// A node of a two-player zero-sum extensive-form game.
///
/// Children are produced by value so that games can expand lazily and
/// release memory as the traversal moves on.
///
/// # Example
/// ```ignore
/// #[derive(Clone)]
/// struct MyNode { /* ... */ }
///
/// impl GameTreeNode for MyNode {
///     type Info = String;
///     // ... implement required methods
/// }
/// ```
pub trait GameTreeNode: Clone + Debug + Send + Sync {
    /// The information set type returned by [`GameTreeNode::info_set`].
    type Info: InfoSet;

    /// Whether this node is a chance, terminal or player node.
    fn node_type(&self) -> NodeType;

    /// The acting player (0 or 1). Only meaningful for player nodes.
    fn player(&self) -> usize;

    /// Number of children (legal actions or chance outcomes).
    fn num_children(&self) -> usize;

    /// Build the `i`-th child.
    fn child(&self, i: usize) -> Self;

    /// Probability of the `i`-th child. Only meaningful for chance nodes;
    /// the probabilities must sum to 1 within `1e-3`.
    fn child_probability(&self, i: usize) -> f64;

    /// Draw one child according to the chance probabilities.
    ///
    /// # Returns
    /// The child together with the probability it was drawn with.
    fn sample_child<R: Rng + ?Sized>(&self, rng: &mut R) -> (Self, f64) {
        let r: f64 = rng.gen();
        let n = self.num_children();
        let mut cumulative = 0.0;
        for i in 0..n {
            let p = self.child_probability(i);
            cumulative += p;
            if r < cumulative {
                return (self.child(i), p);
            }
        }

        // Floating point slack: fall back to the last outcome
        (self.child(n - 1), self.child_probability(n - 1))
    }

    /// The information set of `player` at this node.
    fn info_set(&self, player: usize) -> Self::Info;

    /// Terminal payoff from the perspective of `player`.
    fn utility(&self, player: usize) -> f64;

    /// Release anything the node allocated eagerly (cached children etc).
    ///
    /// Called exactly once by an engine after it finishes with the node.
    /// The node stays usable and may re-expand lazily afterwards.
    fn close(&mut self) {}
}

//! Kuhn Poker as a game tree for CFR validation.
//!
//! Kuhn Poker is a simplified poker game used to validate CFR implementations
//! because it has a known, mathematically proven Nash equilibrium.
//!
//! ## Game Rules
//!
//! - 3 cards: Jack (0), Queen (1), King (2)
//! - 2 players, each antes 1 chip
//! - Each player receives 1 card
//! - Player 0 acts first: Pass or Bet (1 chip)
//! - Player 1 responds based on player 0's action
//! - Higher card wins at showdown
//!
//! ## Game Tree
//!
//! ```text
//! Chance: deal player 0 (3 outcomes)
//! └── Chance: deal player 1 (2 outcomes)
//!     └── P0
//!         ├── Pass
//!         │   └── P1
//!         │       ├── Pass → Showdown (pot = 2)
//!         │       └── Bet
//!         │           └── P0
//!         │               ├── Pass → P1 wins (pot = 3)
//!         │               └── Bet → Showdown (pot = 4)
//!         └── Bet
//!             └── P1
//!                 ├── Pass → P0 wins (pot = 3)
//!                 └── Bet → Showdown (pot = 4)
//! ```
//!
//! The tree has 58 nodes, 30 of them terminal, and 12 information sets.
//!
//! ## Known Nash Equilibrium
//!
//! - **Player 0 with Jack**: Bet with probability α ∈ [0, 1/3]
//! - **Player 0 with Queen**: Always Pass, call a bet with probability α + 1/3
//! - **Player 0 with King**: Bet with probability 3α
//! - **Player 1 facing Bet with Jack**: Always Fold
//! - **Player 1 facing Bet with Queen**: Call with probability 1/3
//! - **Player 1 facing Bet with King**: Always Call
//! - **Player 1 after Pass with Jack**: Bet with probability 1/3
//!
//! **Expected Value**: Player 0 EV = -1/18 ≈ -0.0556

use std::fmt;

use crate::cfr::game::{GameTreeNode, NodeType};

/// Actions in Kuhn Poker, in child order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KuhnAction {
    /// Pass (check if no bet, fold if facing bet)
    Pass,
    /// Bet (or call if facing bet)
    Bet,
}

impl KuhnAction {
    /// Both actions, indexed like the children of a decision node.
    pub const ALL: [KuhnAction; 2] = [KuhnAction::Pass, KuhnAction::Bet];

    /// History character of this action.
    pub fn symbol(self) -> char {
        match self {
            KuhnAction::Pass => 'p',
            KuhnAction::Bet => 'b',
        }
    }
}

impl fmt::Display for KuhnAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KuhnAction::Pass => write!(f, "Pass"),
            KuhnAction::Bet => write!(f, "Bet"),
        }
    }
}

/// A node of the Kuhn Poker tree, from the deal to the showdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KuhnNode {
    /// Cards of player 0 and player 1 (0=Jack, 1=Queen, 2=King).
    cards: [u8; 2],
    /// Number of cards dealt so far.
    dealt: usize,
    /// Action history, e.g. "pb" = pass then bet.
    history: String,
}

impl Default for KuhnNode {
    fn default() -> Self {
        Self::new()
    }
}

impl KuhnNode {
    /// The root: nothing dealt yet.
    pub fn new() -> Self {
        Self {
            cards: [0, 0],
            dealt: 0,
            history: String::new(),
        }
    }

    /// A decision or terminal node with both cards dealt.
    ///
    /// # Arguments
    /// * `cards` - Cards of player 0 and player 1
    /// * `history` - Actions so far as `p`/`b` characters
    pub fn dealt(cards: [u8; 2], history: &str) -> Self {
        assert!(cards[0] < 3 && cards[1] < 3 && cards[0] != cards[1], "invalid deal {:?}", cards);
        Self {
            cards,
            dealt: 2,
            history: history.to_string(),
        }
    }

    /// Infoset key of `player` holding `card` after `history`.
    pub fn key(card: u8, history: &str) -> String {
        format!("{}:{}", card, history)
    }

    /// Get card name for display.
    pub fn card_name(card: u8) -> &'static str {
        match card {
            0 => "Jack",
            1 => "Queen",
            2 => "King",
            _ => "Unknown",
        }
    }

    /// Cards dealt so far.
    pub fn cards(&self) -> &[u8] {
        &self.cards[..self.dealt]
    }

    /// Action history.
    pub fn history(&self) -> &str {
        &self.history
    }

    fn is_terminal(&self) -> bool {
        // "pp" showdown, "pbp" fold, "pbb" call, "bp" fold, "bb" call
        matches!(self.history.as_str(), "pp" | "pbp" | "pbb" | "bp" | "bb")
    }

    fn payoff(&self) -> f64 {
        let showdown = if self.cards[0] > self.cards[1] { 1.0 } else { -1.0 };
        match self.history.as_str() {
            "pp" => showdown,
            "bp" => 1.0,
            "pbp" => -1.0,
            "pbb" | "bb" => 2.0 * showdown,
            h => panic!("payoff requested at non-terminal history {:?}", h),
        }
    }
}

impl fmt::Display for KuhnNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cards: Vec<&str> = self.cards().iter().map(|&c| Self::card_name(c)).collect();
        write!(f, "cards:{:?} history:{}", cards, self.history)
    }
}

impl GameTreeNode for KuhnNode {
    type Info = String;

    fn node_type(&self) -> NodeType {
        if self.dealt < 2 {
            NodeType::Chance
        } else if self.is_terminal() {
            NodeType::Terminal
        } else {
            NodeType::Player
        }
    }

    fn player(&self) -> usize {
        self.history.len() % 2
    }

    fn num_children(&self) -> usize {
        match self.node_type() {
            NodeType::Chance => 3 - self.dealt,
            NodeType::Terminal => 0,
            NodeType::Player => KuhnAction::ALL.len(),
        }
    }

    fn child(&self, i: usize) -> Self {
        let mut child = self.clone();
        match self.node_type() {
            NodeType::Chance => {
                let card = (0..3u8)
                    .filter(|c| !self.cards().contains(c))
                    .nth(i)
                    .unwrap_or_else(|| panic!("chance outcome {} out of range", i));
                child.cards[self.dealt] = card;
                child.dealt += 1;
            }
            NodeType::Player => child.history.push(KuhnAction::ALL[i].symbol()),
            NodeType::Terminal => panic!("terminal node {} has no children", self),
        }
        child
    }

    fn child_probability(&self, _i: usize) -> f64 {
        debug_assert!(self.dealt < 2, "child_probability at a decision node");
        1.0 / (3 - self.dealt) as f64
    }

    fn info_set(&self, player: usize) -> String {
        Self::key(self.cards[player], &self.history)
    }

    fn utility(&self, player: usize) -> f64 {
        let payoff = self.payoff();
        if player == 0 {
            payoff
        } else {
            -payoff
        }
    }
}

//! Whole-tree walks for validation and evaluation.
//!
//! These enumerate every node, so they are meant for small games and tests.

use rustc_hash::FxHashSet;

use crate::cfr::game::{GameTreeNode, InfoSet, NodeType};
use crate::cfr::policy::check_strategy;

/// Call `f` on every node, depth first, parents before children.
///
/// Every child built by the walk is closed once its subtree is done.
pub fn visit<N, F>(root: &N, mut f: F)
where
    N: GameTreeNode,
    F: FnMut(&N),
{
    fn go<N: GameTreeNode, F: FnMut(&N)>(node: &N, f: &mut F) {
        f(node);
        if node.node_type() == NodeType::Terminal {
            return;
        }
        for i in 0..node.num_children() {
            let mut child = node.child(i);
            go(&child, f);
            child.close();
        }
    }

    go(root, &mut f);
}

/// Total number of nodes.
pub fn count_nodes<N: GameTreeNode>(root: &N) -> usize {
    let mut count = 0;
    visit(root, |_| count += 1);
    count
}

/// Number of terminal nodes.
pub fn count_terminal_nodes<N: GameTreeNode>(root: &N) -> usize {
    let mut count = 0;
    visit(root, |node| {
        if node.node_type() == NodeType::Terminal {
            count += 1;
        }
    });
    count
}

/// Number of distinct `(player, infoset)` pairs over all decision nodes.
pub fn count_info_sets<N: GameTreeNode>(root: &N) -> usize {
    let mut seen = FxHashSet::default();
    visit(root, |node| {
        if node.node_type() == NodeType::Player {
            let player = node.player();
            seen.insert((player, node.info_set(player).key().to_vec()));
        }
    });
    seen.len()
}

/// Exact value of the game for player 0 when both players follow
/// `strategy`.
///
/// # Arguments
/// * `root` - Root of the tree
/// * `strategy` - Distribution over the children of a decision node
pub fn expected_value<N, F>(root: &N, strategy: F) -> f64
where
    N: GameTreeNode,
    F: Fn(&N) -> Vec<f32>,
{
    fn go<N: GameTreeNode, F: Fn(&N) -> Vec<f32>>(node: &N, strategy: &F) -> f64 {
        match node.node_type() {
            NodeType::Terminal => node.utility(0),
            NodeType::Chance => (0..node.num_children())
                .map(|i| node.child_probability(i) * child_value(node, i, strategy))
                .sum(),
            NodeType::Player => {
                let probs = strategy(node);
                assert_eq!(probs.len(), node.num_children());
                check_strategy(&probs);
                probs
                    .iter()
                    .enumerate()
                    .filter(|&(_, &p)| p > 0.0)
                    .map(|(i, &p)| p as f64 * child_value(node, i, strategy))
                    .sum()
            }
        }
    }

    fn child_value<N: GameTreeNode, F: Fn(&N) -> Vec<f32>>(node: &N, i: usize, strategy: &F) -> f64 {
        let mut child = node.child(i);
        let value = go(&child, strategy);
        child.close();
        value
    }

    go(root, &strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::kuhn::KuhnNode;
    use approx::assert_abs_diff_eq;

    fn uniform(node: &KuhnNode) -> Vec<f32> {
        vec![0.5; node.num_children()]
    }

    #[test]
    fn test_visit_order() {
        let mut types = Vec::new();
        visit(&KuhnNode::new(), |node| types.push(node.node_type()));
        assert_eq!(types.len(), 58);
        assert_eq!(types[0], NodeType::Chance);
        assert_eq!(types[1], NodeType::Chance);
        assert_eq!(types[2], NodeType::Player);
    }

    #[test]
    fn test_expected_value_always_bet() {
        // Both always bet/call: every deal is a 2-chip showdown
        let value = expected_value(&KuhnNode::new(), |node: &KuhnNode| {
            let mut probs = vec![0.0; node.num_children()];
            probs[1] = 1.0;
            probs
        });
        assert_abs_diff_eq!(value, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_expected_value_always_pass() {
        // Check-check showdowns are worth 1 chip and symmetric
        let value = expected_value(&KuhnNode::new(), |node: &KuhnNode| {
            let mut probs = vec![0.0; node.num_children()];
            probs[0] = 1.0;
            probs
        });
        assert_abs_diff_eq!(value, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_expected_value_uniform() {
        let value = expected_value(&KuhnNode::new(), uniform);
        assert_abs_diff_eq!(value, 0.125, epsilon = 1e-12);
    }
}

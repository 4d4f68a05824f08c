//! The traversal engine shared by every CFR variant.
//!
//! All variants walk the tree with the same terminal/chance/player dispatch.
//! They differ along a few independent axes, captured by [`Traversal`]:
//!
//! - **Chance**: enumerate every outcome weighted by its probability, or draw
//!   one outcome per visit.
//! - **Updates**: *simultaneous* (both players enumerate and update on every
//!   run, as in vanilla and chance-sampled CFR) or *alternating* (one
//!   traversing player per run, chosen by iteration parity, while the other
//!   player is sampled on-policy).
//! - **Sampler**: which of the traversing player's actions are recursed into
//!   and with what probability (see [`crate::cfr::sampler`]).
//! - **Probing** and **baselines**: how unsampled actions are estimated.
//!
//! | Variant | Chance | Updates | Sampler |
//! |---|---|---|---|
//! | Vanilla | enumerate | simultaneous | - |
//! | Chance sampling | sample | simultaneous | - |
//! | External sampling | sample | alternating | [`ExternalSampler`] |
//! | Outcome sampling | sample | alternating | [`OutcomeSampler`] |
//! | Average-strategy sampling | sample | alternating | [`AverageStrategySampler`] |
//! | MCCFR | sample | alternating | any, optional probing |
//! | Variance-reduced MCCFR | sample | alternating | any, with baseline |
//!
//! Values flow back up the recursion from the perspective of the player who
//! acted last and are negated whenever the acting player changes.
//!
//! # Estimators
//!
//! A run returns an unbiased estimate of the value of the root under the
//! current strategy profile. At the traversing player's nodes an action
//! sampled with probability `q` contributes `v / q`; with a baseline `b` it
//! contributes `b + (v - b) / q` and an unsampled one `b`; with probing an
//! unsampled action contributes a single on-policy rollout and a sampled one
//! `v`. Regrets are weighted by `1 / s`, where `s` is the product of the
//! traversing player's sampling probabilities along the path, and the
//! opponent's average strategy accumulates `1 / s` at each visit.

use std::sync::Arc;

use rand::Rng;

use crate::cfr::game::{GameTreeNode, InfoSet, NodeType};
use crate::cfr::policy::{check_strategy, NodePolicy, StrategyProfile, STRATEGY_TOLERANCE};
use crate::cfr::pool::{LocalPool, Pool, ScratchMap, SharedPool};
use crate::cfr::sampler::{
    sample_one, AverageStrategySampler, ExternalSampler, OutcomeSampler, Sampler,
};

/// How chance nodes are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanceMode {
    /// Recurse into every outcome, weighted by its probability.
    Enumerate,
    /// Recurse into one outcome drawn from the chance distribution.
    Sample,
}

/// Which players are updated by a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Both players enumerate their actions and update on every run.
    Simultaneous,
    /// The player `iter % 2` enumerates (through the sampler) and updates
    /// regret, the other samples one action per infoset and updates its
    /// average strategy.
    Alternating,
}

/// Configuration of the traversal core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Traversal {
    /// Chance handling.
    pub chance: ChanceMode,
    /// Player handling.
    pub updates: UpdateMode,
    /// Estimate unsampled actions with one on-policy rollout.
    ///
    /// Ignored when a baseline is set.
    pub probe: bool,
    /// Enable the per-action baseline with this moving-average step.
    pub baseline: Option<f32>,
}

impl Traversal {
    /// Full traversal.
    pub fn vanilla() -> Self {
        Self {
            chance: ChanceMode::Enumerate,
            updates: UpdateMode::Simultaneous,
            probe: false,
            baseline: None,
        }
    }

    /// Sampled chance, both players enumerated.
    pub fn chance_sampling() -> Self {
        Self {
            chance: ChanceMode::Sample,
            updates: UpdateMode::Simultaneous,
            probe: false,
            baseline: None,
        }
    }

    /// Sampled chance and opponent, traverser through the sampler.
    pub fn sampled() -> Self {
        Self {
            chance: ChanceMode::Sample,
            updates: UpdateMode::Alternating,
            probe: false,
            baseline: None,
        }
    }

    /// [`Traversal::sampled`] with a baseline control variate.
    pub fn variance_reduced(decay: f32) -> Self {
        Self {
            baseline: Some(decay),
            ..Self::sampled()
        }
    }
}

/// Reach probabilities carried down the recursion.
#[derive(Debug, Clone, Copy)]
struct Reach {
    /// Each player's own contribution.
    players: [f32; 2],
    /// Product of enumerated chance probabilities.
    chance: f32,
    /// Product of the traversing player's sampling probabilities.
    sample: f32,
}

impl Reach {
    fn root() -> Self {
        Self {
            players: [1.0; 2],
            chance: 1.0,
            sample: 1.0,
        }
    }

    fn with_player(mut self, player: usize, probability: f32) -> Self {
        self.players[player] *= probability;
        self
    }

    fn with_chance(mut self, probability: f32) -> Self {
        self.chance *= probability;
        self
    }

    fn with_sample(mut self, probability: f32) -> Self {
        self.sample *= probability;
        self
    }

    /// Reach of everyone but `player`, chance included.
    fn counterfactual(&self, player: usize) -> f32 {
        self.players[1 - player] * self.chance
    }
}

/// State scoped to one run.
struct Walk<'a, R: Rng + ?Sized, B: Pool> {
    rng: &'a mut R,
    /// Action chosen for each sampled infoset during this run.
    memo: ScratchMap<'a, B>,
    traverser: usize,
}

/// One traversal core for the whole CFR family.
///
/// The engine holds no per-run state, so with a [`SharedPool`] a single
/// instance can be driven from many threads at once as long as the variant
/// uses alternating updates.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use cfr_solver::cfr::{PolicyTable, Solver, StrategyProfile};
/// use cfr_solver::games::kuhn::KuhnNode;
/// use rand::SeedableRng;
///
/// let profile = Arc::new(PolicyTable::default());
/// let solver = Solver::external_sampling(Arc::clone(&profile));
/// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
///
/// for _ in 0..100 {
///     solver.run(&mut KuhnNode::new(), &mut rng);
///     profile.update();
/// }
/// assert_eq!(profile.iter(), 101);
/// ```
#[derive(Debug)]
pub struct Solver<P, S = ExternalSampler, B = LocalPool> {
    profile: Arc<P>,
    sampler: S,
    pool: B,
    traversal: Traversal,
}

impl<P: StrategyProfile> Solver<P, ExternalSampler, LocalPool> {
    /// Vanilla CFR: chance and both players fully enumerated.
    pub fn vanilla(profile: Arc<P>) -> Self {
        Self::new(profile, ExternalSampler, LocalPool::new(), Traversal::vanilla())
    }

    /// Chance-sampled CFR.
    pub fn chance_sampling(profile: Arc<P>) -> Self {
        Self::new(profile, ExternalSampler, LocalPool::new(), Traversal::chance_sampling())
    }
}

impl<P: StrategyProfile> Solver<P, ExternalSampler, SharedPool> {
    /// External-sampling MCCFR.
    pub fn external_sampling(profile: Arc<P>) -> Self {
        Self::new(profile, ExternalSampler, SharedPool::new(), Traversal::sampled())
    }
}

impl<P: StrategyProfile> Solver<P, OutcomeSampler, SharedPool> {
    /// Outcome-sampling MCCFR with ε-exploration at the traverser's nodes.
    pub fn outcome_sampling(profile: Arc<P>, exploration: f32) -> Self {
        Self::new(
            profile,
            OutcomeSampler { exploration },
            SharedPool::new(),
            Traversal::sampled(),
        )
    }
}

impl<P: StrategyProfile> Solver<P, AverageStrategySampler, SharedPool> {
    /// Average-strategy sampling.
    pub fn average_strategy_sampling(profile: Arc<P>, sampler: AverageStrategySampler) -> Self {
        Self::new(profile, sampler, SharedPool::new(), Traversal::sampled())
    }
}

impl<P: StrategyProfile, S: Sampler> Solver<P, S, SharedPool> {
    /// Generalized MCCFR with an arbitrary sampler.
    pub fn mccfr(profile: Arc<P>, sampler: S) -> Self {
        Self::new(profile, sampler, SharedPool::new(), Traversal::sampled())
    }

    /// Variance-reduced MCCFR.
    ///
    /// # Arguments
    /// * `sampler` - Sampler for the traversing player
    /// * `decay` - Step size of the baseline moving average
    pub fn variance_reduced(profile: Arc<P>, sampler: S, decay: f32) -> Self {
        Self::new(profile, sampler, SharedPool::new(), Traversal::variance_reduced(decay))
    }
}

impl<P, S, B> Solver<P, S, B>
where
    P: StrategyProfile,
    S: Sampler,
    B: Pool,
{
    /// Assemble an engine from its parts.
    pub fn new(profile: Arc<P>, sampler: S, pool: B, traversal: Traversal) -> Self {
        Self {
            profile,
            sampler,
            pool,
            traversal,
        }
    }

    /// Builder method: enable or disable probing of unsampled actions.
    pub fn with_probing(mut self, probe: bool) -> Self {
        self.traversal.probe = probe;
        self
    }

    /// The strategy profile this engine reads and updates.
    pub fn profile(&self) -> &Arc<P> {
        &self.profile
    }

    /// The sampler for the traversing player.
    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    /// The scratch pool.
    pub fn pool(&self) -> &B {
        &self.pool
    }

    /// The traversal configuration.
    pub fn traversal(&self) -> &Traversal {
        &self.traversal
    }

    /// Traverse the tree once from `root`, updating the profile.
    ///
    /// Strategies do not change until the profile's `update` is called, so
    /// any number of runs between two updates see the same profile.
    ///
    /// # Returns
    /// An estimate of the root value for the player acting at the root
    /// (player 0 if the root is a chance node).
    pub fn run<N, R>(&self, root: &mut N, rng: &mut R) -> f32
    where
        N: GameTreeNode,
        R: Rng + ?Sized,
    {
        let last = match root.node_type() {
            NodeType::Player => root.player(),
            _ => 0,
        };
        let mut walk = Walk {
            rng,
            memo: self.pool.alloc_map(),
            traverser: (self.profile.iter() % 2) as usize,
        };
        self.walk(&mut walk, root, last, Reach::root())
    }

    /// Value of `node` for `last`, closing the node afterwards.
    fn walk<N, R>(&self, walk: &mut Walk<'_, R, B>, node: &mut N, last: usize, reach: Reach) -> f32
    where
        N: GameTreeNode,
        R: Rng + ?Sized,
    {
        let value = match node.node_type() {
            NodeType::Terminal => node.utility(last) as f32,
            NodeType::Chance => self.chance(walk, node, last, reach),
            NodeType::Player => {
                let player = node.player();
                let value = self.player(walk, node, player, reach);
                if player == last {
                    value
                } else {
                    -value
                }
            }
        };
        node.close();
        value
    }

    fn chance<N, R>(&self, walk: &mut Walk<'_, R, B>, node: &N, last: usize, reach: Reach) -> f32
    where
        N: GameTreeNode,
        R: Rng + ?Sized,
    {
        match self.traversal.chance {
            ChanceMode::Enumerate => {
                let mut value = 0.0;
                for i in 0..node.num_children() {
                    let p = node.child_probability(i) as f32;
                    let mut child = node.child(i);
                    value += p * self.walk(walk, &mut child, last, reach.with_chance(p));
                }
                value
            }
            ChanceMode::Sample => {
                let (mut child, _) = node.sample_child(&mut *walk.rng);
                self.walk(walk, &mut child, last, reach)
            }
        }
    }

    /// Value of a decision node for its acting player.
    fn player<N, R>(&self, walk: &mut Walk<'_, R, B>, node: &N, player: usize, reach: Reach) -> f32
    where
        N: GameTreeNode,
        R: Rng + ?Sized,
    {
        let n = node.num_children();
        assert!(n > 0, "player node {:?} has no actions", node);

        // No decision to make
        if n == 1 {
            let mut child = node.child(0);
            return self.walk(walk, &mut child, player, reach);
        }

        match self.traversal.updates {
            UpdateMode::Simultaneous => self.enumerate(walk, node, player, reach),
            UpdateMode::Alternating if player == walk.traverser => {
                self.traverse(walk, node, player, reach)
            }
            UpdateMode::Alternating => self.sample_opponent(walk, node, player, reach),
        }
    }

    /// Vanilla / chance-sampled update for either player.
    fn enumerate<N, R>(&self, walk: &mut Walk<'_, R, B>, node: &N, player: usize, reach: Reach) -> f32
    where
        N: GameTreeNode,
        R: Rng + ?Sized,
    {
        let n = node.num_children();
        let policy = self.profile.get_policy(node);
        let mut strategy = self.pool.alloc(n);
        policy.strategy_into(&mut strategy);
        check_strategy(&strategy);

        let mut values = self.pool.alloc(n);
        for i in 0..n {
            let mut child = node.child(i);
            values[i] = self.walk(walk, &mut child, player, reach.with_player(player, strategy[i]));
        }

        let expected = dot(&strategy, &values);
        values.iter_mut().for_each(|v| *v -= expected);
        policy.add_regret(reach.counterfactual(player), &values);
        policy.add_strategy_weight(reach.players[player]);

        expected
    }

    /// The traversing player's node under alternating updates.
    fn traverse<N, R>(&self, walk: &mut Walk<'_, R, B>, node: &N, player: usize, reach: Reach) -> f32
    where
        N: GameTreeNode,
        R: Rng + ?Sized,
    {
        let n = node.num_children();
        let policy = self.profile.get_policy(node);
        let mut strategy = self.pool.alloc(n);
        policy.strategy_into(&mut strategy);
        check_strategy(&strategy);

        let mut q = self.pool.alloc(n);
        self.sampler.sample(node, &*policy, &strategy, &mut *walk.rng, &mut q);

        let mut baseline = self.pool.alloc(n);
        if self.traversal.baseline.is_some() {
            policy.baseline_into(&mut baseline);
        }

        let mut values = self.pool.alloc(n);
        for i in 0..n {
            let qi = q[i];
            assert!(
                (0.0..=1.0 + STRATEGY_TOLERANCE).contains(&qi),
                "sampling probability {} for action {} is out of range",
                qi,
                i
            );

            values[i] = if qi > 0.0 {
                let mut child = node.child(i);
                let child_reach = reach.with_player(player, strategy[i]).with_sample(qi);
                let v = self.walk(walk, &mut child, player, child_reach);
                match self.traversal.baseline {
                    Some(decay) => {
                        let b = baseline[i];
                        policy.update_baseline(decay, i, v);
                        b + (v - b) / qi
                    }
                    None if self.traversal.probe => v,
                    None => v / qi,
                }
            } else {
                match self.traversal.baseline {
                    Some(_) => baseline[i],
                    None if self.traversal.probe => {
                        let mut child = node.child(i);
                        self.probe(walk, &mut child, player)
                    }
                    None => 0.0,
                }
            };
        }

        let expected = dot(&strategy, &values);
        values.iter_mut().for_each(|v| *v -= expected);
        policy.add_regret(1.0 / reach.sample, &values);

        expected
    }

    /// The sampled player's node under alternating updates.
    fn sample_opponent<N, R>(
        &self,
        walk: &mut Walk<'_, R, B>,
        node: &N,
        player: usize,
        reach: Reach,
    ) -> f32
    where
        N: GameTreeNode,
        R: Rng + ?Sized,
    {
        let n = node.num_children();
        let policy = self.profile.get_policy(node);
        let mut strategy = self.pool.alloc(n);
        policy.strategy_into(&mut strategy);
        check_strategy(&strategy);

        policy.add_strategy_weight(1.0 / reach.sample);

        let action = self.sampled_action(walk, node, player, &strategy);
        let probability = strategy[action];
        drop(strategy);

        let mut child = node.child(action);
        self.walk(walk, &mut child, player, reach.with_player(player, probability))
    }

    /// Action of the sampled player at `node`, drawn once per infoset per run.
    fn sampled_action<N, R>(
        &self,
        walk: &mut Walk<'_, R, B>,
        node: &N,
        player: usize,
        strategy: &[f32],
    ) -> usize
    where
        N: GameTreeNode,
        R: Rng + ?Sized,
    {
        let info = node.info_set(player);
        let key = info.key();

        if let Some(&action) = walk.memo.get(key) {
            assert!(
                action < strategy.len(),
                "memoized action {} out of range for {} actions",
                action,
                strategy.len()
            );
            return action;
        }

        let action = sample_one(strategy, walk.rng.gen());
        walk.memo.insert(Box::from(key), action);
        action
    }

    /// Single on-policy rollout from `node`, value for `last`.
    fn probe<N, R>(&self, walk: &mut Walk<'_, R, B>, node: &mut N, last: usize) -> f32
    where
        N: GameTreeNode,
        R: Rng + ?Sized,
    {
        let value = match node.node_type() {
            NodeType::Terminal => node.utility(last) as f32,
            NodeType::Chance => {
                let (mut child, _) = node.sample_child(&mut *walk.rng);
                self.probe(walk, &mut child, last)
            }
            NodeType::Player => {
                let player = node.player();
                let n = node.num_children();
                let action = if n == 1 {
                    0
                } else {
                    let policy = self.profile.get_policy(&*node);
                    let mut strategy = self.pool.alloc(n);
                    policy.strategy_into(&mut strategy);
                    check_strategy(&strategy);
                    if player == walk.traverser {
                        sample_one(&strategy, walk.rng.gen())
                    } else {
                        self.sampled_action(walk, &*node, player, &strategy)
                    }
                };

                let mut child = node.child(action);
                let v = self.probe(walk, &mut child, player);
                if player == last {
                    v
                } else {
                    -v
                }
            }
        };
        node.close();
        value
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfr::policy::uniform;
    use crate::cfr::sampler::{RobustSampler, SamplerConfig};
    use crate::cfr::storage::PolicyTable;
    use crate::games::kuhn::KuhnNode;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Wraps a node and counts how many nodes were built and closed.
    #[derive(Debug, Clone)]
    struct Counting<N> {
        inner: N,
        created: Arc<AtomicUsize>,
        closed: Arc<AtomicUsize>,
    }

    impl<N> Counting<N> {
        fn new(inner: N) -> Self {
            Self {
                inner,
                created: Arc::new(AtomicUsize::new(0)),
                closed: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl<N: GameTreeNode> GameTreeNode for Counting<N> {
        type Info = N::Info;

        fn node_type(&self) -> NodeType {
            self.inner.node_type()
        }

        fn player(&self) -> usize {
            self.inner.player()
        }

        fn num_children(&self) -> usize {
            self.inner.num_children()
        }

        fn child(&self, i: usize) -> Self {
            self.created.fetch_add(1, Ordering::SeqCst);
            Self {
                inner: self.inner.child(i),
                created: Arc::clone(&self.created),
                closed: Arc::clone(&self.closed),
            }
        }

        fn child_probability(&self, i: usize) -> f64 {
            self.inner.child_probability(i)
        }

        fn info_set(&self, player: usize) -> N::Info {
            self.inner.info_set(player)
        }

        fn utility(&self, player: usize) -> f64 {
            self.inner.utility(player)
        }

        fn close(&mut self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
            self.inner.close();
        }
    }

    /// Player 1 picks a branch, then player 0 decides at one shared infoset
    /// in both branches. Every choice player 0 makes is logged.
    #[derive(Debug, Clone)]
    enum Revisit {
        Root(Arc<Mutex<Vec<usize>>>),
        Shared(usize, Arc<Mutex<Vec<usize>>>),
        Leaf(usize, usize),
    }

    impl GameTreeNode for Revisit {
        type Info = Vec<u8>;

        fn node_type(&self) -> NodeType {
            match self {
                Revisit::Leaf(..) => NodeType::Terminal,
                _ => NodeType::Player,
            }
        }

        fn player(&self) -> usize {
            match self {
                Revisit::Root(_) => 1,
                _ => 0,
            }
        }

        fn num_children(&self) -> usize {
            match self {
                Revisit::Root(_) => 2,
                Revisit::Shared(..) => 3,
                Revisit::Leaf(..) => 0,
            }
        }

        fn child(&self, i: usize) -> Self {
            match self {
                Revisit::Root(log) => Revisit::Shared(i, Arc::clone(log)),
                Revisit::Shared(branch, log) => {
                    log.lock().unwrap().push(i);
                    Revisit::Leaf(*branch, i)
                }
                Revisit::Leaf(..) => unreachable!("terminal node has no children"),
            }
        }

        fn child_probability(&self, _i: usize) -> f64 {
            0.0
        }

        fn info_set(&self, _player: usize) -> Vec<u8> {
            match self {
                Revisit::Root(_) => b"root".to_vec(),
                _ => b"shared".to_vec(),
            }
        }

        fn utility(&self, player: usize) -> f64 {
            let Revisit::Leaf(branch, action) = self else {
                unreachable!("utility of a decision node")
            };
            let u = (*branch as f64) - (*action as f64);
            if player == 0 {
                u
            } else {
                -u
            }
        }
    }

    /// A one-action decision in front of a terminal.
    #[derive(Debug, Clone)]
    struct Forced(bool);

    impl GameTreeNode for Forced {
        type Info = Vec<u8>;

        fn node_type(&self) -> NodeType {
            if self.0 {
                NodeType::Terminal
            } else {
                NodeType::Player
            }
        }

        fn player(&self) -> usize {
            0
        }

        fn num_children(&self) -> usize {
            if self.0 {
                0
            } else {
                1
            }
        }

        fn child(&self, _i: usize) -> Self {
            Forced(true)
        }

        fn child_probability(&self, _i: usize) -> f64 {
            0.0
        }

        fn info_set(&self, _player: usize) -> Vec<u8> {
            b"forced".to_vec()
        }

        fn utility(&self, player: usize) -> f64 {
            if player == 0 {
                1.5
            } else {
                -1.5
            }
        }
    }

    /// Policy whose strategy does not sum to one.
    struct Broken(usize);

    impl NodePolicy for Broken {
        fn num_actions(&self) -> usize {
            self.0
        }

        fn strategy_into(&self, out: &mut [f32]) {
            uniform(out);
            out.iter_mut().for_each(|p| *p *= 0.5);
        }

        fn add_regret(&self, _weight: f32, _instantaneous_regrets: &[f32]) {}

        fn add_strategy_weight(&self, _weight: f32) {}

        fn strategy_sum_into(&self, out: &mut [f32]) -> f32 {
            out.fill(0.0);
            0.0
        }

        fn get_average_strategy(&self) -> Vec<f32> {
            vec![1.0 / self.0 as f32; self.0]
        }

        fn next_strategy(&self, _pos: f32, _neg: f32, _sum: f32) {}

        fn baseline_into(&self, out: &mut [f32]) {
            out.fill(0.0);
        }

        fn set_baseline(&self, _baseline: &[f32]) {}

        fn update_baseline(&self, _decay: f32, _action: usize, _value: f32) {}
    }

    struct BrokenProfile;

    impl StrategyProfile for BrokenProfile {
        type Policy = Broken;

        fn get_policy<N: GameTreeNode>(&self, node: &N) -> Arc<Broken> {
            Arc::new(Broken(node.num_children()))
        }

        fn update(&self) {}

        fn iter(&self) -> u64 {
            1
        }
    }

    /// A profile with non-uniform strategies that stays fixed afterwards.
    fn trained_profile() -> Arc<PolicyTable> {
        let profile = Arc::new(PolicyTable::default());
        let solver = Solver::vanilla(Arc::clone(&profile));
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..25 {
            solver.run(&mut KuhnNode::new(), &mut rng);
            profile.update();
        }
        profile
    }

    fn mean_value<S: Sampler, B: Pool>(solver: &Solver<PolicyTable, S, B>, runs: usize, seed: u64) -> f64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let total: f64 = (0..runs)
            .map(|_| solver.run(&mut KuhnNode::new(), &mut rng) as f64)
            .sum();
        total / runs as f64
    }

    fn assert_unbiased<S: Sampler, B: Pool>(name: &str, solver: &Solver<PolicyTable, S, B>, runs: usize) {
        let profile = Arc::clone(solver.profile());
        let exact = Solver::vanilla(profile).run(&mut KuhnNode::new(), &mut StdRng::seed_from_u64(1)) as f64;
        let estimate = mean_value(solver, runs, 42);
        println!("{}: estimate {:.4}, exact {:.4}", name, estimate, exact);
        assert!(
            (estimate - exact).abs() < 0.1,
            "{} estimate {} too far from exact value {}",
            name,
            estimate,
            exact
        );
    }

    #[test]
    fn test_vanilla_visits_and_closes_every_node() {
        let profile = Arc::new(PolicyTable::default());
        let solver = Solver::vanilla(Arc::clone(&profile));
        let mut rng = StdRng::seed_from_u64(0);

        for _ in 0..3 {
            let mut root = Counting::new(KuhnNode::new());
            solver.run(&mut root, &mut rng);
            assert_eq!(root.created.load(Ordering::SeqCst), 57);
            assert_eq!(root.closed.load(Ordering::SeqCst), 58);
            profile.update();
        }
        assert_eq!(profile.num_records(), 12);
    }

    #[test]
    fn test_sampled_runs_close_every_built_node() {
        let profile = Arc::new(PolicyTable::default());
        let solver = Solver::mccfr(Arc::clone(&profile), RobustSampler { k: 1 }).with_probing(true);
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..200 {
            let mut root = Counting::new(KuhnNode::new());
            solver.run(&mut root, &mut rng);
            let created = root.created.load(Ordering::SeqCst);
            assert_eq!(root.closed.load(Ordering::SeqCst), created + 1);
            profile.update();
        }
    }

    #[test]
    fn test_vanilla_uniform_root_value() {
        // Fresh table: both players uniform
        let profile = Arc::new(PolicyTable::default());
        let solver = Solver::vanilla(Arc::clone(&profile));
        let value = solver.run(&mut KuhnNode::new(), &mut StdRng::seed_from_u64(0)) as f64;
        let exact = crate::cfr::tree::expected_value(&KuhnNode::new(), |n: &KuhnNode| {
            vec![1.0 / n.num_children() as f32; n.num_children()]
        });
        assert!((value - exact).abs() < 1e-5, "{} vs {}", value, exact);
    }

    #[test]
    fn test_sampled_action_is_memoized_per_run() {
        let profile = Arc::new(PolicyTable::default());
        let solver = Solver::external_sampling(Arc::clone(&profile));
        let mut rng = StdRng::seed_from_u64(17);
        // iter 1: player 1 traverses, player 0 is sampled
        assert_eq!(profile.iter() % 2, 1);

        let mut seen = [false; 3];
        for _ in 0..300 {
            let log = Arc::new(Mutex::new(Vec::new()));
            solver.run(&mut Revisit::Root(Arc::clone(&log)), &mut rng);
            let choices = log.lock().unwrap();
            assert_eq!(choices.len(), 2);
            assert_eq!(choices[0], choices[1], "shared infoset sampled twice in one run");
            seen[choices[0]] = true;
        }
        assert_eq!(seen, [true; 3]);
    }

    #[test]
    fn test_single_action_short_circuits() {
        let profile = Arc::new(PolicyTable::default());
        let value = Solver::vanilla(Arc::clone(&profile)).run(&mut Forced(false), &mut StdRng::seed_from_u64(0));
        assert_eq!(value, 1.5);
        assert_eq!(profile.num_records(), 0);

        let value = Solver::external_sampling(Arc::clone(&profile)).run(&mut Forced(false), &mut StdRng::seed_from_u64(0));
        assert_eq!(value, 1.5);
        assert_eq!(profile.num_records(), 0);
    }

    #[test]
    #[should_panic(expected = "sums to")]
    fn test_malformed_strategy_panics() {
        let solver = Solver::vanilla(Arc::new(BrokenProfile));
        solver.run(&mut KuhnNode::new(), &mut StdRng::seed_from_u64(0));
    }

    #[test]
    fn test_chance_sampling_is_unbiased() {
        assert_unbiased("chance sampling", &Solver::chance_sampling(trained_profile()), 20_000);
    }

    #[test]
    fn test_external_sampling_is_unbiased() {
        assert_unbiased("external sampling", &Solver::external_sampling(trained_profile()), 20_000);
    }

    #[test]
    fn test_outcome_sampling_is_unbiased() {
        assert_unbiased("outcome sampling", &Solver::outcome_sampling(trained_profile(), 0.6), 40_000);
    }

    #[test]
    fn test_average_strategy_sampling_is_unbiased() {
        let sampler = AverageStrategySampler {
            exploration: 0.2,
            threshold: 1.0,
            bonus: 1.0,
        };
        assert_unbiased(
            "average-strategy sampling",
            &Solver::average_strategy_sampling(trained_profile(), sampler),
            40_000,
        );
    }

    #[test]
    fn test_mccfr_is_unbiased() {
        assert_unbiased("robust", &Solver::mccfr(trained_profile(), RobustSampler { k: 1 }), 20_000);
        assert_unbiased(
            "robust with probing",
            &Solver::mccfr(trained_profile(), RobustSampler { k: 1 }).with_probing(true),
            20_000,
        );
        assert_unbiased(
            "multi-outcome",
            &Solver::mccfr(trained_profile(), SamplerConfig::MultiOutcome { k: 1, exploration: 0.3 }),
            40_000,
        );
    }

    #[test]
    fn test_variance_reduced_is_unbiased() {
        let profile = trained_profile();
        let solver = Solver::variance_reduced(profile, OutcomeSampler { exploration: 0.5 }, 0.1);
        assert_unbiased("variance reduced", &solver, 40_000);
    }

    #[test]
    fn test_baseline_tracks_child_values() {
        let profile = Arc::new(PolicyTable::default());
        let solver = Solver::variance_reduced(Arc::clone(&profile), ExternalSampler, 0.05);
        let mut rng = StdRng::seed_from_u64(0);
        // Player 1 traverses at iteration 1
        for _ in 0..400 {
            solver.run(&mut Revisit::Root(Arc::new(Mutex::new(Vec::new()))), &mut rng);
        }

        // Player 1 gets action - branch, player 0 picks uniformly
        let baseline = profile.get_record(1, b"root").unwrap().get_baseline();
        assert!((baseline[0] - 1.0).abs() < 0.5, "baseline {:?}", baseline);
        assert!((baseline[1] - 0.0).abs() < 0.5, "baseline {:?}", baseline);
    }
}

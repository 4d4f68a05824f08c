//! Pluggable action samplers for the traversing player.
//!
//! A sampler fills a vector `q` over the children of a decision node:
//! `q[i] > 0` means child `i` is recursed into and was selected with
//! inclusion probability `q[i]`; `q[i] == 0` means it is skipped (or probed).
//! The engine divides sampled values by `q[i]`, so `q` must be the real
//! selection probability for the estimates to stay unbiased.

use std::cell::RefCell;

use rand::Rng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cfr::config::ConfigError;
use crate::cfr::game::GameTreeNode;
use crate::cfr::policy::NodePolicy;

/// Chooses which children of a decision node to traverse.
pub trait Sampler: Send + Sync {
    /// Fill `out` (length `node.num_children()`) with inclusion probabilities.
    ///
    /// `strategy` is the policy's current strategy, already copied by the
    /// engine.
    fn sample<N, Q, R>(&self, node: &N, policy: &Q, strategy: &[f32], rng: &mut R, out: &mut [f32])
    where
        N: GameTreeNode,
        Q: NodePolicy + ?Sized,
        R: Rng + ?Sized;
}

/// Draw an index from `distribution` by inverse CDF with uniform `r`.
///
/// Never returns an index with zero probability.
pub fn sample_one(distribution: &[f32], r: f32) -> usize {
    let mut cumulative = 0.0;
    let mut last_positive = None;
    for (i, &p) in distribution.iter().enumerate() {
        if p <= 0.0 {
            continue;
        }
        cumulative += p;
        last_positive = Some(i);
        if r < cumulative {
            return i;
        }
    }

    match last_positive {
        Some(i) => i,
        None => panic!("cannot sample from an all-zero distribution {:?}", distribution),
    }
}

/// Every child is traversed: full enumeration under the sampler interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalSampler;

impl Sampler for ExternalSampler {
    fn sample<N, Q, R>(&self, _node: &N, _policy: &Q, _strategy: &[f32], _rng: &mut R, out: &mut [f32])
    where
        N: GameTreeNode,
        Q: NodePolicy + ?Sized,
        R: Rng + ?Sized,
    {
        out.fill(1.0);
    }
}

/// One child drawn from the current strategy mixed with uniform exploration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSampler {
    /// Weight of the uniform component.
    pub exploration: f32,
}

impl Default for OutcomeSampler {
    fn default() -> Self {
        Self { exploration: 0.6 }
    }
}

impl Sampler for OutcomeSampler {
    fn sample<N, Q, R>(&self, _node: &N, _policy: &Q, strategy: &[f32], rng: &mut R, out: &mut [f32])
    where
        N: GameTreeNode,
        Q: NodePolicy + ?Sized,
        R: Rng + ?Sized,
    {
        explore(strategy, self.exploration, out);
        let selected = sample_one(out, rng.gen());
        let q = out[selected];
        out.fill(0.0);
        out[selected] = q;
    }
}

/// `out = exploration / n + (1 - exploration) * strategy`.
fn explore(strategy: &[f32], exploration: f32, out: &mut [f32]) {
    let floor = exploration / strategy.len() as f32;
    for (o, &p) in out.iter_mut().zip(strategy) {
        *o = floor + (1.0 - exploration) * p;
    }
}

/// Average-strategy sampling (Gibson et al. 2012).
///
/// Each child is sampled independently with probability `min(1, ρ)` where
/// `ρ = max(ε, (β + τ·s[i]) / (β + Σ s))` and `s` is the accumulated strategy
/// mass of the infoset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AverageStrategySampler {
    /// Floor probability ε for low-mass actions.
    pub exploration: f32,
    /// Threshold τ scaling the accumulated mass.
    pub threshold: f32,
    /// Bonus β keeping early iterations close to full enumeration.
    pub bonus: f32,
}

impl Default for AverageStrategySampler {
    fn default() -> Self {
        Self {
            exploration: 0.05,
            threshold: 1000.0,
            bonus: 1e6,
        }
    }
}

impl Sampler for AverageStrategySampler {
    fn sample<N, Q, R>(&self, _node: &N, policy: &Q, _strategy: &[f32], rng: &mut R, out: &mut [f32])
    where
        N: GameTreeNode,
        Q: NodePolicy + ?Sized,
        R: Rng + ?Sized,
    {
        let total = policy.strategy_sum_into(out);
        for o in out.iter_mut() {
            let rho = ((self.bonus + self.threshold * *o) / (self.bonus + total)).max(self.exploration);
            let q = rho.min(1.0);
            *o = if rng.gen::<f32>() < q { q } else { 0.0 };
        }
    }
}

/// Exactly `k` children drawn without replacement from the explored strategy.
///
/// Inclusion probabilities of weighted sampling without replacement are
/// computed exactly, so only small action counts (at most 64) are supported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultiOutcomeSampler {
    /// Number of children to draw.
    pub k: usize,
    /// Weight of the uniform component.
    pub exploration: f32,
}

/// Largest action count [`MultiOutcomeSampler`] accepts.
pub const MAX_MULTI_OUTCOME_ACTIONS: usize = 64;

thread_local! {
    static INCLUSION_MEMO: RefCell<InclusionMemo> = RefCell::new(InclusionMemo::new());
}

impl Sampler for MultiOutcomeSampler {
    fn sample<N, Q, R>(&self, _node: &N, _policy: &Q, strategy: &[f32], rng: &mut R, out: &mut [f32])
    where
        N: GameTreeNode,
        Q: NodePolicy + ?Sized,
        R: Rng + ?Sized,
    {
        let n = strategy.len();
        assert!(
            n <= MAX_MULTI_OUTCOME_ACTIONS,
            "multi-outcome sampling supports at most {} actions, got {}",
            MAX_MULTI_OUTCOME_ACTIONS,
            n
        );

        explore(strategy, self.exploration, out);
        let mut weights = [0.0f64; MAX_MULTI_OUTCOME_ACTIONS];
        for (w, &o) in weights.iter_mut().zip(out.iter()) {
            *w = o as f64;
        }
        let weights = &weights[..n];
        let candidates = weights
            .iter()
            .enumerate()
            .filter(|&(_, &w)| w > 0.0)
            .fold(0u64, |mask, (i, _)| mask | (1 << i));

        let mut inclusion = [0.0f64; MAX_MULTI_OUTCOME_ACTIONS];
        INCLUSION_MEMO.with(|memo| {
            let mut memo = memo.borrow_mut();
            memo.clear();
            inclusion_probabilities(weights, candidates, self.k, &mut memo, &mut inclusion[..n]);
        });

        // Successive draws without replacement
        let mut remaining = candidates;
        out.fill(0.0);
        for _ in 0..self.k.min(candidates.count_ones() as usize) {
            let total: f64 = bits(remaining).map(|i| weights[i]).sum();
            let r = rng.gen::<f64>() * total;
            let mut cumulative = 0.0;
            let mut chosen = None;
            for i in bits(remaining) {
                cumulative += weights[i];
                chosen = Some(i);
                if r < cumulative {
                    break;
                }
            }
            if let Some(i) = chosen {
                out[i] = inclusion[i] as f32;
                remaining &= !(1 << i);
            }
        }
    }
}

fn bits(mask: u64) -> impl Iterator<Item = usize> {
    (0..64usize).filter(move |&i| mask & (1u64 << i) != 0)
}

/// Memo of partial inclusion probabilities for one weight vector.
///
/// Entries are keyed by `(remaining set, draws left)` and stored back to back
/// in one buffer, so a cleared memo is refilled without allocating once it
/// has grown to the working size.
#[derive(Debug, Default)]
pub struct InclusionMemo {
    index: FxHashMap<(u64, usize), usize>,
    values: Vec<f64>,
}

impl InclusionMemo {
    /// Empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every entry, keeping the allocations.
    pub fn clear(&mut self) {
        self.index.clear();
        self.values.clear();
    }

    /// Number of memoized `(set, k)` entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the memo holds no entry.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn get(&self, mask: u64, k: usize, n: usize) -> Option<&[f64]> {
        self.index.get(&(mask, k)).map(|&at| &self.values[at..at + n])
    }
}

/// Probability that each index ends up among `k` successive weighted draws
/// without replacement from the set `mask`, written into `out`.
///
/// `π_i(S, k) = w_i / W_S + Σ_{j ∈ S, j ≠ i} (w_j / W_S) · π_i(S \ {j}, k - 1)`
///
/// The memo must only hold entries computed for the same `weights`.
pub fn inclusion_probabilities(weights: &[f64], mask: u64, k: usize, memo: &mut InclusionMemo, out: &mut [f64]) {
    let n = weights.len();
    assert!(n <= MAX_MULTI_OUTCOME_ACTIONS, "at most {} weights", MAX_MULTI_OUTCOME_ACTIONS);
    out.fill(0.0);
    if k == 0 {
        return;
    }
    if mask.count_ones() as usize <= k {
        bits(mask).for_each(|i| out[i] = 1.0);
        return;
    }
    fill_inclusion(weights, mask, k, memo);
    if let Some(probs) = memo.get(mask, k, n) {
        out.copy_from_slice(probs);
    }
}

/// Memoize `π(mask, k)`; requires `0 < k < |mask|`.
fn fill_inclusion(weights: &[f64], mask: u64, k: usize, memo: &mut InclusionMemo) {
    let n = weights.len();
    if memo.index.contains_key(&(mask, k)) {
        return;
    }

    let total: f64 = bits(mask).map(|i| weights[i]).sum();
    let mut probs = [0.0f64; MAX_MULTI_OUTCOME_ACTIONS];
    for j in bits(mask) {
        let first = weights[j] / total;
        probs[j] += first;

        let rest = mask & !(1 << j);
        let left = k - 1;
        if left == 0 {
            continue;
        }
        if rest.count_ones() as usize <= left {
            bits(rest).for_each(|i| probs[i] += first);
            continue;
        }
        fill_inclusion(weights, rest, left, memo);
        if let Some(sub) = memo.get(rest, left, n) {
            for (p, r) in probs.iter_mut().zip(sub) {
                *p += first * r;
            }
        }
    }

    let at = memo.values.len();
    memo.values.extend_from_slice(&probs[..n]);
    memo.index.insert((mask, k), at);
}

/// Uniform random subset of `k` children, each with probability `k / n`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RobustSampler {
    /// Size of the subset.
    pub k: usize,
}

impl Sampler for RobustSampler {
    fn sample<N, Q, R>(&self, _node: &N, _policy: &Q, _strategy: &[f32], rng: &mut R, out: &mut [f32])
    where
        N: GameTreeNode,
        Q: NodePolicy + ?Sized,
        R: Rng + ?Sized,
    {
        let n = out.len();
        if self.k >= n {
            out.fill(1.0);
            return;
        }

        out.fill(0.0);
        let p = self.k as f32 / n as f32;
        for i in rand::seq::index::sample(rng, n, self.k) {
            out[i] = p;
        }
    }
}

/// Serializable choice of sampler, itself usable as a [`Sampler`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SamplerConfig {
    /// See [`ExternalSampler`].
    External,
    /// See [`OutcomeSampler`].
    Outcome {
        /// Weight of the uniform component.
        exploration: f32,
    },
    /// See [`AverageStrategySampler`].
    AverageStrategy {
        /// Floor probability ε.
        exploration: f32,
        /// Threshold τ.
        threshold: f32,
        /// Bonus β.
        bonus: f32,
    },
    /// See [`MultiOutcomeSampler`].
    MultiOutcome {
        /// Children drawn per node.
        k: usize,
        /// Weight of the uniform component.
        exploration: f32,
    },
    /// See [`RobustSampler`].
    Robust {
        /// Size of the subset.
        k: usize,
    },
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig::External
    }
}

impl SamplerConfig {
    /// Check parameter ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            SamplerConfig::External => Ok(()),
            SamplerConfig::Outcome { exploration } => check_exploration(exploration),
            SamplerConfig::AverageStrategy {
                exploration,
                threshold,
                bonus,
            } => {
                check_exploration(exploration)?;
                if !(threshold.is_finite() && threshold >= 0.0) {
                    return Err(ConfigError::InvalidSamplerParameter("threshold", threshold as f64));
                }
                if !(bonus.is_finite() && bonus >= 0.0) {
                    return Err(ConfigError::InvalidSamplerParameter("bonus", bonus as f64));
                }
                Ok(())
            }
            SamplerConfig::MultiOutcome { k, exploration } => {
                if k == 0 {
                    return Err(ConfigError::ZeroSampleSize);
                }
                check_exploration(exploration)
            }
            SamplerConfig::Robust { k } => {
                if k == 0 {
                    return Err(ConfigError::ZeroSampleSize);
                }
                Ok(())
            }
        }
    }
}

fn check_exploration(exploration: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&exploration) {
        Ok(())
    } else {
        Err(ConfigError::InvalidExploration(exploration as f64))
    }
}

impl Sampler for SamplerConfig {
    fn sample<N, Q, R>(&self, node: &N, policy: &Q, strategy: &[f32], rng: &mut R, out: &mut [f32])
    where
        N: GameTreeNode,
        Q: NodePolicy + ?Sized,
        R: Rng + ?Sized,
    {
        match *self {
            SamplerConfig::External => ExternalSampler.sample(node, policy, strategy, rng, out),
            SamplerConfig::Outcome { exploration } => {
                OutcomeSampler { exploration }.sample(node, policy, strategy, rng, out)
            }
            SamplerConfig::AverageStrategy {
                exploration,
                threshold,
                bonus,
            } => AverageStrategySampler {
                exploration,
                threshold,
                bonus,
            }
            .sample(node, policy, strategy, rng, out),
            SamplerConfig::MultiOutcome { k, exploration } => {
                MultiOutcomeSampler { k, exploration }.sample(node, policy, strategy, rng, out)
            }
            SamplerConfig::Robust { k } => RobustSampler { k }.sample(node, policy, strategy, rng, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfr::policy::Record;
    use crate::games::kuhn::KuhnNode;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn node() -> KuhnNode {
        KuhnNode::new()
    }

    #[test]
    fn test_sample_one_skips_zero_mass() {
        assert_eq!(sample_one(&[0.0, 1.0, 0.0], 0.0), 1);
        assert_eq!(sample_one(&[0.5, 0.5, 0.0], 0.999_999), 1);
        assert_eq!(sample_one(&[0.2, 0.3, 0.5], 0.1), 0);
        assert_eq!(sample_one(&[0.2, 0.3, 0.5], 0.4), 1);
        // Rounding slack past the end lands on the last positive entry
        assert_eq!(sample_one(&[0.3, 0.3, 0.0], 0.7), 1);
    }

    #[test]
    #[should_panic(expected = "all-zero")]
    fn test_sample_one_all_zero_panics() {
        sample_one(&[0.0, 0.0], 0.5);
    }

    #[test]
    fn test_external_samples_everything() {
        let mut rng = StdRng::seed_from_u64(1);
        let record = Record::new(3);
        let mut out = [0.0; 3];
        ExternalSampler.sample(&node(), &record, &[0.2, 0.3, 0.5], &mut rng, &mut out);
        assert_eq!(out, [1.0; 3]);
    }

    #[test]
    fn test_outcome_selects_one_with_its_probability() {
        let mut rng = StdRng::seed_from_u64(7);
        let record = Record::new(2);
        let sampler = OutcomeSampler { exploration: 0.5 };
        let strategy = [1.0, 0.0];
        let mut counts = [0usize; 2];

        for _ in 0..10_000 {
            let mut out = [0.0; 2];
            sampler.sample(&node(), &record, &strategy, &mut rng, &mut out);
            let selected: Vec<usize> = (0..2).filter(|&i| out[i] > 0.0).collect();
            assert_eq!(selected.len(), 1);
            let i = selected[0];
            let expected = if i == 0 { 0.75 } else { 0.25 };
            assert_abs_diff_eq!(out[i], expected, epsilon = 1e-6);
            counts[i] += 1;
        }

        let freq = counts[0] as f64 / 10_000.0;
        assert!((freq - 0.75).abs() < 0.03, "frequency {}", freq);
    }

    #[test]
    fn test_average_strategy_new_infoset_enumerates() {
        let mut rng = StdRng::seed_from_u64(3);
        let record = Record::new(3);
        let mut out = [0.0; 3];
        AverageStrategySampler::default().sample(&node(), &record, &[1.0 / 3.0; 3], &mut rng, &mut out);
        // No mass yet: rho = beta / beta = 1 for every action
        assert_eq!(out, [1.0; 3]);
    }

    #[test]
    fn test_average_strategy_prunes_low_mass() {
        let mut rng = StdRng::seed_from_u64(3);
        let record = Record::from_sums(vec![0.0; 2], vec![1e9, 0.0]);
        let sampler = AverageStrategySampler {
            exploration: 0.05,
            threshold: 1.0,
            bonus: 0.0,
        };

        let mut hits = 0;
        for _ in 0..4_000 {
            let mut out = [0.0; 2];
            sampler.sample(&node(), &record, &[0.5, 0.5], &mut rng, &mut out);
            assert_eq!(out[0], 1.0);
            if out[1] > 0.0 {
                assert_abs_diff_eq!(out[1], 0.05, epsilon = 1e-6);
                hits += 1;
            }
        }
        let freq = hits as f64 / 4_000.0;
        assert!((freq - 0.05).abs() < 0.02, "frequency {}", freq);
    }

    #[test]
    fn test_inclusion_probabilities_sum_to_k() {
        let weights = [0.1, 0.2, 0.3, 0.4];
        for k in 1..=4 {
            let mut probs = [0.0; 4];
            inclusion_probabilities(&weights, 0b1111, k, &mut InclusionMemo::new(), &mut probs);
            let total: f64 = probs.iter().sum();
            assert_abs_diff_eq!(total, k as f64, epsilon = 1e-9);
            assert!(probs.iter().all(|&p| (0.0..=1.0 + 1e-12).contains(&p)));
        }
    }

    #[test]
    fn test_inclusion_probabilities_two_of_three() {
        // P(0 in sample) = w0 + w1 * w0/(w0+w2) + w2 * w0/(w0+w1)
        let w = [0.5, 0.3, 0.2];
        let mut probs = [0.0; 3];
        inclusion_probabilities(&w, 0b111, 2, &mut InclusionMemo::new(), &mut probs);
        let expected = 0.5 + 0.3 * (0.5 / 0.7) + 0.2 * (0.5 / 0.8);
        assert_abs_diff_eq!(probs[0], expected, epsilon = 1e-12);
    }

    #[test]
    fn test_inclusion_memo_reuse() {
        let mut memo = InclusionMemo::new();
        let first = [0.1, 0.2, 0.3, 0.4];
        let mut probs = [0.0; 4];
        inclusion_probabilities(&first, 0b1111, 2, &mut memo, &mut probs);
        let entries = memo.len();
        let capacity = memo.values.capacity();
        assert!(entries > 0);

        // Same weights, same memo: answered from the memo
        let mut again = [0.0; 4];
        inclusion_probabilities(&first, 0b1111, 2, &mut memo, &mut again);
        assert_eq!(probs, again);
        assert_eq!(memo.len(), entries);

        // Cleared memo serves new weights without growing
        memo.clear();
        assert!(memo.is_empty());
        let second = [0.4, 0.3, 0.2, 0.1];
        let mut reused = [0.0; 4];
        inclusion_probabilities(&second, 0b1111, 2, &mut memo, &mut reused);
        assert_eq!(memo.values.capacity(), capacity);

        let mut fresh = [0.0; 4];
        inclusion_probabilities(&second, 0b1111, 2, &mut InclusionMemo::new(), &mut fresh);
        assert_eq!(reused, fresh);
        assert_abs_diff_eq!(reused[0], probs[3], epsilon = 1e-12);
    }

    #[test]
    fn test_multi_outcome_consecutive_visits_are_independent() {
        // The per-thread memo must not leak one node's weights into the next
        let mut rng = StdRng::seed_from_u64(3);
        let record = Record::new(3);
        let sampler = MultiOutcomeSampler { k: 2, exploration: 0.0 };
        for strategy in [[0.5, 0.3, 0.2], [0.2, 0.3, 0.5], [0.5, 0.3, 0.2]] {
            let weights = strategy.map(|w| w as f64);
            let mut expected = [0.0; 3];
            inclusion_probabilities(&weights, 0b111, 2, &mut InclusionMemo::new(), &mut expected);

            let mut out = [0.0; 3];
            sampler.sample(&node(), &record, &strategy, &mut rng, &mut out);
            for i in 0..3 {
                if out[i] > 0.0 {
                    assert_abs_diff_eq!(out[i] as f64, expected[i], epsilon = 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_multi_outcome_matches_inclusion_frequency() {
        let mut rng = StdRng::seed_from_u64(11);
        let record = Record::new(3);
        let sampler = MultiOutcomeSampler { k: 2, exploration: 0.0 };
        let strategy = [0.5, 0.3, 0.2];
        let mut counts = [0usize; 3];
        let trials = 20_000;

        for _ in 0..trials {
            let mut out = [0.0; 3];
            sampler.sample(&node(), &record, &strategy, &mut rng, &mut out);
            assert_eq!(out.iter().filter(|&&q| q > 0.0).count(), 2);
            for i in 0..3 {
                if out[i] > 0.0 {
                    counts[i] += 1;
                }
            }
        }

        let weights = [0.5, 0.3, 0.2];
        let mut probs = [0.0; 3];
        inclusion_probabilities(&weights, 0b111, 2, &mut InclusionMemo::new(), &mut probs);
        for i in 0..3 {
            let freq = counts[i] as f64 / trials as f64;
            assert!((freq - probs[i]).abs() < 0.02, "action {} frequency {} vs {}", i, freq, probs[i]);
        }
    }

    #[test]
    fn test_multi_outcome_skips_zero_weight() {
        let mut rng = StdRng::seed_from_u64(5);
        let record = Record::new(3);
        let sampler = MultiOutcomeSampler { k: 2, exploration: 0.0 };
        let mut out = [0.0; 3];
        sampler.sample(&node(), &record, &[0.0, 0.5, 0.5], &mut rng, &mut out);
        assert_eq!(out, [0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_robust_uniform_subset() {
        let mut rng = StdRng::seed_from_u64(9);
        let record = Record::new(4);
        let mut out = [0.0; 4];
        RobustSampler { k: 2 }.sample(&node(), &record, &[0.25; 4], &mut rng, &mut out);
        assert_eq!(out.iter().filter(|&&q| q == 0.5).count(), 2);
        assert_eq!(out.iter().filter(|&&q| q == 0.0).count(), 2);

        RobustSampler { k: 9 }.sample(&node(), &record, &[0.25; 4], &mut rng, &mut out);
        assert_eq!(out, [1.0; 4]);
    }

    #[test]
    fn test_config_validation() {
        assert!(SamplerConfig::External.validate().is_ok());
        assert!(SamplerConfig::Outcome { exploration: 1.5 }.validate().is_err());
        assert!(SamplerConfig::Robust { k: 0 }.validate().is_err());
        assert!(SamplerConfig::MultiOutcome { k: 2, exploration: 0.1 }.validate().is_ok());
    }

    #[test]
    fn test_config_json() {
        let config = SamplerConfig::MultiOutcome { k: 3, exploration: 0.25 };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"kind\":\"multi_outcome\""));
        let parsed: SamplerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}

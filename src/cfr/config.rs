//! Configuration options for the CFR solver.
//!
//! This module provides configuration structs that select the traversal
//! variant, the discounting scheme and the training cadence.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cfr::discount::DiscountParams;
use crate::cfr::error::Result;
use crate::cfr::sampler::SamplerConfig;
use crate::cfr::solver::Traversal;

/// Which member of the CFR family drives the traversal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Variant {
    /// Full traversal of chance and both players.
    Vanilla,
    /// Chance sampled, both players enumerated.
    ChanceSampling,
    /// Chance and opponent sampled, traversing player enumerated.
    ExternalSampling,
    /// A single trajectory per run with ε-exploration for the traverser.
    OutcomeSampling {
        /// Weight of the uniform component at traversing nodes.
        exploration: f32,
    },
    /// Traversing player's actions pruned by accumulated strategy mass.
    AverageStrategySampling {
        /// Floor probability ε.
        exploration: f32,
        /// Threshold τ.
        threshold: f32,
        /// Bonus β.
        bonus: f32,
    },
    /// Generalized MCCFR with a pluggable sampler.
    Mccfr {
        /// Sampler for the traversing player.
        sampler: SamplerConfig,
        /// Estimate unsampled actions with a single rollout.
        probe: bool,
    },
    /// MCCFR with a per-action baseline control variate.
    VarianceReduced {
        /// Sampler for the traversing player.
        sampler: SamplerConfig,
        /// Step size of the baseline moving average, in `(0, 1]`.
        baseline_decay: f32,
    },
}

impl Default for Variant {
    fn default() -> Self {
        Variant::ExternalSampling
    }
}

impl Variant {
    /// Whether each run updates only the player chosen by iteration parity.
    ///
    /// Alternating variants can run many traversals in parallel within one
    /// iteration.
    pub fn is_alternating(&self) -> bool {
        !matches!(self, Variant::Vanilla | Variant::ChanceSampling)
    }

    /// Traversal configuration of this variant.
    pub fn traversal(&self) -> Traversal {
        match *self {
            Variant::Vanilla => Traversal::vanilla(),
            Variant::ChanceSampling => Traversal::chance_sampling(),
            Variant::ExternalSampling
            | Variant::OutcomeSampling { .. }
            | Variant::AverageStrategySampling { .. } => Traversal::sampled(),
            Variant::Mccfr { probe, .. } => Traversal {
                probe,
                ..Traversal::sampled()
            },
            Variant::VarianceReduced { baseline_decay, .. } => {
                Traversal::variance_reduced(baseline_decay)
            }
        }
    }

    /// Sampler for the traversing player. Simultaneous variants never
    /// consult it.
    pub fn sampler(&self) -> SamplerConfig {
        match *self {
            Variant::Vanilla | Variant::ChanceSampling | Variant::ExternalSampling => {
                SamplerConfig::External
            }
            Variant::OutcomeSampling { exploration } => SamplerConfig::Outcome { exploration },
            Variant::AverageStrategySampling {
                exploration,
                threshold,
                bonus,
            } => SamplerConfig::AverageStrategy {
                exploration,
                threshold,
                bonus,
            },
            Variant::Mccfr { sampler, .. } | Variant::VarianceReduced { sampler, .. } => sampler,
        }
    }
}

/// Configuration for the CFR solver and its training driver.
///
/// # Example
/// ```
/// use cfr_solver::cfr::{SolverConfig, Variant};
///
/// let config = SolverConfig::default();
/// assert_eq!(config.variant, Variant::ExternalSampling);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Traversal variant.
    #[serde(default)]
    pub variant: Variant,

    /// Discount flags applied at every update.
    #[serde(default)]
    pub discount: DiscountParams,

    /// Number of runs between two updates of the policy table.
    ///
    /// Within a batch all runs see the same strategies, so the batch can be
    /// spread over worker threads for alternating variants.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Number of threads for parallel batches.
    ///
    /// `None` uses all available cores.
    #[serde(default)]
    pub num_threads: Option<usize>,

    /// Random seed for reproducibility.
    ///
    /// If `None`, a random seed is used.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Log progress every this many iterations (0 disables).
    #[serde(default)]
    pub progress_interval: u64,
}

fn default_batch_size() -> usize {
    1
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            discount: DiscountParams::default(),
            batch_size: default_batch_size(),
            num_threads: None,
            seed: None,
            progress_interval: 0,
        }
    }
}

impl SolverConfig {
    /// Create a new SolverConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Vanilla CFR with no discounting (for comparison/testing).
    pub fn vanilla() -> Self {
        Self {
            variant: Variant::Vanilla,
            ..Default::default()
        }
    }

    /// Full-traversal CFR+.
    pub fn cfr_plus() -> Self {
        Self {
            variant: Variant::Vanilla,
            discount: DiscountParams::cfr_plus(),
            ..Default::default()
        }
    }

    /// External-sampling MCCFR with Linear CFR weighting.
    pub fn linear() -> Self {
        Self {
            variant: Variant::ExternalSampling,
            discount: DiscountParams::linear(),
            ..Default::default()
        }
    }

    /// External-sampling MCCFR with Discounted CFR weighting.
    ///
    /// # Arguments
    /// * `alpha` - Positive regret exponent (typically 1.5)
    /// * `beta` - Negative regret exponent (typically 0.0 - 0.5)
    /// * `gamma` - Strategy sum exponent (typically 2.0)
    pub fn discounted(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self {
            variant: Variant::ExternalSampling,
            discount: DiscountParams::discounted(alpha, beta, gamma),
            ..Default::default()
        }
    }

    /// External-sampling MCCFR without discounting.
    pub fn external_sampling() -> Self {
        Self::default()
    }

    /// Builder method: set the traversal variant.
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    /// Builder method: set the discount flags.
    pub fn with_discount(mut self, discount: DiscountParams) -> Self {
        self.discount = discount;
        self
    }

    /// Builder method: set number of runs per update.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Builder method: set number of threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = Some(threads);
        self
    }

    /// Builder method: set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builder method: set the progress logging interval.
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Parse a configuration from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        match self.variant {
            Variant::Vanilla | Variant::ChanceSampling | Variant::ExternalSampling => {}
            Variant::OutcomeSampling { exploration } => {
                SamplerConfig::Outcome { exploration }.validate()?;
            }
            Variant::AverageStrategySampling {
                exploration,
                threshold,
                bonus,
            } => {
                SamplerConfig::AverageStrategy {
                    exploration,
                    threshold,
                    bonus,
                }
                .validate()?;
            }
            Variant::Mccfr { sampler, .. } => sampler.validate()?,
            Variant::VarianceReduced {
                sampler,
                baseline_decay,
            } => {
                sampler.validate()?;
                if !(baseline_decay > 0.0 && baseline_decay <= 1.0) {
                    return Err(ConfigError::InvalidBaselineDecay(baseline_decay as f64));
                }
            }
        }

        let d = &self.discount;
        for (name, exponent) in [("alpha", d.alpha), ("beta", d.beta), ("gamma", d.gamma)] {
            if !(exponent.is_finite() && exponent >= 0.0) {
                return Err(ConfigError::InvalidDiscount(name, exponent));
            }
        }

        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }

        Ok(())
    }
}

/// Errors that can occur when validating a solver configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Exploration probability is out of range [0, 1].
    #[error("exploration probability {0} is out of range [0, 1]")]
    InvalidExploration(f64),
    /// Discount exponent is negative or not finite.
    #[error("{0} discount exponent {1} must be finite and non-negative")]
    InvalidDiscount(&'static str, f64),
    /// A sampler parameter is negative or not finite.
    #[error("sampler parameter {0} = {1} must be finite and non-negative")]
    InvalidSamplerParameter(&'static str, f64),
    /// Multi-outcome or robust sampler asked for zero actions.
    #[error("sampler must draw at least one action")]
    ZeroSampleSize,
    /// Baseline decay is out of range (0, 1].
    #[error("baseline decay {0} is out of range (0, 1]")]
    InvalidBaselineDecay(f64),
    /// Batch size of zero.
    #[error("batch size must be at least 1")]
    ZeroBatchSize,
}

/// Statistics tracked during CFR training.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingStats {
    /// Total number of iterations completed.
    pub iterations: u64,

    /// Total number of traversals run.
    pub runs: u64,

    /// Number of unique information sets discovered.
    pub info_sets: usize,

    /// Total time spent training (in seconds).
    pub elapsed_seconds: f64,

    /// Iterations per second.
    pub iterations_per_second: f64,

    /// Mean root value over all runs, from player 0's perspective.
    pub mean_root_value: f64,
}

impl TrainingStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update iterations per second based on elapsed time.
    pub fn update_rate(&mut self) {
        if self.elapsed_seconds > 0.0 {
            self.iterations_per_second = self.iterations as f64 / self.elapsed_seconds;
        }
    }

    /// Fold a batch of root values into the running mean.
    pub fn record_values(&mut self, total: f64, runs: u64) {
        if runs == 0 {
            return;
        }
        let before = self.runs as f64;
        self.runs += runs;
        self.mean_root_value = (self.mean_root_value * before + total) / self.runs as f64;
    }
}

//! Iteration discounting for CFR+, Linear CFR and Discounted CFR.
//!
//! All three schemes reduce to three multiplicative factors applied to the
//! accumulators between iterations: one for positive regret, one for
//! negative regret and one for the strategy sum.

use serde::{Deserialize, Serialize};

/// Flags selecting the discounting scheme.
///
/// With every flag off the factors are `(1, 1, 1)`, i.e. vanilla CFR.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DiscountParams {
    /// Regret matching+: negative regret is dropped every iteration.
    #[serde(default)]
    pub use_regret_matching_plus: bool,

    /// Linear CFR: the strategy sum decays by `t / (t + 1)`.
    #[serde(default)]
    pub linear_weighting: bool,

    /// DCFR exponent for positive regret (0 disables).
    #[serde(default)]
    pub alpha: f64,

    /// DCFR exponent for negative regret (0 disables).
    #[serde(default)]
    pub beta: f64,

    /// DCFR exponent for the strategy sum (0 disables).
    #[serde(default)]
    pub gamma: f64,
}

impl DiscountParams {
    /// CFR+ (Tammelin 2014): regret matching+ with linear averaging.
    pub fn cfr_plus() -> Self {
        Self {
            use_regret_matching_plus: true,
            linear_weighting: true,
            ..Default::default()
        }
    }

    /// Linear CFR (Brown & Sandholm 2019).
    pub fn linear() -> Self {
        Self {
            linear_weighting: true,
            ..Default::default()
        }
    }

    /// Discounted CFR with the given exponents.
    ///
    /// The paper recommends `alpha = 1.5, beta = 0, gamma = 2`. A `beta` of
    /// exactly zero leaves negative regret undiscounted.
    pub fn discounted(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self {
            alpha,
            beta,
            gamma,
            ..Default::default()
        }
    }

    /// Compute `(positive, negative, sum)` discount factors for iteration `t`.
    ///
    /// - DCFR positive: `t^α / (t^α + 1)`
    /// - DCFR negative: `t^β / (t^β + 1)`
    /// - DCFR sum: `(t / (t + 1))^γ`
    /// - Linear: sum is `t / (t + 1)`
    /// - CFR+: negative is forced to 0
    pub fn discount_factors(&self, iteration: u64) -> (f32, f32, f32) {
        let t = iteration as f64;
        let mut positive = 1.0f64;
        let mut negative = 1.0f64;
        let mut sum = 1.0f64;

        if self.linear_weighting {
            sum = t / (t + 1.0);
        }

        if self.alpha != 0.0 {
            let x = t.powf(self.alpha);
            positive = x / (x + 1.0);
        }

        if self.beta != 0.0 {
            let x = t.powf(self.beta);
            negative = x / (x + 1.0);
        }

        if self.gamma != 0.0 {
            sum = (t / (t + 1.0)).powf(self.gamma);
        }

        if self.use_regret_matching_plus {
            negative = 0.0;
        }

        (positive as f32, negative as f32, sum as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_default_is_vanilla() {
        let params = DiscountParams::default();
        for t in [0, 1, 2, 17, 1_000_000] {
            assert_eq!(params.discount_factors(t), (1.0, 1.0, 1.0));
        }
    }

    #[test]
    fn test_cfr_plus_drops_negative_regret() {
        let (pos, neg, sum) = DiscountParams::cfr_plus().discount_factors(3);
        assert_eq!(pos, 1.0);
        assert_eq!(neg, 0.0);
        assert_abs_diff_eq!(sum, 0.75, epsilon = 1e-6);
    }

    #[test]
    fn test_linear_weighting() {
        let params = DiscountParams::linear();
        assert_abs_diff_eq!(params.discount_factors(1).2, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(params.discount_factors(9).2, 0.9, epsilon = 1e-6);
        assert_eq!(params.discount_factors(9).1, 1.0);
    }

    #[test]
    fn test_discounted_exponents() {
        let params = DiscountParams::discounted(1.5, 0.5, 2.0);
        let (pos, neg, sum) = params.discount_factors(4);

        // 4^1.5 = 8, 4^0.5 = 2, (4/5)^2 = 0.64
        assert_abs_diff_eq!(pos, 8.0 / 9.0, epsilon = 1e-6);
        assert_abs_diff_eq!(neg, 2.0 / 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(sum, 0.64, epsilon = 1e-6);
    }

    #[test]
    fn test_regret_matching_plus_overrides_beta() {
        let params = DiscountParams {
            use_regret_matching_plus: true,
            beta: 0.5,
            ..Default::default()
        };
        assert_eq!(params.discount_factors(10).1, 0.0);
    }
}

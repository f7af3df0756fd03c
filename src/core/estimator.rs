use crate::core::offer::OfferPolicy;
use crate::domain::model::{
    ActivitySignals, CartSnapshot, NormalizedFactors, RiskAssessment, RiskFactors, RiskLevel,
};
use crate::domain::ports::NoiseSource;
use crate::utils::error::{Result, RiskError};
use crate::utils::validation::{validate_positive, validate_range, Validate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_NOISE_AMPLITUDE: f64 = 5.0;
pub const MAX_NOISE_AMPLITUDE: f64 = 50.0;

// Shifts the weighted sum so a neutral cart lands near the middle of the scale.
const SCORE_OFFSET: f64 = 0.5;

/// Value at which each feature saturates to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureCaps {
    pub time_in_cart_secs: f64,
    pub cart_value: f64,
    pub item_count: f64,
    pub category_diversity: f64,
    pub mouse_movements: f64,
    pub scroll_speed: f64,
    pub idle_time_secs: f64,
}

impl Default for FeatureCaps {
    fn default() -> Self {
        Self {
            time_in_cart_secs: 600.0,
            cart_value: 500.0,
            item_count: 10.0,
            category_diversity: 5.0,
            mouse_movements: 100.0,
            scroll_speed: 50.0,
            idle_time_secs: 300.0,
        }
    }
}

impl Validate for FeatureCaps {
    fn validate(&self) -> Result<()> {
        validate_positive("normalization.time_in_cart_secs", self.time_in_cart_secs)?;
        validate_positive("normalization.cart_value", self.cart_value)?;
        validate_positive("normalization.item_count", self.item_count)?;
        validate_positive("normalization.category_diversity", self.category_diversity)?;
        validate_positive("normalization.mouse_movements", self.mouse_movements)?;
        validate_positive("normalization.scroll_speed", self.scroll_speed)?;
        validate_positive("normalization.idle_time_secs", self.idle_time_secs)?;
        Ok(())
    }
}

/// Linear weights. Positive weights raise risk, negative weights lower it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureWeights {
    pub time_in_cart: f64,
    pub cart_value: f64,
    pub item_count: f64,
    pub category_diversity: f64,
    pub mouse_movements: f64,
    pub scroll_speed: f64,
    pub idle_time: f64,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self {
            time_in_cart: 0.30,
            cart_value: -0.20,
            item_count: -0.15,
            category_diversity: -0.10,
            mouse_movements: -0.10,
            scroll_speed: -0.10,
            idle_time: 0.25,
        }
    }
}

impl Validate for FeatureWeights {
    fn validate(&self) -> Result<()> {
        let weights = [
            ("weights.time_in_cart", self.time_in_cart),
            ("weights.cart_value", self.cart_value),
            ("weights.item_count", self.item_count),
            ("weights.category_diversity", self.category_diversity),
            ("weights.mouse_movements", self.mouse_movements),
            ("weights.scroll_speed", self.scroll_speed),
            ("weights.idle_time", self.idle_time),
        ];
        for (field, weight) in weights {
            if !weight.is_finite() {
                return Err(RiskError::InvalidConfigValueError {
                    field: field.to_string(),
                    value: weight.to_string(),
                    reason: "Weight must be a finite number".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Scales `value` by `cap` into [0, 1].
pub fn normalize_feature(value: f64, cap: f64) -> f64 {
    if cap.is_nan() || cap <= 0.0 || value.is_nan() {
        return 0.0;
    }
    (value / cap).clamp(0.0, 1.0)
}

/// Adds the noise term to `base` and rounds onto the 0..=100 scale.
pub fn finalize_score(base: f64, noise: f64) -> u8 {
    let noisy = base + noise;
    if noisy.is_nan() {
        return base.clamp(0.0, 100.0).round() as u8;
    }
    noisy.clamp(0.0, 100.0).round() as u8
}

/// Heuristic cart abandonment scorer.
///
/// Every call recomputes from the inputs alone; the estimator keeps no state
/// between evaluations.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskEstimator {
    caps: FeatureCaps,
    weights: FeatureWeights,
    noise_amplitude: f64,
    offers: OfferPolicy,
}

impl Default for RiskEstimator {
    fn default() -> Self {
        Self::new(
            FeatureCaps::default(),
            FeatureWeights::default(),
            DEFAULT_NOISE_AMPLITUDE,
            OfferPolicy::default(),
        )
    }
}

impl RiskEstimator {
    pub fn new(
        caps: FeatureCaps,
        weights: FeatureWeights,
        noise_amplitude: f64,
        offers: OfferPolicy,
    ) -> Self {
        Self {
            caps,
            weights,
            noise_amplitude,
            offers,
        }
    }

    pub fn caps(&self) -> &FeatureCaps {
        &self.caps
    }

    pub fn weights(&self) -> &FeatureWeights {
        &self.weights
    }

    pub fn noise_amplitude(&self) -> f64 {
        self.noise_amplitude
    }

    pub fn offers(&self) -> &OfferPolicy {
        &self.offers
    }

    /// Raw features at `now`, or `None` for an empty cart.
    pub fn extract_factors(
        &self,
        cart: &CartSnapshot,
        signals: &ActivitySignals,
        now: DateTime<Utc>,
    ) -> Option<RiskFactors> {
        let earliest = cart.earliest_added_at()?;
        let time_in_cart_secs = (now - earliest).num_milliseconds() as f64 / 1000.0;

        Some(RiskFactors {
            time_in_cart_secs,
            cart_value: cart.total_value(),
            item_count: cart.item_count(),
            category_diversity: cart.category_count(),
            mouse_movements: signals.mouse_movements,
            scroll_speed: signals.scroll_events,
            idle_time_secs: signals.idle_seconds,
        })
    }

    pub fn normalize(&self, factors: &RiskFactors) -> NormalizedFactors {
        let caps = &self.caps;
        NormalizedFactors {
            time_in_cart: normalize_feature(factors.time_in_cart_secs, caps.time_in_cart_secs),
            cart_value: normalize_feature(factors.cart_value, caps.cart_value),
            item_count: normalize_feature(factors.item_count as f64, caps.item_count),
            category_diversity: normalize_feature(
                factors.category_diversity as f64,
                caps.category_diversity,
            ),
            mouse_movements: normalize_feature(factors.mouse_movements as f64, caps.mouse_movements),
            scroll_speed: normalize_feature(factors.scroll_speed as f64, caps.scroll_speed),
            idle_time: normalize_feature(factors.idle_time_secs, caps.idle_time_secs),
        }
    }

    /// Weighted sum of the normalized features.
    pub fn raw_score(&self, normalized: &NormalizedFactors) -> f64 {
        let w = &self.weights;
        w.time_in_cart * normalized.time_in_cart
            + w.cart_value * normalized.cart_value
            + w.item_count * normalized.item_count
            + w.category_diversity * normalized.category_diversity
            + w.mouse_movements * normalized.mouse_movements
            + w.scroll_speed * normalized.scroll_speed
            + w.idle_time * normalized.idle_time
    }

    /// Pre-noise score on the 0..=100 scale.
    pub fn base_score(&self, normalized: &NormalizedFactors) -> f64 {
        ((self.raw_score(normalized) + SCORE_OFFSET) * 100.0).clamp(0.0, 100.0)
    }

    pub fn assess<N: NoiseSource + ?Sized>(
        &self,
        cart: &CartSnapshot,
        signals: &ActivitySignals,
        now: DateTime<Utc>,
        noise: &mut N,
    ) -> Option<RiskAssessment> {
        let Some(factors) = self.extract_factors(cart, signals, now) else {
            tracing::debug!("Cart is empty, skipping risk assessment");
            return None;
        };

        let normalized = self.normalize(&factors);
        let base_score = self.base_score(&normalized);
        let score = finalize_score(base_score, noise.sample(self.noise_amplitude));
        let recommendation = self.offers.select(score);

        tracing::debug!(
            score,
            base_score,
            offer = %recommendation.kind,
            lines = cart.len(),
            "Scored cart abandonment risk"
        );

        Some(RiskAssessment {
            score,
            base_score,
            level: RiskLevel::from_score(score),
            factors,
            normalized,
            recommendation,
            assessed_at: now,
        })
    }
}

impl Validate for RiskEstimator {
    fn validate(&self) -> Result<()> {
        self.caps.validate()?;
        self.weights.validate()?;
        validate_range("noise.amplitude", self.noise_amplitude, 0.0, MAX_NOISE_AMPLITUDE)?;
        self.offers.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::noise::{FixedNoise, NoNoise};
    use crate::domain::model::{CartLine, OfferKind};
    use approx::assert_abs_diff_eq;
    use chrono::Duration;

    fn single_line_cart(now: DateTime<Utc>, price: f64, quantity: u32, age_secs: i64) -> CartSnapshot {
        CartSnapshot::new(vec![CartLine {
            id: "1".to_string(),
            name: "Wireless Bluetooth Headphones".to_string(),
            unit_price: price,
            quantity,
            category: "Electronics".to_string(),
            rating: 4.5,
            added_at: now - Duration::seconds(age_secs),
        }])
    }

    #[test]
    fn test_normalize_feature_clamps() {
        assert_eq!(normalize_feature(700.0, 600.0), 1.0);
        assert_eq!(normalize_feature(300.0, 600.0), 0.5);
        assert_eq!(normalize_feature(-10.0, 600.0), 0.0);
        assert_eq!(normalize_feature(10.0, 0.0), 0.0);
    }

    #[test]
    fn test_finalize_score_clamps_and_rounds() {
        assert_eq!(finalize_score(72.5, 0.0), 73);
        assert_eq!(finalize_score(98.0, 5.0), 100);
        assert_eq!(finalize_score(2.0, -5.0), 0);
        assert_eq!(finalize_score(50.4, 0.0), 50);
    }

    #[test]
    fn test_empty_cart_has_no_assessment() {
        let estimator = RiskEstimator::default();
        let result = estimator.assess(
            &CartSnapshot::default(),
            &ActivitySignals::default(),
            Utc::now(),
            &mut NoNoise,
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_reference_cart_base_score() {
        let now = Utc::now();
        let estimator = RiskEstimator::default();
        let cart = single_line_cart(now, 100.0, 1, 700);

        let assessment = estimator
            .assess(&cart, &ActivitySignals::default(), now, &mut NoNoise)
            .unwrap();

        assert_abs_diff_eq!(assessment.normalized.time_in_cart, 1.0);
        assert_abs_diff_eq!(assessment.normalized.cart_value, 0.2);
        assert_abs_diff_eq!(assessment.normalized.item_count, 0.1);
        assert_abs_diff_eq!(assessment.normalized.category_diversity, 0.2);
        assert_abs_diff_eq!(assessment.base_score, 72.5, epsilon = 1e-9);
        assert_eq!(assessment.level, RiskLevel::High);
        assert_eq!(assessment.recommendation.kind, OfferKind::Shipping);
        assert_eq!(assessment.assessed_at, now);
    }

    #[test]
    fn test_noise_shifts_score_only() {
        let now = Utc::now();
        let estimator = RiskEstimator::default();
        let cart = single_line_cart(now, 100.0, 1, 700);
        let signals = ActivitySignals::default();

        let up = estimator.assess(&cart, &signals, now, &mut FixedNoise(2.2)).unwrap();
        let down = estimator.assess(&cart, &signals, now, &mut FixedNoise(-2.2)).unwrap();

        assert_eq!(up.base_score, down.base_score);
        assert_eq!(up.score, 75);
        assert_eq!(down.score, 70);
        assert_eq!(up.level, RiskLevel::High);
        assert_eq!(down.level, RiskLevel::Medium);
    }

    #[test]
    fn test_activity_lowers_risk() {
        let now = Utc::now();
        let estimator = RiskEstimator::default();
        let cart = single_line_cart(now, 100.0, 1, 700);

        let quiet = estimator
            .assess(&cart, &ActivitySignals::default(), now, &mut NoNoise)
            .unwrap();
        let busy = estimator
            .assess(
                &cart,
                &ActivitySignals {
                    mouse_movements: 250,
                    scroll_events: 80,
                    idle_seconds: 0.0,
                },
                now,
                &mut NoNoise,
            )
            .unwrap();

        assert_abs_diff_eq!(quiet.base_score - busy.base_score, 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_future_timestamp_counts_as_fresh() {
        let now = Utc::now();
        let estimator = RiskEstimator::default();
        let cart = single_line_cart(now, 100.0, 1, -60);

        let factors = estimator
            .extract_factors(&cart, &ActivitySignals::default(), now)
            .unwrap();
        assert!(factors.time_in_cart_secs < 0.0);
        assert_eq!(estimator.normalize(&factors).time_in_cart, 0.0);
    }

    #[test]
    fn test_default_estimator_is_valid() {
        assert!(RiskEstimator::default().validate().is_ok());

        let noisy = RiskEstimator::new(
            FeatureCaps::default(),
            FeatureWeights::default(),
            75.0,
            OfferPolicy::default(),
        );
        assert!(noisy.validate().is_err());

        let nan_noise = RiskEstimator::new(
            FeatureCaps::default(),
            FeatureWeights::default(),
            f64::NAN,
            OfferPolicy::default(),
        );
        assert!(nan_noise.validate().is_err());

        let broken_caps = FeatureCaps {
            cart_value: 0.0,
            ..FeatureCaps::default()
        };
        assert!(broken_caps.validate().is_err());
    }
}

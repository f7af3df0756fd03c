use crate::core::estimator::{FeatureCaps, FeatureWeights, RiskEstimator, DEFAULT_NOISE_AMPLITUDE};
use crate::core::gate::{RetentionGate, RetentionPolicy};
use crate::core::monitor::DEFAULT_POLL_INTERVAL;
use crate::core::offer::OfferPolicy;
use crate::utils::error::{Result, RiskError};
use crate::utils::validation::{validate_positive_number, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tuning constants for scoring, offers, prompting and polling.
/// Every section and key is optional and falls back to the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub normalization: FeatureCaps,
    pub weights: FeatureWeights,
    pub noise: NoiseConfig,
    pub offers: OfferPolicy,
    pub retention: RetentionPolicy,
    pub monitor: MonitorConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Half-width of the uniform noise band, in score points.
    pub amplitude: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            amplitude: DEFAULT_NOISE_AMPLITUDE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
        }
    }
}

impl RiskConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RiskError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RiskError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${RISK_NOISE})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RiskError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        self.estimator().validate()?;
        self.retention.validate()?;
        validate_positive_number("monitor.interval_secs", self.monitor.interval_secs, 1)?;
        Ok(())
    }

    pub fn estimator(&self) -> RiskEstimator {
        RiskEstimator::new(
            self.normalization,
            self.weights,
            self.noise.amplitude,
            self.offers.clone(),
        )
    }

    pub fn gate(&self) -> RetentionGate {
        RetentionGate::new(self.retention)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.monitor.interval_secs)
    }
}

impl Validate for RiskConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

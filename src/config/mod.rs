pub mod toml_config;

pub use toml_config::RiskConfig;

#[cfg(feature = "cli")]
use crate::domain::model::ActivitySignals;
#[cfg(feature = "cli")]
use crate::utils::error::{Result, RiskError};
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_positive_number, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "cart-risk")]
#[command(about = "Score shopping-cart abandonment risk and pick a retention offer")]
pub struct CliConfig {
    /// JSON cart snapshot (array of lines)
    #[arg(long)]
    pub cart: PathBuf,

    /// TOML file with scoring and offer settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, default_value = "0")]
    pub mouse_movements: u64,

    #[arg(long, default_value = "0")]
    pub scroll_events: u64,

    #[arg(long, default_value = "0")]
    pub idle_seconds: f64,

    /// Seed the noise generator for reproducible scores
    #[arg(long)]
    pub seed: Option<u64>,

    /// Disable the noise term entirely
    #[arg(long)]
    pub no_noise: bool,

    /// Keep re-scoring on the monitor interval
    #[arg(long)]
    pub watch: bool,

    /// Stop watching after this many evaluations
    #[arg(long)]
    pub ticks: Option<u64>,

    /// Override monitor.interval_secs from the config file
    #[arg(long)]
    pub interval_secs: Option<u64>,

    /// Print assessments as JSON
    #[arg(long)]
    pub json: bool,

    /// Emit logs as JSON lines instead of compact text
    #[arg(long)]
    pub log_json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn activity_signals(&self) -> ActivitySignals {
        ActivitySignals {
            mouse_movements: self.mouse_movements,
            scroll_events: self.scroll_events,
            idle_seconds: self.idle_seconds,
        }
    }

    /// Loads the config file (or defaults), applies command-line overrides and validates.
    pub fn load_risk_config(&self) -> Result<RiskConfig> {
        let mut config = match &self.config {
            Some(path) => RiskConfig::from_file(path)?,
            None => RiskConfig::default(),
        };

        if let Some(interval) = self.interval_secs {
            config.monitor.interval_secs = interval;
            tracing::info!("Monitor interval overridden to {}s", interval);
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if !self.idle_seconds.is_finite() || self.idle_seconds < 0.0 {
            return Err(RiskError::InvalidConfigValueError {
                field: "idle_seconds".to_string(),
                value: self.idle_seconds.to_string(),
                reason: "Idle time must be a non-negative number of seconds".to_string(),
            });
        }
        if let Some(ticks) = self.ticks {
            validate_positive_number("ticks", ticks, 1)?;
        }
        if let Some(interval) = self.interval_secs {
            validate_positive_number("interval_secs", interval, 1)?;
        }
        Ok(())
    }
}

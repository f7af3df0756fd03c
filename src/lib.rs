pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::RiskConfig;

pub use crate::core::{
    activity::ActivityTracker,
    cart::{Cart, CheckoutSummary, NewCartItem},
    estimator::RiskEstimator,
    gate::{GateDecision, RetentionGate, RetentionPolicy},
    monitor::{MonitorTick, RiskMonitor, TickTrigger},
    noise::{FixedNoise, NoNoise, UniformNoise},
    offer::{select_offer, OfferPolicy},
};
pub use domain::model::{
    ActivitySignals, CartLine, CartSnapshot, OfferDescriptor, OfferKind, RiskAssessment,
    RiskLevel,
};
pub use domain::ports::{CartSource, NoiseSource, SignalSource};
pub use utils::error::{Result, RiskError};

pub mod activity;
pub mod cart;
pub mod estimator;
pub mod gate;
pub mod monitor;
pub mod noise;
pub mod offer;

pub use crate::domain::model::{ActivitySignals, CartLine, CartSnapshot, RiskAssessment};
pub use crate::domain::ports::{CartSource, NoiseSource, SignalSource};
pub use crate::utils::error::Result;

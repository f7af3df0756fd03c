use crate::utils::error::{Result, RiskError};
use crate::utils::validation::Validate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One product line in the shopper's cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: String,
    pub name: String,
    #[serde(rename = "price")]
    pub unit_price: f64,
    pub quantity: u32,
    pub category: String,
    #[serde(default)]
    pub rating: f32,
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    pub fn line_total(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

/// Read-only view of the cart at one instant. Serialized as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartSnapshot {
    lines: Vec<CartLine>,
}

impl CartSnapshot {
    pub fn new(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn earliest_added_at(&self) -> Option<DateTime<Utc>> {
        self.lines.iter().map(|line| line.added_at).min()
    }

    pub fn total_value(&self) -> f64 {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    pub fn category_count(&self) -> usize {
        self.lines
            .iter()
            .map(|line| line.category.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Parses and validates a snapshot from JSON text.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let snapshot: CartSnapshot = serde_json::from_str(content)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_json_str(&content)
    }
}

impl Validate for CartSnapshot {
    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.lines.len());
        for line in &self.lines {
            if line.id.trim().is_empty() {
                return Err(RiskError::InvalidCartError {
                    message: format!("line '{}' has an empty id", line.name),
                });
            }
            if !seen.insert(line.id.as_str()) {
                return Err(RiskError::InvalidCartError {
                    message: format!("duplicate line id '{}'", line.id),
                });
            }
            if !line.unit_price.is_finite() || line.unit_price < 0.0 {
                return Err(RiskError::InvalidCartError {
                    message: format!("line '{}' has invalid price {}", line.id, line.unit_price),
                });
            }
            if line.quantity == 0 {
                return Err(RiskError::InvalidCartError {
                    message: format!("line '{}' has quantity 0", line.id),
                });
            }
        }
        Ok(())
    }
}

/// Pointer, scroll and idle readings taken from the shopper's session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySignals {
    pub mouse_movements: u64,
    pub scroll_events: u64,
    pub idle_seconds: f64,
}

/// Raw features extracted from the cart and activity signals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactors {
    pub time_in_cart_secs: f64,
    pub cart_value: f64,
    pub item_count: u64,
    pub category_diversity: usize,
    pub mouse_movements: u64,
    pub scroll_speed: u64,
    pub idle_time_secs: f64,
}

/// Features scaled into [0, 1] by their caps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedFactors {
    pub time_in_cart: f64,
    pub cart_value: f64,
    pub item_count: f64,
    pub category_diversity: f64,
    pub mouse_movements: f64,
    pub scroll_speed: f64,
    pub idle_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferKind {
    Discount,
    Loyalty,
    Shipping,
}

impl std::fmt::Display for OfferKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OfferKind::Discount => "discount",
            OfferKind::Loyalty => "loyalty",
            OfferKind::Shipping => "shipping",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferDescriptor {
    pub kind: OfferKind,
    pub display_value: String,
    pub description: String,
}

/// Display band of a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const HIGH_ABOVE: u8 = 70;
    pub const MEDIUM_ABOVE: u8 = 40;

    pub fn from_score(score: u8) -> Self {
        if score > Self::HIGH_ABOVE {
            RiskLevel::High
        } else if score > Self::MEDIUM_ABOVE {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low Risk",
            RiskLevel::Medium => "Medium Risk",
            RiskLevel::High => "High Risk",
        }
    }
}

/// Result of one scoring pass. Replaced wholesale on every evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub score: u8,
    /// Score before noise, in [0, 100].
    pub base_score: f64,
    pub level: RiskLevel,
    pub factors: RiskFactors,
    pub normalized: NormalizedFactors,
    pub recommendation: OfferDescriptor,
    pub assessed_at: DateTime<Utc>,
}

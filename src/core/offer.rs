use crate::domain::model::{OfferDescriptor, OfferKind};
use crate::utils::error::{Result, RiskError};
use crate::utils::validation::{validate_non_empty_string, validate_range, Validate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferCopy {
    pub value: String,
    pub description: String,
}

impl OfferCopy {
    fn new(value: &str, description: &str) -> Self {
        Self {
            value: value.to_string(),
            description: description.to_string(),
        }
    }
}

/// Maps a score onto a retention offer. Thresholds are exclusive lower bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferPolicy {
    pub discount_above: u8,
    pub shipping_above: u8,
    pub discount: OfferCopy,
    pub shipping: OfferCopy,
    pub loyalty: OfferCopy,
}

impl Default for OfferPolicy {
    fn default() -> Self {
        Self {
            discount_above: 80,
            shipping_above: 60,
            discount: OfferCopy::new(
                "20% OFF",
                "Save 20% on your entire order - limited time offer!",
            ),
            shipping: OfferCopy::new(
                "FREE SHIPPING",
                "Complete your order now and get free shipping!",
            ),
            loyalty: OfferCopy::new("2X POINTS", "Earn double loyalty points on this purchase!"),
        }
    }
}

impl OfferPolicy {
    pub fn kind_for(&self, score: u8) -> OfferKind {
        if score > self.discount_above {
            OfferKind::Discount
        } else if score > self.shipping_above {
            OfferKind::Shipping
        } else {
            OfferKind::Loyalty
        }
    }

    pub fn select(&self, score: u8) -> OfferDescriptor {
        let kind = self.kind_for(score);
        let copy = match kind {
            OfferKind::Discount => &self.discount,
            OfferKind::Shipping => &self.shipping,
            OfferKind::Loyalty => &self.loyalty,
        };

        OfferDescriptor {
            kind,
            display_value: copy.value.clone(),
            description: copy.description.clone(),
        }
    }
}

impl Validate for OfferPolicy {
    fn validate(&self) -> Result<()> {
        validate_range("offers.discount_above", self.discount_above, 0, 100)?;
        validate_range("offers.shipping_above", self.shipping_above, 0, 100)?;

        if self.shipping_above > self.discount_above {
            return Err(RiskError::InvalidConfigValueError {
                field: "offers.shipping_above".to_string(),
                value: self.shipping_above.to_string(),
                reason: format!(
                    "Must not exceed offers.discount_above ({})",
                    self.discount_above
                ),
            });
        }

        for (field, copy) in [
            ("offers.discount", &self.discount),
            ("offers.shipping", &self.shipping),
            ("offers.loyalty", &self.loyalty),
        ] {
            validate_non_empty_string(&format!("{}.value", field), &copy.value)?;
            validate_non_empty_string(&format!("{}.description", field), &copy.description)?;
        }

        Ok(())
    }
}

/// Offer for `score` under the default thresholds and copy.
pub fn select_offer(score: u8) -> OfferDescriptor {
    OfferPolicy::default().select(score)
}

use crate::domain::model::{OfferDescriptor, RiskAssessment};
use crate::utils::error::Result;
use crate::utils::validation::{validate_range, Validate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// When a retention prompt may be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPolicy {
    /// Prompt only when the score is strictly above this value.
    pub prompt_above: u8,
    /// How long the score must stay above the threshold before the prompt fires.
    pub prompt_delay_ms: u64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            prompt_above: 70,
            prompt_delay_ms: 2_000,
        }
    }
}

impl RetentionPolicy {
    pub fn prompt_delay(&self) -> Duration {
        Duration::from_millis(self.prompt_delay_ms)
    }
}

impl Validate for RetentionPolicy {
    fn validate(&self) -> Result<()> {
        validate_range("retention.prompt_above", self.prompt_above, 0, 100)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    /// Nothing to show: no assessment, or the score is at or below the threshold.
    Idle,
    /// Score is above the threshold; the prompt fires once `remaining` has passed.
    Pending { remaining: Duration },
    /// Show this offer now.
    Show(OfferDescriptor),
    /// The session already saw its prompt.
    AlreadyShown,
}

/// Once-per-session gate in front of the retention prompt.
#[derive(Debug, Clone)]
pub struct RetentionGate {
    policy: RetentionPolicy,
    armed_at: Option<DateTime<Utc>>,
    shown: bool,
}

impl RetentionGate {
    pub fn new(policy: RetentionPolicy) -> Self {
        Self {
            policy,
            armed_at: None,
            shown: false,
        }
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    pub fn has_shown(&self) -> bool {
        self.shown
    }

    pub fn is_pending(&self) -> bool {
        self.armed_at.is_some()
    }

    /// Feeds the latest assessment (or `None` for an empty cart) into the gate.
    pub fn observe(&mut self, assessment: Option<&RiskAssessment>, now: DateTime<Utc>) -> GateDecision {
        if self.shown {
            return GateDecision::AlreadyShown;
        }

        let Some(assessment) = assessment.filter(|a| a.score > self.policy.prompt_above) else {
            if self.armed_at.take().is_some() {
                tracing::debug!("Risk fell back under the prompt threshold, prompt cancelled");
            }
            return GateDecision::Idle;
        };

        let armed_at = *self.armed_at.get_or_insert(now);
        let elapsed = (now - armed_at).to_std().unwrap_or_default();
        let delay = self.policy.prompt_delay();

        if elapsed >= delay {
            self.shown = true;
            self.armed_at = None;
            tracing::info!(
                score = assessment.score,
                offer = %assessment.recommendation.kind,
                "Showing retention offer"
            );
            return GateDecision::Show(assessment.recommendation.clone());
        }

        GateDecision::Pending {
            remaining: delay - elapsed,
        }
    }

    /// Starts a new session: the prompt may be shown again.
    pub fn reset_session(&mut self) {
        self.armed_at = None;
        self.shown = false;
    }
}

impl Default for RetentionGate {
    fn default() -> Self {
        Self::new(RetentionPolicy::default())
    }
}

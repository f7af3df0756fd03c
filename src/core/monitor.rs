use crate::core::estimator::RiskEstimator;
use crate::core::gate::{GateDecision, RetentionGate};
use crate::domain::model::RiskAssessment;
use crate::domain::ports::{CartSource, NoiseSource, SignalSource};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{Instant, MissedTickBehavior};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickTrigger {
    Interval,
    CartChanged,
    PromptDue,
}

/// Outcome of one monitor evaluation.
#[derive(Debug, Clone)]
pub struct MonitorTick {
    pub sequence: u64,
    pub trigger: TickTrigger,
    pub assessment: Option<RiskAssessment>,
    pub decision: GateDecision,
}

/// Re-scores the cart on a fixed interval and whenever the cart changes,
/// and runs each result through the retention gate.
pub struct RiskMonitor<C: CartSource, S: SignalSource> {
    estimator: RiskEstimator,
    gate: RetentionGate,
    cart: C,
    signals: S,
    interval: Duration,
    cart_changed: Arc<Notify>,
    latest: Option<RiskAssessment>,
    sequence: u64,
}

impl<C: CartSource, S: SignalSource> RiskMonitor<C, S> {
    pub fn new(
        estimator: RiskEstimator,
        gate: RetentionGate,
        cart: C,
        signals: S,
        interval: Duration,
    ) -> Self {
        Self {
            estimator,
            gate,
            cart,
            signals,
            interval,
            cart_changed: Arc::new(Notify::new()),
            latest: None,
            sequence: 0,
        }
    }

    /// Handle for the cart owner; `notify_one()` triggers an immediate re-score.
    pub fn cart_changed_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.cart_changed)
    }

    pub fn latest(&self) -> Option<&RiskAssessment> {
        self.latest.as_ref()
    }

    pub fn gate(&self) -> &RetentionGate {
        &self.gate
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Scores the current cart and signals and feeds the gate.
    pub fn evaluate<N: NoiseSource + ?Sized>(
        &mut self,
        now: DateTime<Utc>,
        noise: &mut N,
        trigger: TickTrigger,
    ) -> MonitorTick {
        let cart = self.cart.cart_snapshot();
        let signals = self.signals.activity_signals();
        let assessment = self.estimator.assess(&cart, &signals, now, noise);

        match &assessment {
            Some(a) => tracing::info!(
                score = a.score,
                level = a.level.label(),
                offer = %a.recommendation.kind,
                "Abandonment risk updated"
            ),
            None => tracing::debug!("No assessment for empty cart"),
        }

        let decision = self.gate.observe(assessment.as_ref(), now);
        self.latest = assessment.clone();
        self.next_tick(trigger, assessment, decision)
    }

    /// Re-checks a pending prompt against the latest assessment without re-scoring.
    pub fn recheck_prompt(&mut self, now: DateTime<Utc>) -> MonitorTick {
        let decision = self.gate.observe(self.latest.as_ref(), now);
        let assessment = self.latest.clone();
        self.next_tick(TickTrigger::PromptDue, assessment, decision)
    }

    /// Evaluates immediately, then on every interval and on cart-change
    /// notifications. A pending prompt is rechecked when it comes due.
    /// Stops after `max_ticks` evaluations if given and returns how many ran.
    /// Prompt rechecks reach `on_tick` but do not count as evaluations.
    pub async fn run<N, F>(&mut self, noise: &mut N, max_ticks: Option<u64>, mut on_tick: F) -> u64
    where
        N: NoiseSource + ?Sized,
        F: FnMut(&MonitorTick),
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let cart_changed = Arc::clone(&self.cart_changed);
        let mut prompt_due: Option<Instant> = None;
        let mut count = 0_u64;

        tracing::info!(interval = ?self.interval, "Risk monitor started");

        while max_ticks.map_or(true, |max| count < max) {
            let trigger = tokio::select! {
                _ = ticker.tick() => TickTrigger::Interval,
                _ = cart_changed.notified() => TickTrigger::CartChanged,
                _ = wait_until(prompt_due) => TickTrigger::PromptDue,
            };

            let tick = match trigger {
                TickTrigger::PromptDue => self.recheck_prompt(Utc::now()),
                _ => self.evaluate(Utc::now(), noise, trigger),
            };

            prompt_due = match tick.decision {
                GateDecision::Pending { remaining } => Some(Instant::now() + remaining),
                _ => None,
            };

            on_tick(&tick);
            if trigger != TickTrigger::PromptDue {
                count += 1;
            }
        }

        tracing::info!(evaluations = count, "Risk monitor stopped");
        count
    }

    fn next_tick(
        &mut self,
        trigger: TickTrigger,
        assessment: Option<RiskAssessment>,
        decision: GateDecision,
    ) -> MonitorTick {
        self.sequence += 1;
        MonitorTick {
            sequence: self.sequence,
            trigger,
            assessment,
            decision,
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

use crate::domain::model::ActivitySignals;
use crate::domain::ports::SignalSource;
use chrono::{DateTime, Utc};

/// Pointer, scroll and idle counters for one shopping session.
///
/// Input handlers call the `record_*` methods; a periodic timer calls
/// [`ActivityTracker::refresh_idle`]. The estimator reads [`ActivityTracker::signals`].
#[derive(Debug, Clone)]
pub struct ActivityTracker {
    mouse_movements: u64,
    scroll_events: u64,
    idle_seconds: f64,
    last_activity: DateTime<Utc>,
}

impl ActivityTracker {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            mouse_movements: 0,
            scroll_events: 0,
            idle_seconds: 0.0,
            last_activity: now,
        }
    }

    pub fn record_pointer_move(&mut self, now: DateTime<Utc>) {
        self.mouse_movements = self.mouse_movements.saturating_add(1);
        self.mark_active(now);
    }

    pub fn record_scroll(&mut self, now: DateTime<Utc>) {
        self.scroll_events = self.scroll_events.saturating_add(1);
        self.mark_active(now);
    }

    /// Recomputes idle time as seconds since the last tracked event.
    pub fn refresh_idle(&mut self, now: DateTime<Utc>) {
        let elapsed = (now - self.last_activity).num_milliseconds() as f64 / 1000.0;
        self.idle_seconds = elapsed.max(0.0);
    }

    pub fn reset(&mut self, now: DateTime<Utc>) {
        *self = Self::new(now);
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn signals(&self) -> ActivitySignals {
        ActivitySignals {
            mouse_movements: self.mouse_movements,
            scroll_events: self.scroll_events,
            idle_seconds: self.idle_seconds,
        }
    }

    fn mark_active(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
        self.idle_seconds = 0.0;
    }
}

impl SignalSource for ActivityTracker {
    fn activity_signals(&self) -> ActivitySignals {
        self.signals()
    }
}

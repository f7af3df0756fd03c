use crate::domain::model::{ActivitySignals, CartSnapshot};
use std::sync::{Arc, RwLock};

/// Anything the monitor can read a cart snapshot from.
pub trait CartSource: Send + Sync {
    fn cart_snapshot(&self) -> CartSnapshot;
}

/// Anything the monitor can read activity counters from.
pub trait SignalSource: Send + Sync {
    fn activity_signals(&self) -> ActivitySignals;
}

/// Draws the score noise term, in points, from [-amplitude, amplitude].
pub trait NoiseSource: Send {
    fn sample(&mut self, amplitude: f64) -> f64;
}

impl CartSource for CartSnapshot {
    fn cart_snapshot(&self) -> CartSnapshot {
        self.clone()
    }
}

impl SignalSource for ActivitySignals {
    fn activity_signals(&self) -> ActivitySignals {
        *self
    }
}

// A poisoned lock still holds the last written state, which is good enough to score.
impl<T: CartSource> CartSource for Arc<RwLock<T>> {
    fn cart_snapshot(&self) -> CartSnapshot {
        match self.read() {
            Ok(guard) => guard.cart_snapshot(),
            Err(poisoned) => poisoned.into_inner().cart_snapshot(),
        }
    }
}

impl<T: SignalSource> SignalSource for Arc<RwLock<T>> {
    fn activity_signals(&self) -> ActivitySignals {
        match self.read() {
            Ok(guard) => guard.activity_signals(),
            Err(poisoned) => poisoned.into_inner().activity_signals(),
        }
    }
}

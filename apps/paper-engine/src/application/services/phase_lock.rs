//! Per-phase run locks.
//!
//! At most one run of a given phase for a given trading date may be in
//! flight. A second caller gets `None` instead of waiting.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;

use crate::domain::session::SessionPhase;

type RunKey = (SessionPhase, NaiveDate);

/// Registry of phase runs in flight.
#[derive(Debug, Clone, Default)]
pub struct PhaseLocks {
    running: Arc<Mutex<HashSet<RunKey>>>,
}

impl PhaseLocks {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `(phase, date)`. Returns `None` if another run holds it.
    #[must_use]
    pub fn try_acquire(&self, phase: SessionPhase, date: NaiveDate) -> Option<PhaseGuard> {
        let key = (phase, date);
        if self.running.lock().insert(key) {
            Some(PhaseGuard {
                running: Arc::clone(&self.running),
                key,
            })
        } else {
            None
        }
    }

    /// Returns true if `(phase, date)` is currently held.
    #[must_use]
    pub fn is_running(&self, phase: SessionPhase, date: NaiveDate) -> bool {
        self.running.lock().contains(&(phase, date))
    }
}

/// Releases its run lock when dropped.
#[derive(Debug)]
pub struct PhaseGuard {
    running: Arc<Mutex<HashSet<RunKey>>>,
    key: RunKey,
}

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        self.running.lock().remove(&self.key);
    }
}

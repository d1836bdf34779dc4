//! Counters for the outcomes that would otherwise be silent.

use crate::reconcile::Correction;
use crate::replay::{Replay, ReplayOutcome};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayStats {
    pub replays: u64,
    pub recomputed_ticks: u64,
    pub stale_events: u64,
    pub missing_anchors: u64,
}

impl ReplayStats {
    pub fn record(&mut self, replay: &Replay) {
        if let ReplayOutcome::Replayed { recomputed, .. } = replay.outcome {
            self.replays += 1;
            self.recomputed_ticks += recomputed as u64;
        }
    }

    /// Counts newly arrived events that can never be replayed. Each event is
    /// counted once, on arrival, however long it stays tracked.
    pub fn record_arrival(&mut self, stale: usize, unanchored: usize) {
        self.stale_events += stale as u64;
        self.missing_anchors += unanchored as u64;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileStats {
    pub passes: u64,
    pub corrected: u64,
    pub skipped: u64,
    pub total_correction: f64,
}

impl ReconcileStats {
    pub fn record(&mut self, correction: &Correction) {
        self.passes += 1;
        self.corrected += correction.corrected as u64;
        self.skipped += correction.skipped as u64;
        self.total_correction += correction.magnitude;
    }
}

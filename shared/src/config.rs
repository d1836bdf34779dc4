//! Static simulation configuration.

use crate::reconcile::{SyncedField, SyncedProperty};
use crate::ActorId;

/// Retention window of histories and tracked events, in milliseconds.
pub const HISTORY_DURATION: u64 = 1000;
/// Fixed tick size in milliseconds.
pub const DT: u64 = 16;
/// Base one-way latency in milliseconds.
pub const LATENCY: u64 = 45;
/// Jitter fraction applied around `LATENCY`.
pub const LATENCY_SWAY: f64 = 0.5;
/// Fraction of the client/server gap closed per reconciliation pass.
pub const RUBBERBAND_STRENGTH: f64 = 0.01;

/// Actor driven by the local client's input.
pub const LOCAL_ACTOR: ActorId = 1;
/// Actor driven by a remote source the client never predicts.
pub const REMOTE_ACTOR: ActorId = 2;

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub history_duration: u64,
    pub dt: u64,
    pub latency: u64,
    pub latency_sway: f64,
    pub synced: Vec<SyncedProperty>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            history_duration: HISTORY_DURATION,
            dt: DT,
            latency: LATENCY,
            latency_sway: LATENCY_SWAY,
            synced: vec![SyncedProperty {
                actor: LOCAL_ACTOR,
                field: SyncedField::Position,
                strength: RUBBERBAND_STRENGTH,
            }],
        }
    }
}

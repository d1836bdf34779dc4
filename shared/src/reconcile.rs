//! Rubberband reconciliation of predicted properties toward server snapshots.
//!
//! The client compares the server's snapshot with what it believed at the
//! snapshot's time and moves its current value by a fixed fraction of that
//! gap. Repeated passes converge exponentially instead of snapping.

use crate::history::StateHistory;
use crate::{ActorId, Entity, State};
use log::debug;
use serde::{Deserialize, Serialize};

/// Property of an entity that can be reconciled.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum SyncedField {
    Position,
}

impl SyncedField {
    pub fn read(self, entity: &Entity) -> f64 {
        match self {
            SyncedField::Position => entity.position,
        }
    }

    fn nudge(self, entity: &mut Entity, delta: f64) {
        match self {
            SyncedField::Position => entity.position += delta,
        }
    }
}

/// One reconciled `(actor, field)` pair and the fraction of the gap closed
/// per pass.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SyncedProperty {
    pub actor: ActorId,
    pub field: SyncedField,
    pub strength: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Correction {
    /// Properties nudged toward the server value.
    pub corrected: usize,
    /// Properties whose actor is missing from one of the states.
    pub skipped: usize,
    /// Sum of absolute adjustments applied.
    pub magnitude: f64,
}

/// Nudges the declared properties of the latest entry in `history` toward
/// `server`.
///
/// The gap is measured against the last local snapshot older than the
/// server snapshot, falling back to the latest local entry. Entities and
/// fields that are not declared are left alone.
pub fn reconcile(history: &mut StateHistory, server: &State, synced: &[SyncedProperty]) -> Correction {
    let mut correction = Correction::default();

    let current = match history.latest() {
        Some(current) => current.clone(),
        None => {
            correction.skipped = synced.len();
            return correction;
        }
    };
    let local_snapshot = history
        .latest_before(server.time)
        .cloned()
        .unwrap_or_else(|| current.clone());

    let mut adjustments = Vec::new();
    for property in synced {
        let selected = (
            current.entity(property.actor),
            local_snapshot.entity(property.actor),
            server.entity(property.actor),
        );
        match selected {
            (Some(_), Some(local), Some(remote)) => {
                let diff = property.field.read(remote) - property.field.read(local);
                adjustments.push((property, diff * property.strength));
            }
            _ => correction.skipped += 1,
        }
    }

    if adjustments.is_empty() {
        return correction;
    }

    history.amend_latest(|state| {
        for (property, delta) in &adjustments {
            if let Some(entity) = state.entity_mut(property.actor) {
                property.field.nudge(entity, *delta);
            }
        }
    });

    correction.corrected = adjustments.len();
    correction.magnitude = adjustments.iter().map(|(_, delta)| delta.abs()).sum();

    debug!(
        "Reconciled {} properties against server snapshot at {} (local snapshot at {}, total {:.4})",
        correction.corrected, server.time, local_snapshot.time, correction.magnitude
    );

    correction
}

use serde::{Deserialize, Serialize};

pub mod channel;
pub mod config;
pub mod history;
pub mod protocol;
pub mod reconcile;
pub mod replay;
pub mod stats;
pub mod step;

pub use config::{SimConfig, DT, HISTORY_DURATION, LATENCY, LATENCY_SWAY, RUBBERBAND_STRENGTH};
pub use history::StateHistory;
pub use protocol::{Packet, ProtocolError};
pub use reconcile::{reconcile, Correction, SyncedField, SyncedProperty};
pub use replay::{replay_events, Replay, ReplayOutcome};
pub use stats::{ReconcileStats, ReplayStats};
pub use step::{fast_forward, step};

/// Milliseconds of simulated time.
pub type Timestamp = u64;

/// Identity of an input source. One entity per actor.
pub type ActorId = u32;

/// Age of `time` as seen from `now`. Timestamps in the future have age zero.
pub fn age(now: Timestamp, time: Timestamp) -> u64 {
    now.saturating_sub(time)
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    MoveLeft,
    MoveRight,
}

/// A discrete input change of one actor at a simulated timestamp.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Event {
    pub actor: ActorId,
    pub kind: InputKind,
    pub value: bool,
    pub time: Timestamp,
}

impl Event {
    pub fn new(actor: ActorId, kind: InputKind, value: bool, time: Timestamp) -> Self {
        Self {
            actor,
            kind,
            value,
            time,
        }
    }

    /// True while the event is young enough to take part in replay.
    pub fn is_current(&self, now: Timestamp, retention: u64) -> bool {
        age(now, self.time) < retention
    }
}

/// Latched input flags of one actor.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub left: bool,
    pub right: bool,
}

impl InputState {
    pub fn apply(&mut self, kind: InputKind, value: bool) {
        match kind {
            InputKind::MoveLeft => self.left = value,
            InputKind::MoveRight => self.right = value,
        }
    }

    /// Per-tick displacement direction; both flags cancel out.
    pub fn direction(&self) -> f64 {
        let mut direction = 0.0;
        if self.left {
            direction -= 1.0;
        }
        if self.right {
            direction += 1.0;
        }
        direction
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Entity {
    pub actor: ActorId,
    pub position: f64,
    pub input: InputState,
}

impl Entity {
    pub fn new(actor: ActorId, position: f64) -> Self {
        Self {
            actor,
            position,
            input: InputState::default(),
        }
    }
}

/// Simulation state at one timestamp.
///
/// Once stored in a [`StateHistory`] a state is shared behind an `Arc` and is
/// never edited again; new states are produced by [`step`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct State {
    pub time: Timestamp,
    pub entities: Vec<Entity>,
}

impl State {
    pub fn new(time: Timestamp, entities: Vec<Entity>) -> Self {
        Self { time, entities }
    }

    /// Initial state with every actor at position zero.
    pub fn with_actors(time: Timestamp, actors: &[ActorId]) -> Self {
        Self {
            time,
            entities: actors.iter().map(|&actor| Entity::new(actor, 0.0)).collect(),
        }
    }

    pub fn entity(&self, actor: ActorId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.actor == actor)
    }

    pub fn entity_mut(&mut self, actor: ActorId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.actor == actor)
    }

    pub fn position_of(&self, actor: ActorId) -> Option<f64> {
        self.entity(actor).map(|e| e.position)
    }
}

use log::debug;
use shared::step::step;
use shared::{
    reconcile, ActorId, Correction, Event, InputKind, Packet, ProtocolError, ReconcileStats,
    SimConfig, State, StateHistory, SyncedProperty, Timestamp,
};
use std::sync::Arc;

pub struct ClientGame {
    history: StateHistory,
    pending: Vec<Event>,
    synced: Vec<SyncedProperty>,
    latency: u64,
    dt: u64,
    stats: ReconcileStats,
    events_sent: u64,
}

impl ClientGame {
    /// Creates a client whose history ends at `initial.time + latency`, the
    /// synced clock of a client started at `initial.time`.
    pub fn new(mut initial: State, config: &SimConfig) -> Self {
        initial.time += config.latency;
        Self {
            history: StateHistory::seeded(initial, config.history_duration, config.dt),
            pending: Vec::new(),
            synced: config.synced.clone(),
            latency: config.latency,
            dt: config.dt,
            stats: ReconcileStats::default(),
            events_sent: 0,
        }
    }

    /// Expected arrival time at the server of anything sent at `now`.
    pub fn synced_now(&self, now: Timestamp) -> Timestamp {
        now + self.latency
    }

    /// Records an input edge, stamped with the synced clock.
    ///
    /// The event is predicted locally and sent to the server on the next tick.
    pub fn dispatch(&mut self, actor: ActorId, kind: InputKind, value: bool, now: Timestamp) -> Event {
        let event = Event::new(actor, kind, value, self.synced_now(now));
        self.pending.push(event.clone());
        event
    }

    /// Predicts one tick and returns the events to send, if any.
    pub fn tick(&mut self, now: Timestamp) -> Option<Packet> {
        let at = self.synced_now(now);
        let latest = self.history.latest()?.clone();
        if at <= latest.time {
            debug!("Client tick at {} already predicted up to {}", at, latest.time);
            return None;
        }

        let events: Vec<Event> = self.pending.drain(..).collect();
        self.history.push(step(&latest, &events, self.dt, Some(at)));
        self.history.prune(at);

        if events.is_empty() {
            return None;
        }
        self.events_sent += events.len() as u64;
        Some(Packet::Events { events })
    }

    pub fn receive(&mut self, packet: Packet) -> Result<Correction, ProtocolError> {
        let snapshot = packet.into_snapshot()?;
        Ok(self.apply_snapshot(&snapshot))
    }

    /// Rubberbands the synced properties toward an authoritative snapshot.
    pub fn apply_snapshot(&mut self, snapshot: &State) -> Correction {
        let correction = reconcile(&mut self.history, snapshot, &self.synced);
        self.stats.record(&correction);
        correction
    }

    pub fn latest(&self) -> Option<Arc<State>> {
        self.history.latest().cloned()
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    pub fn pending(&self) -> &[Event] {
        &self.pending
    }

    pub fn stats(&self) -> &ReconcileStats {
        &self.stats
    }

    pub fn events_sent(&self) -> u64 {
        self.events_sent
    }
}

use crate::event_log::EventLog;
use log::{debug, warn};
use shared::step::step;
use shared::{
    replay_events, Event, Packet, ProtocolError, ReplayOutcome, ReplayStats, SimConfig, State,
    StateHistory, Timestamp,
};
use std::sync::Arc;

pub struct ServerGame {
    history: StateHistory,
    events: EventLog,
    stats: ReplayStats,
    dt: u64,
}

impl ServerGame {
    pub fn new(initial: State, config: &SimConfig) -> Self {
        Self {
            history: StateHistory::seeded(initial, config.history_duration, config.dt),
            events: EventLog::new(config.history_duration),
            stats: ReplayStats::default(),
            dt: config.dt,
        }
    }

    /// Advances the authoritative history to `now` and returns the snapshot
    /// to publish.
    pub fn tick(&mut self, now: Timestamp) -> Option<Packet> {
        self.advance(now);
        self.history.prune(now);
        self.events.prune(now);

        self.latest().map(|state| Packet::Snapshot {
            state: State::clone(&state),
        })
    }

    /// Appends one step per tick until the history reaches `now`.
    ///
    /// The server has no local input; each step only sees the tracked remote
    /// events of its window. Ticks already produced by a replay are skipped.
    fn advance(&mut self, now: Timestamp) -> usize {
        let mut produced = 0;
        while let Some(latest) = self.history.latest().cloned() {
            if latest.time >= now || self.dt == 0 {
                break;
            }
            let window = self.events.in_window(latest.time, self.dt);
            self.history.push(step(&latest, &window, self.dt, None));
            produced += 1;
        }
        produced
    }

    pub fn receive(&mut self, packet: Packet, now: Timestamp) -> Result<ReplayOutcome, ProtocolError> {
        let events = packet.into_events()?;
        Ok(self.apply_events(events, now))
    }

    /// Tracks newly arrived events and replays the history over them.
    ///
    /// Arrivals already older than the retention window, or with no retained
    /// snapshot before them, are counted here once.
    pub fn apply_events(&mut self, events: Vec<Event>, now: Timestamp) -> ReplayOutcome {
        let retention = self.history.retention();
        let (current, stale): (Vec<Event>, Vec<Event>) = events
            .into_iter()
            .partition(|e| e.is_current(now, retention));
        let unanchored = current
            .iter()
            .filter(|e| self.history.latest_before(e.time).is_none())
            .count();
        self.stats.record_arrival(stale.len(), unanchored);

        for event in &stale {
            warn!(
                "Dropping stale event from actor {} at {} (now {})",
                event.actor, event.time, now
            );
        }
        if unanchored > 0 {
            warn!(
                "{} event(s) predate every retained snapshot (now {}), not replayed",
                unanchored, now
            );
        }

        for event in &current {
            if let Some(record) = self.events.actor(event.actor) {
                debug!(
                    "Event from actor {} at {} ({} received, last seen {})",
                    event.actor, event.time, record.received, record.last_seen
                );
            }
        }
        self.events.add(current, now);

        let replay = replay_events(&self.history, &self.events.current(now), now);
        self.stats.record(&replay);

        match replay.outcome {
            ReplayOutcome::MissingAnchor { oldest } => {
                debug!("Nothing replayable, oldest current event at {}", oldest);
            }
            ReplayOutcome::Replayed { from, recomputed } => {
                debug!("Server replayed {} ticks from {}", recomputed, from);
            }
            ReplayOutcome::NoCurrentEvents => {}
        }

        self.history = replay.history;
        self.events.prune(now);
        replay.outcome
    }

    pub fn latest(&self) -> Option<Arc<State>> {
        self.history.latest().cloned()
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn stats(&self) -> &ReplayStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::InputKind;

    fn server_at(time: Timestamp) -> ServerGame {
        ServerGame::new(State::with_actors(time, &[1, 2]), &SimConfig::default())
    }

    #[test]
    fn test_server_creation() {
        let server = server_at(5000);
        let latest = server.latest().unwrap();

        assert_eq!(latest.time, 5000);
        assert_eq!(latest.entities.len(), 2);
        assert_eq!(server.history().len(), 62);
        assert!(server.events().is_empty());
    }

    #[test]
    fn test_tick_advances_one_step() {
        let mut server = server_at(5000);

        let packet = server.tick(5016).unwrap();

        match packet {
            Packet::Snapshot { state } => assert_eq!(state.time, 5016),
            _ => panic!("Expected a snapshot"),
        }
        assert!(server.history().is_regular());
    }

    #[test]
    fn test_tick_catches_up_and_prunes() {
        let mut server = server_at(5000);

        server.tick(6600);

        let history = server.history();
        assert_eq!(history.latest().unwrap().time, 6600);
        assert!(history.is_regular());
        assert!(history.iter().all(|s| 6600 - s.time < 1000));
    }

    #[test]
    fn test_late_event_is_replayed() {
        let mut server = server_at(5000);
        for tick in 1..=10 {
            server.tick(5000 + tick * 16);
        }

        let outcome = server.apply_events(
            vec![Event::new(2, InputKind::MoveRight, true, 5040)],
            5160,
        );

        assert!(matches!(outcome, ReplayOutcome::Replayed { from: 5032, .. }));
        let latest = server.latest().unwrap();
        assert_eq!(latest.time, 5160);
        // Every window from 5032 on sees the press
        assert_eq!(latest.position_of(2), Some(8.0));
        assert_eq!(latest.position_of(1), Some(0.0));
        assert_eq!(server.stats().replays, 1);
        assert!(server.history().is_regular());
    }

    #[test]
    fn test_early_event_applies_on_its_tick() {
        let mut server = server_at(5000);

        server.apply_events(vec![Event::new(1, InputKind::MoveLeft, true, 5050)], 5010);
        for tick in 1..=5 {
            server.tick(5000 + tick * 16);
        }

        let history = server.history();
        assert_eq!(history.get(5048).unwrap().position_of(1), Some(0.0));
        assert_eq!(history.get(5064).unwrap().position_of(1), Some(-1.0));
        assert_eq!(history.get(5080).unwrap().position_of(1), Some(-2.0));
    }

    #[test]
    fn test_replay_between_ticks_keeps_regularity() {
        let mut server = server_at(5000);
        server.tick(5016);

        server.apply_events(vec![Event::new(1, InputKind::MoveRight, true, 5010)], 5021);
        server.tick(5032);
        server.tick(5048);

        let history = server.history();
        assert!(history.is_regular());
        assert_eq!(history.latest().unwrap().time, 5048);
        assert_eq!(history.latest().unwrap().position_of(1), Some(3.0));
    }

    #[test]
    fn test_stale_event_is_counted() {
        let mut server = server_at(5000);
        server.tick(6000);

        let outcome = server.apply_events(vec![Event::new(1, InputKind::MoveLeft, true, 4999)], 6000);

        assert_eq!(outcome, ReplayOutcome::NoCurrentEvents);
        assert_eq!(server.stats().stale_events, 1);
        assert!(server.events().is_empty());
        assert_eq!(server.latest().unwrap().position_of(1), Some(0.0));
    }

    #[test]
    fn test_unanchored_event_is_counted_once() {
        let mut server = server_at(5000);
        server.tick(6000);
        let first = server.history().iter().next().unwrap().time;

        let outcome =
            server.apply_events(vec![Event::new(1, InputKind::MoveLeft, true, first)], 6000);
        assert_eq!(outcome, ReplayOutcome::MissingAnchor { oldest: first });

        // Still current and still unanchored, but only counted on arrival
        server.apply_events(vec![Event::new(1, InputKind::MoveLeft, false, 5995)], 6001);

        assert_eq!(server.stats().missing_anchors, 1);
        assert_eq!(server.stats().replays, 1);
    }

    #[test]
    fn test_old_press_does_not_swallow_release() {
        let mut server = server_at(10_000);
        server.tick(10_592);
        server.apply_events(vec![Event::new(2, InputKind::MoveRight, true, 10_560)], 10_600);

        server.tick(11_552);
        // The press now sits on the oldest retained snapshot but is still current
        assert_eq!(server.history().iter().next().unwrap().time, 10_560);
        assert_eq!(server.events().len(), 1);

        let outcome = server.apply_events(
            vec![Event::new(2, InputKind::MoveRight, false, 11_540)],
            11_553,
        );
        server.tick(11_600);

        assert!(matches!(outcome, ReplayOutcome::Replayed { from: 11_536, .. }));
        assert_eq!(server.latest().unwrap().position_of(2), Some(61.0));
        assert_eq!(server.stats().missing_anchors, 0);
        assert!(server.history().is_regular());
    }

    #[test]
    fn test_actor_record_tracks_arrivals() {
        let mut server = server_at(5000);
        server.apply_events(vec![Event::new(2, InputKind::MoveRight, true, 5010)], 5020);
        server.apply_events(vec![Event::new(2, InputKind::MoveRight, false, 5030)], 5040);

        let record = server.events().actor(2).unwrap();
        assert_eq!(record.received, 2);
        assert_eq!(record.last_seen, 5040);
        assert!(server.events().actor(1).is_none());
    }

    #[test]
    fn test_receive_rejects_snapshot_packet() {
        let mut server = server_at(5000);
        let packet = Packet::Snapshot {
            state: State::with_actors(0, &[1]),
        };

        assert!(matches!(
            server.receive(packet, 5000),
            Err(ProtocolError::Unexpected("snapshot"))
        ));
    }
}

//! Replay of late-arriving events over a state history.
//!
//! When an event turns up whose time is older than the newest snapshot, every
//! snapshot from that time on was computed without it. Replay drops those
//! snapshots and recomputes them from the last snapshot that predates the
//! oldest current event, feeding each tick exactly the events of its window.
//!
//! Events older than the retention window are never replayed. An event with
//! no retained snapshot before it cannot be replayed either; its effect, if
//! any, is already baked into the retained snapshots. Such events are counted
//! but do not hold back the replay of events that still have an anchor. When
//! no current event has one, the history is left as it was and the outcome
//! reports the missing anchor.

use crate::history::StateHistory;
use crate::step::fast_forward;
use crate::{Event, State, Timestamp};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayOutcome {
    /// No tracked event is young enough to matter.
    NoCurrentEvents,
    /// No retained snapshot predates any current event.
    MissingAnchor { oldest: Timestamp },
    /// The history was rebuilt from the snapshot at `from`.
    Replayed { from: Timestamp, recomputed: usize },
}

#[derive(Debug, Clone)]
pub struct Replay {
    pub history: StateHistory,
    pub outcome: ReplayOutcome,
    /// Tracked events skipped for being older than the retention window.
    pub stale: usize,
    /// Current events with no retained snapshot before them.
    pub unanchored: usize,
}

/// Rebuilds `history` so that every snapshot reflects all current `events`.
pub fn replay_events(history: &StateHistory, events: &[Event], now: Timestamp) -> Replay {
    let retention = history.retention();
    let current: Vec<Event> = events
        .iter()
        .filter(|e| e.is_current(now, retention))
        .cloned()
        .collect();
    let stale = events.len() - current.len();

    let (anchored, unanchored): (Vec<Timestamp>, Vec<Timestamp>) = current
        .iter()
        .map(|e| e.time)
        .partition(|&time| history.latest_before(time).is_some());
    let unanchored_count = unanchored.len();

    let oldest = match anchored.iter().min() {
        Some(&oldest) => oldest,
        None => {
            let outcome = match unanchored.iter().min() {
                Some(&oldest) => ReplayOutcome::MissingAnchor { oldest },
                None => ReplayOutcome::NoCurrentEvents,
            };
            return Replay {
                history: history.clone(),
                outcome,
                stale,
                unanchored: unanchored_count,
            };
        }
    };

    let mut rebuilt = history.truncated_before(oldest);
    let start = match rebuilt.latest() {
        Some(start) => State::clone(start),
        None => {
            return Replay {
                history: history.clone(),
                outcome: ReplayOutcome::MissingAnchor { oldest },
                stale,
                unanchored: unanchored_count,
            }
        }
    };

    // Unanchored events stay in the input so one stamped exactly at the
    // anchor still lands in its window.
    let produced = fast_forward(&start, &current, now, history.dt());
    let recomputed = produced.len();
    for state in produced {
        rebuilt.push(state);
    }

    debug!(
        "Replayed {} ticks from {} ({} current events, oldest anchored at {}, {} unanchored)",
        recomputed,
        start.time,
        current.len(),
        oldest,
        unanchored_count
    );

    Replay {
        history: rebuilt,
        outcome: ReplayOutcome::Replayed {
            from: start.time,
            recomputed,
        },
        stale,
        unanchored: unanchored_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::step;
    use crate::InputKind;

    const RETENTION: u64 = 1000;
    const TICK: u64 = 16;

    /// History advanced tick by tick with every event known up front.
    fn computed_history(start: State, events: &[Event], until: Timestamp) -> StateHistory {
        let mut history = StateHistory::new(RETENTION, TICK);
        history.push(start.clone());
        for state in fast_forward(&start, events, until, TICK) {
            history.push(state);
        }
        history
    }

    fn positions(history: &StateHistory) -> Vec<(u64, f64)> {
        history
            .iter()
            .map(|s| (s.time, s.entities[0].position))
            .collect()
    }

    #[test]
    fn test_no_events_leaves_history() {
        let history = computed_history(State::with_actors(1000, &[1]), &[], 1064);

        let replay = replay_events(&history, &[], 1064);

        assert_eq!(replay.outcome, ReplayOutcome::NoCurrentEvents);
        assert_eq!(positions(&replay.history), positions(&history));
    }

    #[test]
    fn test_press_and_release_replay() {
        let history = computed_history(State::with_actors(984, &[1]), &[], 1048);
        let events = vec![
            Event::new(1, InputKind::MoveRight, true, 1000),
            Event::new(1, InputKind::MoveRight, false, 1032),
        ];

        let replay = replay_events(&history, &events, 1048);

        assert_eq!(
            replay.outcome,
            ReplayOutcome::Replayed {
                from: 984,
                recomputed: 4
            }
        );
        assert_eq!(
            positions(&replay.history),
            vec![
                (984, 0.0),
                (1000, 0.0),
                (1016, 1.0),
                (1032, 2.0),
                (1048, 2.0)
            ]
        );
        assert!(replay.history.is_regular());
    }

    #[test]
    fn test_late_event_matches_full_computation() {
        let start = State::with_actors(2000, &[1]);
        let early = Event::new(1, InputKind::MoveLeft, true, 2010);
        let late = Event::new(1, InputKind::MoveRight, true, 2100);

        let before = computed_history(start.clone(), &[early.clone()], 2200);
        let all = vec![early.clone(), late.clone()];
        let expected = computed_history(start, &all, 2200);

        let replay = replay_events(&before, &all, 2200);

        assert_eq!(positions(&replay.history), positions(&expected));
        // The prefix before the late event is untouched
        for state in before.iter().filter(|s| s.time < late.time) {
            assert_eq!(**replay.history.get(state.time).unwrap(), **state);
        }
    }

    #[test]
    fn test_replay_is_idempotent() {
        let history = computed_history(State::with_actors(3000, &[1]), &[], 3160);
        let events = vec![Event::new(1, InputKind::MoveRight, true, 3050)];

        let once = replay_events(&history, &events, 3160);
        let twice = replay_events(&once.history, &events, 3160);

        assert_eq!(positions(&once.history), positions(&twice.history));
    }

    #[test]
    fn test_stale_event_is_not_replayed() {
        let now = 5000;
        let history = computed_history(State::with_actors(4000, &[1]), &[], now);
        let stale = Event::new(1, InputKind::MoveRight, true, now - RETENTION - 1);

        let replay = replay_events(&history, &[stale], now);

        assert_eq!(replay.outcome, ReplayOutcome::NoCurrentEvents);
        assert_eq!(replay.stale, 1);
        assert_eq!(positions(&replay.history), positions(&history));
    }

    #[test]
    fn test_missing_anchor_keeps_history() {
        let history = computed_history(State::with_actors(1000, &[1]), &[], 1064);
        let event = Event::new(1, InputKind::MoveRight, true, 1000);

        let replay = replay_events(&history, &[event], 1064);

        assert_eq!(
            replay.outcome,
            ReplayOutcome::MissingAnchor { oldest: 1000 }
        );
        assert_eq!(replay.unanchored, 1);
        assert_eq!(positions(&replay.history), positions(&history));
    }

    #[test]
    fn test_unanchored_event_does_not_block_anchored_one() {
        let history = computed_history(State::with_actors(1000, &[1]), &[], 1064);
        let events = vec![
            Event::new(1, InputKind::MoveLeft, true, 1000),
            Event::new(1, InputKind::MoveRight, true, 1040),
        ];

        let replay = replay_events(&history, &events, 1064);

        assert_eq!(
            replay.outcome,
            ReplayOutcome::Replayed {
                from: 1032,
                recomputed: 2
            }
        );
        assert_eq!(replay.unanchored, 1);
        assert_eq!(replay.history.latest().unwrap().position_of(1), Some(2.0));
        assert_eq!(replay.history.get(1032).unwrap().position_of(1), Some(0.0));
        assert!(replay.history.is_regular());
    }

    #[test]
    fn test_future_event_leaves_history() {
        let history = computed_history(State::with_actors(1000, &[1]), &[], 1064);
        let event = Event::new(1, InputKind::MoveRight, true, 1100);

        let replay = replay_events(&history, &[event], 1064);

        assert_eq!(
            replay.outcome,
            ReplayOutcome::Replayed {
                from: 1064,
                recomputed: 0
            }
        );
        assert_eq!(positions(&replay.history), positions(&history));
    }

    #[test]
    fn test_replay_ignores_other_actor_events() {
        let start = State::with_actors(0, &[1, 2]);
        let mut history = StateHistory::new(RETENTION, TICK);
        history.push(start.clone());
        history.push(step(&start, &[], TICK, None));
        history.push(step(history.latest().unwrap(), &[], TICK, None));

        let events = vec![Event::new(2, InputKind::MoveLeft, true, 10)];
        let replay = replay_events(&history, &events, 32);

        let latest = replay.history.latest().unwrap();
        assert_eq!(latest.position_of(1), Some(0.0));
        assert_eq!(latest.position_of(2), Some(-2.0));
    }
}

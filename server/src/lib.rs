//! # Authoritative Server Library
//!
//! This library provides the authoritative side of the rubberband netcode
//! simulation. It owns the canonical state history, tracks the remote input
//! events that reach it over a delayed channel, and publishes snapshots that
//! clients reconcile against.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! The server steps the shared simulation forward on a fixed tick. It has no
//! local input of its own: every input comes from remote actors, and each
//! tick only applies the tracked events whose timestamps fall inside it.
//!
//! ### Replay of Late Events
//! Events travel with variable delay and are stamped with their expected
//! arrival time, so they regularly arrive after the server already computed
//! the ticks they belong to. Whenever events arrive, the server replays its
//! history from the last snapshot that predates the oldest current event.
//! Once an event for time `T` is known, every snapshot from `T` on reflects
//! it, regardless of arrival order.
//!
//! ### Snapshot Publication
//! After every tick the latest snapshot is handed out for publication to
//! clients and to any read-only consumer such as a renderer.
//!
//! ## Module Organization
//!
//! ### Event Log Module (`event_log`)
//! Tracks remote events while they can still influence the simulation:
//! - Chronological ordering with arrival order breaking ties
//! - Retention-window filtering and pruning
//! - Per-actor arrival bookkeeping
//!
//! ### Game Module (`game`)
//! Contains the authoritative history and the tick and replay logic:
//! - Regular, bounded history of snapshots
//! - Fixed-cadence advancement
//! - Replay on event arrival with counters for dropped and replayed events
//!
//! ## Usage Example
//!
//! ```rust
//! use server::game::ServerGame;
//! use shared::{Event, InputKind, SimConfig, State};
//!
//! let config = SimConfig::default();
//! let mut server = ServerGame::new(State::with_actors(10_000, &[1, 2]), &config);
//!
//! // Regular tick
//! let snapshot = server.tick(10_016);
//! assert!(snapshot.is_some());
//!
//! // An event for an already computed tick arrives late
//! server.apply_events(vec![Event::new(2, InputKind::MoveRight, true, 10_004)], 10_040);
//! assert_eq!(server.latest().unwrap().position_of(2), Some(3.0));
//! ```
//!
//! ## Consistency Guarantees
//!
//! Events older than the retention window are never replayed and an event
//! with no retained snapshot before it cannot be replayed. Both cases are
//! counted in the server's replay statistics rather than raised as errors.

pub mod event_log;
pub mod game;

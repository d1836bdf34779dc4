//! # Predicting Client Library
//!
//! This library provides the client side of the rubberband netcode
//! simulation. The client applies its own input immediately and then pulls
//! its prediction toward the authoritative server a little at a time.
//!
//! ## Architecture Overview
//!
//! ### Client-Side Prediction
//! Input edges are stamped with the client's synced clock, the time at which
//! they are expected to reach the server, and applied to the local history
//! on the very next tick. The same events are handed out for transmission,
//! so server and client apply them to the same simulated instant.
//!
//! ### Rubberband Reconciliation
//! When a server snapshot arrives, the client compares it with what it
//! believed at the snapshot's time. Instead of snapping to the server, it
//! moves its current value by a fixed fraction of that gap, so a divergence
//! decays over several snapshots without visible jumps.
//!
//! Only the properties declared in [`shared::SimConfig::synced`] are
//! corrected. Entities the client never predicts keep their local value.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! Contains the client-side state management:
//! - Synced clock and input dispatch
//! - Predicted history on a fixed tick
//! - Snapshot reconciliation and its counters
//!
//! ## Usage Example
//!
//! ```rust
//! use client::game::ClientGame;
//! use shared::{InputKind, Packet, SimConfig, State};
//!
//! let config = SimConfig::default();
//! let mut client = ClientGame::new(State::with_actors(10_000, &[1, 2]), &config);
//!
//! client.dispatch(1, InputKind::MoveRight, true, 10_000);
//! let outgoing = client.tick(10_016);
//! assert!(matches!(outgoing, Some(Packet::Events { .. })));
//! assert_eq!(client.latest().unwrap().position_of(1), Some(1.0));
//! ```

pub mod game;

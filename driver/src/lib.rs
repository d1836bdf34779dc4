//! # Simulation Driver
//!
//! Wires the authoritative server and the predicting client together over
//! simulated latency channels and runs them on a virtual clock.
//!
//! ## Event Loop
//! The driver is the only event loop. Server ticks, client ticks and scripted
//! inputs are scheduled by virtual time; payloads between the roles are
//! encoded packets held by latency channels until their release time. The
//! loop can run as fast as possible for tests and batch runs, or be paced
//! against the wall clock with tokio.
//!
//! ## Module Organization
//! - `runner`: the driver itself, scripted inputs and transport counters
//! - `realtime`: tokio pacing with external shutdown
//! - `frame`: read-only per-tick view of both roles for rendering

pub mod frame;
pub mod realtime;
pub mod runner;

pub use frame::Frame;
pub use runner::{Driver, DriverStats, Route};

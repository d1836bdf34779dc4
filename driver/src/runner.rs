//! Virtual-clock event loop connecting the server and client roles
//!
//! Everything runs on one logical thread. Ticks and scripted inputs sit in a
//! scheduler keyed by virtual time, and every payload between roles travels
//! through a latency channel as an encoded byte vector. At equal times the
//! loop delivers payloads before it runs ticks.

use crate::frame::Frame;
use client::game::ClientGame;
use log::{debug, info, warn};
use server::game::ServerGame;
use shared::channel::{LatencyChannel, LatencyModel, Scheduler};
use shared::config::{LOCAL_ACTOR, REMOTE_ACTOR};
use shared::{ActorId, Event, InputKind, Packet, SimConfig, State, Timestamp};

/// Delay after start before the scripted remote actor presses MoveRight
pub const REMOTE_PRESS_AFTER: u64 = 500;
/// How long the scripted remote actor holds MoveRight
pub const REMOTE_HOLD: u64 = 1000;

/// Where a scripted input enters the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Captured by the local client, predicted and then sent
    Local,
    /// Sent straight to the server by a remote source
    Remote,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    ServerTick,
    ClientTick,
    Input {
        actor: ActorId,
        kind: InputKind,
        value: bool,
        route: Route,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverStats {
    pub server_ticks: u64,
    pub client_ticks: u64,
    pub snapshots_sent: u64,
    pub event_packets_sent: u64,
    pub packets_delivered: u64,
    /// Payloads that could not be encoded, decoded or handled by their receiver
    pub rejected_packets: u64,
    pub cancelled_on_shutdown: u64,
}

pub struct Driver {
    start: Timestamp,
    now: Timestamp,
    tick: u64,
    server: ServerGame,
    client: ClientGame,
    /// Client to server
    uplink: LatencyChannel<Vec<u8>>,
    /// Remote actor to server
    remote_uplink: LatencyChannel<Vec<u8>>,
    /// Server to client
    downlink: LatencyChannel<Vec<u8>>,
    tasks: Scheduler<Task>,
    stats: DriverStats,
}

impl Driver {
    /// Creates both roles at `start` and schedules their first ticks.
    ///
    /// The three channels draw their jitter from generators derived from
    /// `seed`, so a run is reproducible.
    pub fn new(config: SimConfig, start: Timestamp, seed: u64) -> Self {
        let actors = [LOCAL_ACTOR, REMOTE_ACTOR];
        let model = LatencyModel::new(config.latency, config.latency_sway);
        let tick = config.dt.max(1);

        let mut tasks = Scheduler::new();
        tasks.schedule(start + tick, Task::ServerTick);
        tasks.schedule(start + tick, Task::ClientTick);

        info!(
            "Simulation starting at {} (dt {}ms, latency {}ms, sway {:.2}, seed {})",
            start, tick, model.base, model.sway, seed
        );

        Self {
            server: ServerGame::new(State::with_actors(start, &actors), &config),
            client: ClientGame::new(State::with_actors(start, &actors), &config),
            uplink: LatencyChannel::new(model, seed),
            remote_uplink: LatencyChannel::new(model, seed.wrapping_add(1)),
            downlink: LatencyChannel::new(model, seed.wrapping_add(2)),
            tasks,
            start,
            now: start,
            tick,
            stats: DriverStats::default(),
        }
    }

    pub fn schedule_input(
        &mut self,
        at: Timestamp,
        actor: ActorId,
        kind: InputKind,
        value: bool,
        route: Route,
    ) {
        self.tasks.schedule(
            at,
            Task::Input {
                actor,
                kind,
                value,
                route,
            },
        );
    }

    /// Schedules the remote actor's demo input: MoveRight held for
    /// `REMOTE_HOLD` ms, starting `REMOTE_PRESS_AFTER` ms after start.
    pub fn script_remote_actor(&mut self) {
        let press = self.start + REMOTE_PRESS_AFTER;
        self.schedule_input(press, REMOTE_ACTOR, InputKind::MoveRight, true, Route::Remote);
        self.schedule_input(
            press + REMOTE_HOLD,
            REMOTE_ACTOR,
            InputKind::MoveRight,
            false,
            Route::Remote,
        );
    }

    /// Local input edge at the current virtual time.
    pub fn dispatch(&mut self, actor: ActorId, kind: InputKind, value: bool) -> Event {
        self.client.dispatch(actor, kind, value, self.now)
    }

    /// Sends an input edge from a remote source straight to the server.
    pub fn send_remote(&mut self, actor: ActorId, kind: InputKind, value: bool) -> Event {
        let event = Event::new(actor, kind, value, self.remote_uplink.synced_now(self.now));
        let packet = Packet::Events {
            events: vec![event.clone()],
        };
        if let Some(bytes) = self.encode(&packet) {
            self.remote_uplink.send(bytes, self.now);
            self.stats.event_packets_sent += 1;
        }
        event
    }

    /// Processes every delivery and task due up to `until`, in time order.
    pub fn run_until(&mut self, until: Timestamp) {
        while let Some(next) = self.next_due() {
            if next > until {
                break;
            }
            self.now = self.now.max(next);

            self.deliver_due();
            while let Some((_, task)) = self.tasks.pop_due(self.now) {
                self.run_task(task);
            }
        }
        self.now = self.now.max(until);
    }

    fn next_due(&self) -> Option<Timestamp> {
        [
            self.tasks.next_due(),
            self.uplink.next_due(),
            self.remote_uplink.next_due(),
            self.downlink.next_due(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    fn deliver_due(&mut self) {
        let now = self.now;

        for bytes in self.downlink.deliver_due(now) {
            self.stats.packets_delivered += 1;
            let packet = match self.decode(&bytes) {
                Some(packet) => packet,
                None => continue,
            };
            match self.client.receive(packet) {
                Ok(correction) => debug!(
                    "Client reconciled at {}: {} corrected, {} skipped",
                    now, correction.corrected, correction.skipped
                ),
                Err(e) => {
                    warn!("Client dropped payload: {}", e);
                    self.stats.rejected_packets += 1;
                }
            }
        }

        let mut inbound = self.uplink.deliver_due(now);
        inbound.extend(self.remote_uplink.deliver_due(now));
        for bytes in inbound {
            self.stats.packets_delivered += 1;
            let packet = match self.decode(&bytes) {
                Some(packet) => packet,
                None => continue,
            };
            if let Err(e) = self.server.receive(packet, now) {
                warn!("Server dropped payload: {}", e);
                self.stats.rejected_packets += 1;
            }
        }
    }

    fn run_task(&mut self, task: Task) {
        let now = self.now;
        match task {
            Task::ServerTick => {
                self.stats.server_ticks += 1;
                if let Some(packet) = self.server.tick(now) {
                    if let Some(bytes) = self.encode(&packet) {
                        self.downlink.send(bytes, now);
                        self.stats.snapshots_sent += 1;
                    }
                }
                self.tasks.schedule(now + self.tick, Task::ServerTick);
            }
            Task::ClientTick => {
                self.stats.client_ticks += 1;
                if let Some(packet) = self.client.tick(now) {
                    if let Some(bytes) = self.encode(&packet) {
                        self.uplink.send(bytes, now);
                        self.stats.event_packets_sent += 1;
                    }
                }
                self.tasks.schedule(now + self.tick, Task::ClientTick);
            }
            Task::Input {
                actor,
                kind,
                value,
                route: Route::Local,
            } => {
                self.client.dispatch(actor, kind, value, now);
            }
            Task::Input {
                actor,
                kind,
                value,
                route: Route::Remote,
            } => {
                self.send_remote(actor, kind, value);
            }
        }
    }

    fn encode(&mut self, packet: &Packet) -> Option<Vec<u8>> {
        match packet.encode() {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Dropping {} packet: {}", packet.kind(), e);
                self.stats.rejected_packets += 1;
                None
            }
        }
    }

    fn decode(&mut self, bytes: &[u8]) -> Option<Packet> {
        match Packet::decode(bytes) {
            Ok(packet) => Some(packet),
            Err(e) => {
                warn!("Dropping undecodable payload ({} bytes): {}", bytes.len(), e);
                self.stats.rejected_packets += 1;
                None
            }
        }
    }

    /// Cancels every pending delivery and scheduled task.
    ///
    /// Returns the number of deliveries dropped.
    pub fn shutdown(&mut self) -> usize {
        let cancelled = self.uplink.cancel_pending()
            + self.remote_uplink.cancel_pending()
            + self.downlink.cancel_pending();
        let tasks = self.tasks.clear();
        self.stats.cancelled_on_shutdown += cancelled as u64;

        info!(
            "Shut down at {}: cancelled {} deliveries and {} scheduled tasks",
            self.now, cancelled, tasks
        );
        cancelled
    }

    /// Read-only snapshot of both roles for rendering.
    pub fn frame(&self) -> Frame {
        Frame {
            time: self.now,
            server: self.server.latest(),
            client: self.client.latest(),
        }
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    pub fn tick_size(&self) -> u64 {
        self.tick
    }

    pub fn server(&self) -> &ServerGame {
        &self.server
    }

    pub fn client(&self) -> &ClientGame {
        &self.client
    }

    pub fn stats(&self) -> &DriverStats {
        &self.stats
    }

    pub fn in_flight(&self) -> usize {
        self.uplink.in_flight() + self.remote_uplink.in_flight() + self.downlink.in_flight()
    }
}

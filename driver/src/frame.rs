use shared::{State, Timestamp};
use std::fmt;
use std::sync::Arc;

/// What a renderer sees after a tick: the latest snapshot of each role.
#[derive(Debug, Clone)]
pub struct Frame {
    pub time: Timestamp,
    pub server: Option<Arc<State>>,
    pub client: Option<Arc<State>>,
}

fn write_positions(f: &mut fmt::Formatter<'_>, state: &Option<Arc<State>>) -> fmt::Result {
    match state {
        Some(state) => {
            for entity in &state.entities {
                write!(f, " {}:{:>8.3}", entity.actor, entity.position)?;
            }
            Ok(())
        }
        None => write!(f, " -"),
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={:>7} | server", self.time)?;
        write_positions(f, &self.server)?;
        write!(f, " | client")?;
        write_positions(f, &self.client)
    }
}

//! Wire format of the messages carried between roles.

use crate::{Event, State};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    /// Input events from a sender to the authoritative server.
    Events { events: Vec<Event> },
    /// Authoritative snapshot published by the server.
    Snapshot { state: State },
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to encode packet: {0}")]
    Encode(#[source] bincode::Error),
    #[error("failed to decode packet: {0}")]
    Decode(#[source] bincode::Error),
    #[error("unexpected {0} packet")]
    Unexpected(&'static str),
}

impl Packet {
    pub fn kind(&self) -> &'static str {
        match self {
            Packet::Events { .. } => "events",
            Packet::Snapshot { .. } => "snapshot",
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        bincode::serialize(self).map_err(ProtocolError::Encode)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        bincode::deserialize(bytes).map_err(ProtocolError::Decode)
    }

    pub fn into_events(self) -> Result<Vec<Event>, ProtocolError> {
        match self {
            Packet::Events { events } => Ok(events),
            other => Err(ProtocolError::Unexpected(other.kind())),
        }
    }

    pub fn into_snapshot(self) -> Result<State, ProtocolError> {
        match self {
            Packet::Snapshot { state } => Ok(state),
            other => Err(ProtocolError::Unexpected(other.kind())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Entity, InputKind};

    #[test]
    fn test_packet_serialization_events() {
        let packet = Packet::Events {
            events: vec![
                Event::new(1, InputKind::MoveRight, true, 1045),
                Event::new(1, InputKind::MoveRight, false, 1200),
            ],
        };

        let bytes = packet.encode().unwrap();
        let events = Packet::decode(&bytes).unwrap().into_events().unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, InputKind::MoveRight);
        assert!(events[0].value);
        assert_eq!(events[1].time, 1200);
    }

    #[test]
    fn test_packet_serialization_snapshot() {
        let mut state = State::new(480, vec![Entity::new(1, 12.5), Entity::new(2, -3.0)]);
        state.entities[0].input.left = true;

        let bytes = Packet::Snapshot {
            state: state.clone(),
        }
        .encode()
        .unwrap();
        let decoded = Packet::decode(&bytes).unwrap().into_snapshot().unwrap();

        assert_eq!(decoded, state);
    }

    #[test]
    fn test_unexpected_packet_kind() {
        let packet = Packet::Events { events: vec![] };
        match packet.into_snapshot() {
            Err(ProtocolError::Unexpected(kind)) => assert_eq!(kind, "events"),
            _ => panic!("Expected an unexpected-packet error"),
        }
    }

    #[test]
    fn test_malformed_packet() {
        let bytes = Packet::Snapshot {
            state: State::with_actors(16, &[1, 2]),
        }
        .encode()
        .unwrap();

        assert!(Packet::decode(&bytes[..bytes.len() / 2]).is_err());
        assert!(Packet::decode(&[]).is_err());

        let mut corrupted = bytes.clone();
        corrupted[0] = 0xFF;
        assert!(matches!(
            Packet::decode(&corrupted),
            Err(ProtocolError::Decode(_))
        ));
    }
}

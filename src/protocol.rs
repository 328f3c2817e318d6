//! `respawn.*` wire protocol.
//!
//! Every message the respawn service publishes for observers (game clients,
//! dashboards, the hosting session) lives here.
//!
//! ## Design rules
//!
//! 1. Every struct is `Serialize + Deserialize` with snake_case JSON.
//! 2. No registry types leak out; entities are referenced by raw id.
//! 3. Every outbound event includes `frame: u64` and `session: String`.
//! 4. Observers replicate state exclusively from [`RespawnStatus`].

use crate::types::{ParticipantId, RespawnState};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Common envelope
// ---------------------------------------------------------------------------

/// Every outbound message is wrapped in this envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespawnEvent<T> {
    pub session: String,
    pub frame: u64,
    pub payload: T,
}

impl<T> RespawnEvent<T> {
    pub fn new(session: impl Into<String>, frame: u64, payload: T) -> Self {
        Self {
            session: session.into(),
            frame,
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// State replication  (subject: respawn.status)
// ---------------------------------------------------------------------------

/// Authoritative respawn state, mirrored by observers.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct RespawnStatus {
    pub state: RespawnState,
    pub countdown_started: bool,
    /// Seconds until the shuttle is dispatched.
    pub respawn_timer: f32,
    /// Seconds until the shuttle starts heading back out of the level.
    pub transport_timer: f32,
}

// ---------------------------------------------------------------------------
// Dispatch  (subject: respawn.dispatched)
// ---------------------------------------------------------------------------

/// The shuttle left with freshly created characters aboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShuttleDispatched {
    /// Participants that received a character, in spawn order.
    pub participants: Vec<ParticipantId>,
    /// Whether the hosting participant was revived as well.
    pub local_revived: bool,
}

// ---------------------------------------------------------------------------
// Notices  (subject: respawn.notice)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Dispatched,
    Evacuate,
}

/// A server chat notice broadcast to every participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerNotice {
    pub kind: NoticeKind,
    pub text: String,
}

impl ServerNotice {
    pub fn dispatched() -> Self {
        Self {
            kind: NoticeKind::Dispatched,
            text: "Transportation shuttle dispatched".into(),
        }
    }

    pub fn evacuate() -> Self {
        Self {
            kind: NoticeKind::Evacuate,
            text: "The shuttle will automatically return back to the outpost. \
                   Please leave the shuttle immediately."
                .into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Subject helpers
// ---------------------------------------------------------------------------

/// All bus subjects used by the respawn protocol, as constants.
pub mod subjects {
    pub const STATUS: &str = "respawn.status";
    pub const DISPATCHED: &str = "respawn.dispatched";
    pub const NOTICE: &str = "respawn.notice";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_state_in_snake_case() {
        let status = RespawnStatus {
            state: RespawnState::Transporting,
            countdown_started: false,
            respawn_timer: 60.0,
            transport_timer: 120.0,
        };
        let json = serde_json::to_value(RespawnEvent::new("s", 7, status)).unwrap();
        assert_eq!(json["payload"]["state"], "transporting");
        assert_eq!(json["frame"], 7);

        let back: RespawnEvent<RespawnStatus> = serde_json::from_value(json).unwrap();
        assert_eq!(back.payload, status);
    }
}

//! Session types: the server's record of one connected player.

use std::time::Instant;

use deckforge_protocol::PlayerId;

/// Configuration for session behavior.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a disconnected player has to reconnect before the
    /// session is permanently expired. 0 disables reconnection.
    pub reconnect_grace_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { reconnect_grace_secs: 30 }
    }
}

/// The lifecycle state of a session.
///
/// ```text
///   Connected ──(disconnect)──→ Disconnected ──(timeout)──→ Expired
///       ↑                            │
///       └────────(reconnect)─────────┘
/// ```
///
/// `Instant` (monotonic) rather than wall time: elapsed-time checks must
/// not jump with clock adjustments.
#[derive(Debug, Clone)]
pub enum SessionState {
    Connected,
    /// The player has until `since + grace` to reconnect.
    Disconnected { since: Instant },
    /// Grace elapsed; awaiting cleanup. A new handshake is required.
    Expired,
}

/// A single player's session. Created on a successful handshake.
#[derive(Debug, Clone)]
pub struct Session {
    pub player_id: PlayerId,

    /// The durable identity behind this session. Rooms key seats by this,
    /// not by `player_id`.
    pub guest_key: String,

    pub state: SessionState,

    /// Secret the client presents to resume after a transport drop
    /// without re-authenticating. 32 hex chars, 128 bits of entropy.
    pub reconnect_token: String,
}

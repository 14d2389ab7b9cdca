//! Core protocol types for Deckforge's wire format.
//!
//! Everything in this module travels "on the wire": these are the
//! structures that get serialized to bytes, sent over the network, and
//! deserialized on the other side. The protocol layer knows nothing about
//! card rules or rooms — it only defines the language that the client and
//! server speak.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a connected player session.
///
/// Newtype wrapper over `u64` so a `PlayerId` can never be confused with a
/// `RoomId` even though both are integers underneath. A player id names a
/// *session*: when a client reconnects after a drop it receives a fresh
/// `PlayerId`, and the game layer migrates their seat to it using the
/// durable guest key (see `deckforge-session`).
///
/// `#[serde(transparent)]` serializes this as the bare number, so
/// `PlayerId(42)` is just `42` in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a room (one table running one match at a time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient — who should receive a message?
// ---------------------------------------------------------------------------

/// Specifies who should receive a server event.
///
/// Game logic returns `(Recipient, event)` pairs; the room actor resolves
/// each recipient to the right per-player channels. Delivery is
/// fire-and-forget — a dead receiver never aborts delivery to the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every player in the room.
    All,

    /// One specific player (private hands, resync snapshots, rejections).
    Player(PlayerId),

    /// Everyone except the specified player (e.g. "X toggled easy mode").
    AllExcept(PlayerId),
}

// ---------------------------------------------------------------------------
// Channel — delivery guarantees
// ---------------------------------------------------------------------------

/// The delivery guarantee for a message.
///
/// Everything in a turn-based card game is `ReliableOrdered`; the other
/// variants exist so the envelope format doesn't need to change when a
/// transport with unreliable channels is added.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "PascalCase")]
pub enum Channel {
    /// Delivered in order, no loss. The default for all game traffic.
    #[default]
    ReliableOrdered,

    /// Delivered, but possibly out of order.
    ReliableUnordered,

    /// May be lost or reordered.
    Unreliable,
}

// ---------------------------------------------------------------------------
// SystemMessage — framework-level messages
// ---------------------------------------------------------------------------

/// A summary of a room returned in room listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListEntry {
    /// The room's unique ID.
    pub room_id: RoomId,
    /// Number of players currently seated.
    pub player_count: usize,
    /// Maximum players allowed (5 for the shedding game).
    pub max_players: usize,
}

/// Messages used by the framework itself (not game-specific).
///
/// These handle the plumbing: connecting, authenticating, joining rooms,
/// heartbeats, and errors. `#[serde(tag = "type")]` produces internally
/// tagged JSON — `{ "type": "Handshake", "version": 1, ... }` — which is
/// the easiest shape for a JavaScript client to consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemMessage {
    // -- Connection lifecycle --

    /// Client → Server: first message on every connection.
    /// `token` is the auth collaborator's credential; the server maps it
    /// to a verified identity and a durable guest key.
    Handshake {
        version: u32,
        token: Option<String>,
    },

    /// Server → Client: handshake accepted.
    /// `guest_key` is the durable continuity key — the client stores it
    /// and presents it on reconnect so its seat survives the drop.
    HandshakeAck {
        player_id: PlayerId,
        guest_key: String,
        server_time: u64,
    },

    /// Either direction: orderly disconnect with a human-readable reason.
    Disconnect { reason: String },

    // -- Heartbeat (keep-alive) --

    /// Client → Server: "still here". `client_time` is echoed back so the
    /// client can measure RTT.
    Heartbeat { client_time: u64 },

    /// Server → Client: heartbeat echo with server timing.
    HeartbeatAck {
        client_time: u64,
        server_time: u64,
    },

    // -- Room management --

    /// Client → Server: join a specific room.
    JoinRoom { room_id: RoomId },

    /// Client → Server: find a joinable room or create a new one.
    JoinOrCreate,

    /// Client → Server: leave the current room.
    LeaveRoom,

    /// Client → Server: list joinable rooms.
    ListRooms,

    /// Server → Client: the joinable rooms.
    RoomList {
        rooms: Vec<RoomListEntry>,
    },

    /// Server → Client: room entry confirmed. `reconnect_token` lets the
    /// connection layer resume the session after a transport drop.
    RoomJoined {
        room_id: RoomId,
        reconnect_token: String,
    },

    // -- Errors --

    /// Server → Client: something went wrong at the framework level.
    /// `code` follows HTTP-style conventions (400 bad request,
    /// 401 unauthorized, 404 not found, 409 conflict).
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Payload — what's inside an envelope
// ---------------------------------------------------------------------------

/// The content of a message: either a system message or game data.
///
/// Adjacently tagged (`{"type": "Game", "data": [...]}`), so the handler
/// can decide "plumbing or game?" without touching the inner bytes. Game
/// bytes are opaque here — only `deckforge-game` knows their shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    /// A framework-level message.
    System(SystemMessage),

    /// Game-specific data, opaque to the protocol layer.
    Game(Vec<u8>),
}

// ---------------------------------------------------------------------------
// Envelope — the top-level wire format
// ---------------------------------------------------------------------------

/// The top-level message wrapper. Every message on the wire is an Envelope:
/// metadata on the outside (sequence, timestamp, delivery channel), content
/// inside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Auto-incrementing sequence number; each side keeps its own counter.
    pub seq: u64,

    /// Milliseconds since the server started.
    pub timestamp: u64,

    /// Delivery guarantee. Defaults to `ReliableOrdered` when absent.
    #[serde(default)]
    pub channel: Channel,

    /// The actual content (system or game data).
    pub payload: Payload,
}

// =========================================================================
// Tests
// =========================================================================

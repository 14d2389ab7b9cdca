//! Error types for the room layer.

use deckforge_protocol::{PlayerId, RoomId};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The player is already a member of a room.
    #[error("player {0} already in room {1}")]
    AlreadyInRoom(PlayerId, RoomId),

    /// The player is not in any room.
    #[error("player {0} not in a room")]
    NotInRoom(PlayerId),

    /// The game refused the join. The reason is game-defined
    /// (room full, match in progress, etc.) and safe to forward to the
    /// client.
    #[error("join refused: {0}")]
    JoinRefused(String),

    /// The room's command channel is full or closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}

//! Unified error type for the Deckforge framework.

use deckforge_protocol::ProtocolError;
use deckforge_room::RoomError;
use deckforge_session::SessionError;
use deckforge_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `deckforge` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum DeckforgeError {
    /// A transport-level error (connection, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (auth, reconnect, expired).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (full, not found, refused join).
    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let deckforge_err: DeckforgeError = err.into();
        assert!(matches!(deckforge_err, DeckforgeError::Transport(_)));
        assert!(deckforge_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let deckforge_err: DeckforgeError = err.into();
        assert!(matches!(deckforge_err, DeckforgeError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::AuthFailed("nope".into());
        let deckforge_err: DeckforgeError = err.into();
        assert!(matches!(deckforge_err, DeckforgeError::Session(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::NotFound(deckforge_protocol::RoomId(1));
        let deckforge_err: DeckforgeError = err.into();
        assert!(matches!(deckforge_err, DeckforgeError::Room(_)));
    }
}

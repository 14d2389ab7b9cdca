//! Error types for the protocol layer.
//!
//! Each crate in Deckforge defines its own error enum. A `ProtocolError`
//! always means the problem is in serialization or message shape, not in
//! networking or room management.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed. Common causes: malformed JSON, missing
    /// required fields, wrong data types, truncated messages.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message is invalid at the protocol level — it deserialized
    /// fine but violates protocol rules (wrong handshake version, a
    /// non-handshake first message, etc.).
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

//! Deckforge — an authoritative multiplayer game server framework.
//!
//! Deckforge runs turn-based card games over WebSocket: the server owns
//! all game state, clients send intents, and the server broadcasts
//! events. The meta-crate wires the layered sub-crates together:
//!
//! - `deckforge-transport` — WebSocket listener and connections
//! - `deckforge-protocol` — envelopes, system messages, codecs
//! - `deckforge-session` — authentication and reconnection tokens
//! - `deckforge-room` — room actors hosting a [`GameLogic`] impl
//!
//! Implement [`GameLogic`] for your game, pick an [`Authenticator`], and
//! start a [`DeckforgeServer`]:
//!
//! ```rust,ignore
//! use deckforge::prelude::*;
//!
//! let server = DeckforgeServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build::<MyGame>(my_auth)
//!     .await?;
//! server.run().await
//! ```
//!
//! [`GameLogic`]: deckforge_room::GameLogic
//! [`Authenticator`]: deckforge_session::Authenticator

mod error;
mod handler;
mod server;

pub use error::DeckforgeError;
pub use server::{DeckforgeServer, DeckforgeServerBuilder, PROTOCOL_VERSION};

/// Everything needed to implement a game and run a server.
pub mod prelude {
    pub use crate::{
        DeckforgeError, DeckforgeServer, DeckforgeServerBuilder,
        PROTOCOL_VERSION,
    };
    pub use deckforge_protocol::{
        Channel, Codec, Envelope, JsonCodec, Payload, PlayerId, ProtocolError,
        Recipient, RoomId, RoomListEntry, SystemMessage,
    };
    pub use deckforge_room::{
        GameLogic, Outcome, RoomConfig, RoomError, RoomInfo, RoomManager,
    };
    pub use deckforge_session::{
        Authenticator, Identity, SessionConfig, SessionError,
    };
}

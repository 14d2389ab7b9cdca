//! `DeckforgeServer` builder and server loop.
//!
//! This is the entry point for running a Deckforge game server. It ties
//! together all the layers: transport → protocol → session → room.

use std::sync::Arc;

use deckforge_protocol::{Codec, JsonCodec};
use deckforge_room::{GameLogic, RoomManager};
use deckforge_session::{Authenticator, SessionConfig, SessionManager};
use deckforge_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::DeckforgeError;
use crate::handler::handle_connection;

/// The current protocol version. Clients must send this in their
/// handshake or be rejected.
pub const PROTOCOL_VERSION: u32 = 1;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks.
/// Interior mutability via `Mutex` where needed.
pub(crate) struct ServerState<G: GameLogic, A: Authenticator, C: Codec> {
    pub(crate) sessions: Mutex<SessionManager>,
    pub(crate) rooms: Mutex<RoomManager<G>>,
    pub(crate) auth: A,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Deckforge server.
///
/// # Example
///
/// ```rust,ignore
/// use deckforge::prelude::*;
///
/// let server = DeckforgeServer::builder()
///     .bind("0.0.0.0:8080")
///     .build::<MyGame>(my_auth)
///     .await?;
/// server.run().await
/// ```
pub struct DeckforgeServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
}

impl DeckforgeServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            session_config: SessionConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Builds and starts the server with the given authenticator.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport` as defaults.
    pub async fn build<G: GameLogic>(
        self,
        auth: impl Authenticator,
    ) -> Result<DeckforgeServer<G, impl Authenticator, JsonCodec>, DeckforgeError>
    {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            sessions: Mutex::new(SessionManager::new(self.session_config)),
            rooms: Mutex::new(RoomManager::new()),
            auth,
            codec: JsonCodec,
        });

        Ok(DeckforgeServer { transport, state })
    }
}

impl Default for DeckforgeServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Deckforge game server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct DeckforgeServer<G: GameLogic, A: Authenticator, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<G, A, C>>,
}

impl<G, A, C> DeckforgeServer<G, A, C>
where
    G: GameLogic,
    A: Authenticator,
    C: Codec + Clone + 'static,
{
    /// Creates a new builder.
    pub fn builder() -> DeckforgeServerBuilder {
        DeckforgeServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, DeckforgeError> {
        self.transport.local_addr().map_err(DeckforgeError::Transport)
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections, performs the handshake, and spawns
    /// a handler task for each connected player. Runs until the process
    /// is terminated.
    pub async fn run(mut self) -> Result<(), DeckforgeError> {
        tracing::info!("Deckforge server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection::<G, A, C>(conn, state).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

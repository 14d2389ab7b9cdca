//! Server binary: mounts [`ShedGame`] on a Deckforge server.
//!
//! Any non-empty token is accepted as a guest key; the session id is
//! minted per connection. Reconnecting with the same token resumes the
//! seat.

use std::sync::atomic::{AtomicU64, Ordering};

use deckforge::prelude::*;
use deckforge_game::ShedGame;
use tracing_subscriber::EnvFilter;

/// Guest auth: the token IS the durable identity.
struct GuestAuth {
    next_id: AtomicU64,
}

impl Authenticator for GuestAuth {
    async fn authenticate(&self, token: &str) -> Result<Identity, SessionError> {
        if token.is_empty() {
            return Err(SessionError::AuthFailed("empty guest token".into()));
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Ok(Identity {
            player_id: PlayerId(id),
            guest_key: token.to_owned(),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), DeckforgeError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bind = std::env::var("DECKFORGE_BIND")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let server = DeckforgeServerBuilder::new()
        .bind(&bind)
        .build::<ShedGame>(GuestAuth { next_id: AtomicU64::new(1) })
        .await?;

    tracing::info!(%bind, "shedding game server listening");
    server.run().await
}

//! Authentication hook for validating player identity.
//!
//! Deckforge doesn't implement authentication itself — the server embeds
//! an [`Authenticator`] (JWT validation, an auth API, or the permissive
//! dev/guest variant) and the framework calls it during the handshake.

use deckforge_protocol::PlayerId;

use crate::SessionError;

/// A verified identity: the per-connection session id plus the durable
/// guest key.
///
/// The two layers deliberately differ in lifetime. `player_id` names this
/// connection and dies with it; `guest_key` names the person and survives
/// reconnects, which is what lets a room migrate a seat back to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub player_id: PlayerId,
    pub guest_key: String,
}

/// Validates a client's auth token and returns their identity.
///
/// `Send + Sync + 'static` because one authenticator is shared by every
/// connection handler task for the life of the server.
///
/// # Example
///
/// ```rust
/// use deckforge_session::{Authenticator, Identity, SessionError};
/// use deckforge_protocol::PlayerId;
/// use std::sync::atomic::{AtomicU64, Ordering};
///
/// /// Accepts any token as a guest key and mints a fresh session id.
/// struct GuestAuthenticator {
///     next_id: AtomicU64,
/// }
///
/// impl Authenticator for GuestAuthenticator {
///     async fn authenticate(
///         &self,
///         token: &str,
///     ) -> Result<Identity, SessionError> {
///         if token.is_empty() {
///             return Err(SessionError::AuthFailed("empty token".into()));
///         }
///         let id = self.next_id.fetch_add(1, Ordering::Relaxed);
///         Ok(Identity {
///             player_id: PlayerId(id),
///             guest_key: token.to_owned(),
///         })
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Validates the token from a
    /// [`SystemMessage::Handshake`](deckforge_protocol::SystemMessage::Handshake)
    /// and returns who the caller is.
    fn authenticate(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<Identity, SessionError>> + Send;
}

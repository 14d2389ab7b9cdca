//! The session manager: tracks all active player sessions.
//!
//! Single-threaded by design — a plain `HashMap`, no interior locking.
//! The server owns one instance behind its own synchronization; keeping
//! this layer lock-free avoids paying twice.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use deckforge_protocol::PlayerId;
use rand::Rng;

use crate::{Identity, Session, SessionConfig, SessionError, SessionState};

/// Registry of every player currently connected (or inside their
/// reconnection grace window).
pub struct SessionManager {
    /// All sessions, keyed by player ID. One session per player.
    sessions: HashMap<PlayerId, Session>,

    /// Reconnection token → player ID, kept in sync with `sessions`.
    tokens: HashMap<String, PlayerId>,

    config: SessionConfig,
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            tokens: HashMap::new(),
            config,
        }
    }

    /// Creates a session for a freshly authenticated identity and issues
    /// its reconnection token.
    ///
    /// A leftover disconnected/expired session for the same player is
    /// replaced (and its old token revoked); a still-connected one is an
    /// error.
    pub fn create(&mut self, identity: &Identity) -> Result<&Session, SessionError> {
        if let Some(existing) = self.sessions.get(&identity.player_id) {
            if matches!(existing.state, SessionState::Connected) {
                return Err(SessionError::AlreadyConnected(identity.player_id));
            }
            self.tokens.remove(&existing.reconnect_token);
        }

        let token = generate_token();
        let session = Session {
            player_id: identity.player_id,
            guest_key: identity.guest_key.clone(),
            state: SessionState::Connected,
            reconnect_token: token.clone(),
        };

        self.tokens.insert(token, identity.player_id);
        self.sessions.insert(identity.player_id, session);

        tracing::info!(player_id = %identity.player_id, "session created");

        Ok(self
            .sessions
            .get(&identity.player_id)
            .expect("just inserted"))
    }

    /// Marks a player as disconnected and starts the grace clock.
    pub fn disconnect(&mut self, player_id: PlayerId) -> Result<(), SessionError> {
        let session = self
            .sessions
            .get_mut(&player_id)
            .ok_or(SessionError::NotFound(player_id))?;

        session.state = SessionState::Disconnected { since: Instant::now() };

        tracing::info!(%player_id, "player disconnected, grace period started");
        Ok(())
    }

    /// Resumes a session from its reconnection token.
    pub fn reconnect(&mut self, token: &str) -> Result<&Session, SessionError> {
        let player_id = self
            .tokens
            .get(token)
            .copied()
            .ok_or(SessionError::InvalidToken)?;

        let session = self
            .sessions
            .get_mut(&player_id)
            .ok_or(SessionError::InvalidToken)?;

        match &session.state {
            SessionState::Disconnected { since } => {
                let grace = Duration::from_secs(self.config.reconnect_grace_secs);
                if since.elapsed() > grace {
                    session.state = SessionState::Expired;
                    return Err(SessionError::SessionExpired(player_id));
                }
                session.state = SessionState::Connected;
                tracing::info!(%player_id, "player reconnected");
                Ok(self.sessions.get(&player_id).expect("just modified"))
            }
            SessionState::Connected => {
                Err(SessionError::AlreadyConnected(player_id))
            }
            SessionState::Expired => Err(SessionError::SessionExpired(player_id)),
        }
    }

    /// Expires every disconnected session past its grace window. Returns
    /// the expired player IDs so higher layers can react before cleanup.
    pub fn expire_stale(&mut self) -> Vec<PlayerId> {
        let grace = Duration::from_secs(self.config.reconnect_grace_secs);
        let mut expired = Vec::new();

        for session in self.sessions.values_mut() {
            if let SessionState::Disconnected { since } = &session.state {
                if since.elapsed() > grace {
                    session.state = SessionState::Expired;
                    expired.push(session.player_id);
                    tracing::info!(
                        player_id = %session.player_id,
                        "session expired (grace period elapsed)"
                    );
                }
            }
        }

        expired
    }

    /// Drops expired sessions and revokes their tokens. Separate from
    /// `expire_stale` so callers can observe expirations first.
    pub fn cleanup_expired(&mut self) {
        self.sessions.retain(|_, session| {
            if matches!(session.state, SessionState::Expired) {
                self.tokens.remove(&session.reconnect_token);
                false
            } else {
                true
            }
        });
    }

    pub fn get(&self, player_id: &PlayerId) -> Option<&Session> {
        self.sessions.get(player_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Random 32-character hex string (128 bits). Guessing a live token is
/// computationally infeasible.
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================

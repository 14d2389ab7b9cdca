//! Player session management for Deckforge.
//!
//! This crate handles the lifecycle of player connections:
//!
//! 1. **Authentication** — validating who a player is ([`Authenticator`]
//!    trait, yielding an [`Identity`] with a durable guest key)
//! 2. **Session tracking** — knowing who's connected ([`SessionManager`])
//! 3. **Reconnection** — resuming after brief disconnects (token-based,
//!    with a configurable grace period)
//!
//! The session layer knows nothing about rooms or cards; it hands the
//! guest key upward and the room layer decides what continuity means.

#![allow(async_fn_in_trait)]

mod auth;
mod error;
mod manager;
mod session;

pub use auth::{Authenticator, Identity};
pub use error::SessionError;
pub use manager::SessionManager;
pub use session::{Session, SessionConfig, SessionState};

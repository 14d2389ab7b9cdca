//! Room lifecycle management for Deckforge.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns one
//! game instance. Commands arrive on a bounded channel, so no two
//! mutations of a room's state ever interleave.
//!
//! # Key types
//!
//! - [`GameLogic`] — the trait a game implements
//! - [`Outcome`] — what a game callback asks the room to do
//! - [`RoomManager`] — creates/destroys rooms, routes players
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`RoomConfig`] — room-level settings (capacity, channel size)

mod config;
mod error;
mod logic;
mod manager;
mod room;

pub use config::RoomConfig;
pub use error::RoomError;
pub use logic::{GameLogic, Outcome};
pub use manager::RoomManager;
pub use room::{PlayerSender, RoomHandle, RoomInfo};

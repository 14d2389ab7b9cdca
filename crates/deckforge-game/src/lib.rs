//! The Deckforge shedding game: an authoritative table for 3–5 players.
//!
//! Players shed a dealt hand over several rounds by beating the current
//! lead with equal-count simple combos or five-card made hands; accepted
//! runs are placed on a shared growable board, rounds are scored by
//! remaining-hand differences, and seats survive reconnects through
//! guest-key continuity.
//!
//! The crate exposes [`ShedGame`], a
//! [`GameLogic`](deckforge_room::GameLogic) implementation; the binary
//! in `main.rs` mounts it on a Deckforge server.

pub mod logic;
pub mod messages;
pub mod round;
pub mod session;
pub mod table;
pub mod turn;

pub use logic::ShedGame;
pub use messages::{Command, GameEvent, RankLine, ScoreLine, SeatSummary};
pub use session::{GameTimer, MAX_PLAYERS, RECONNECT_GRACE};
pub use table::{GameConfig, Lead, Phase, Seat, Table};

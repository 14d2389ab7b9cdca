//! Session continuity: joins, reconnection, the disconnect grace window,
//! and host migration.
//!
//! A seat belongs to a guest key, not a session id. Joining with a known
//! key migrates the existing seat to the new session in place; dropping
//! the connection only marks the seat and starts a grace timer, and the
//! timer re-checks the connected flag when it fires so a reconnection
//! inside the window implicitly cancels the removal.

use std::time::Duration;

use deckforge_protocol::{PlayerId, Recipient};
use deckforge_room::Outcome;

use crate::ShedGame;
use crate::messages::GameEvent;
use crate::table::{Phase, Seat, Table};

/// How long a disconnected seat is held open.
pub const RECONNECT_GRACE: Duration = Duration::from_secs(20);

/// Seats at the table. Also the room capacity reported to matchmaking.
pub const MAX_PLAYERS: usize = 5;

/// A deferred event the game schedules through the room actor.
#[derive(Debug, Clone)]
pub enum GameTimer {
    /// A disconnect grace window elapsed. Keyed by guest key so a seat
    /// migrated to a new session id in the meantime is still found — and
    /// found connected, which voids the timer.
    GraceExpired { guest_key: String },
}

/// A connection wants a seat. Known guest key → migrate; unknown →
/// create, but only while no match is running.
pub fn join(
    state: &mut Table,
    player: PlayerId,
    guest_key: &str,
) -> Result<Outcome<ShedGame>, String> {
    if let Some(old_id) = state.seat_for_guest_key(guest_key) {
        return Ok(migrate_seat(state, old_id, player));
    }

    if state.phase == Phase::Playing {
        return Err("match in progress".into());
    }
    if state.seats.len() >= MAX_PLAYERS {
        return Err("table full".into());
    }

    state.rotation.insert(0, player);
    state.seats.insert(player, Seat::new(player, guest_key));
    state.ever_joined = true;
    if state.host.is_none() {
        state.host = Some(player);
    }

    tracing::info!(player_id = %player, "seat created");

    Ok(Outcome::none()
        .tell(Recipient::Player(player), state.roster_event())
        .tell(
            Recipient::AllExcept(player),
            GameEvent::PlayerJoined { player_id: player },
        ))
}

/// Moves an existing seat onto a new session id: rotation entry and host
/// pointer are rewritten, the old session is evicted from the room, and
/// the rejoiner gets a private resync.
fn migrate_seat(
    state: &mut Table,
    old_id: PlayerId,
    new_id: PlayerId,
) -> Outcome<ShedGame> {
    let Some(mut seat) = state.seats.remove(&old_id) else {
        return Outcome::none();
    };
    seat.player_id = new_id;
    seat.connected = true;
    state.seats.insert(new_id, seat);

    for slot in state.rotation.iter_mut() {
        if *slot == old_id {
            *slot = new_id;
        }
    }
    if state.host == Some(old_id) {
        state.host = Some(new_id);
    }

    tracing::info!(
        old_id = %old_id,
        new_id = %new_id,
        "seat migrated to new session"
    );

    let mut outcome = Outcome::none()
        .tell(Recipient::Player(new_id), state.resync_event(new_id))
        .tell(
            Recipient::AllExcept(new_id),
            GameEvent::PlayerReconnected { player_id: new_id },
        );
    if old_id != new_id {
        outcome = outcome.evicting(old_id);
    }
    outcome
}

/// The player's connection is gone. The seat survives; a grace timer
/// decides whether the departure sticks.
pub fn disconnect(state: &mut Table, player: PlayerId) -> Outcome<ShedGame> {
    let Some(seat) = state.seats.get_mut(&player) else {
        return Outcome::none();
    };
    seat.connected = false;
    let guest_key = seat.guest_key.clone();

    tracing::debug!(player_id = %player, "seat disconnected, grace started");

    Outcome::none()
        .broadcast(GameEvent::PlayerDisconnected { player_id: player })
        .schedule(GameTimer::GraceExpired { guest_key }, RECONNECT_GRACE)
}

/// A grace timer fired. Validity is decided NOW, against current state:
/// a seat that reconnected (under any session id) is left alone.
pub fn grace_expired(state: &mut Table, guest_key: &str) -> Outcome<ShedGame> {
    let Some(player) = state.seat_for_guest_key(guest_key) else {
        return Outcome::none();
    };
    if state.seats.get(&player).is_some_and(|s| s.connected) {
        return Outcome::none();
    }
    remove_seat(state, player)
}

/// Permanently removes a seat, repairing the turn machinery around the
/// hole it leaves.
pub fn remove_seat(state: &mut Table, player: PlayerId) -> Outcome<ShedGame> {
    let Some(idx) = state.seat_index(player) else {
        return Outcome::none();
    };
    state.rotation.remove(idx);
    state.seats.remove(&player);

    let mut outcome = Outcome::none()
        .broadcast(GameEvent::PlayerLeft { player_id: player })
        .evicting(player);

    tracing::info!(player_id = %player, "seat removed after grace");

    if state.rotation.is_empty() {
        state.host = None;
        return outcome;
    }

    // Turn index: seats before the hole shift down; if the acting seat
    // itself left, the same index now names the next player.
    if idx < state.turn {
        state.turn -= 1;
    }
    state.turn %= state.rotation.len();

    // Lead bookkeeping. If the lead-holder left, nobody remains for the
    // index-wrap to land on, so the cycle closes here.
    match state.last_accepted {
        Some(la) if idx < la => {
            state.last_accepted = Some(la - 1);
            if let Some(lead) = state.lead.as_mut() {
                lead.leader = la - 1;
            }
        }
        Some(la) if idx == la => {
            state.last_accepted = None;
            if state.lead.take().is_some() {
                outcome = outcome.broadcast(GameEvent::CycleClosed {
                    leader: state.rotation[state.turn],
                });
            }
        }
        _ => {}
    }

    // The departure may have pushed the passed count over the threshold.
    let passed = state.seats.values().filter(|s| s.passed).count();
    if state.rotation.len() >= 2 && passed >= state.rotation.len() - 1 && passed > 0
    {
        for seat in state.seats.values_mut() {
            seat.passed = false;
        }
        outcome = outcome.broadcast(GameEvent::PassesCleared);
    }

    if state.host == Some(player) {
        state.host = state.rotation.first().copied();
        if let Some(host) = state.host {
            outcome = outcome.broadcast(GameEvent::HostChanged { host });
        }
    }

    outcome
}

//! The turn/cycle state machine: submissions, passes, and the two
//! independent cycle triggers.
//!
//! The only steady state is "awaiting a submission from the acting
//! player". A rejected action changes nothing and keeps the turn; an
//! accepted submission updates the lead, places the run on the board, and
//! advances. The passed-count trigger clears flags without touching the
//! lead; the index-wrap trigger clears the lead. They are deliberately
//! separate conditions and may fire in the same command.

use std::collections::HashSet;

use deckforge_cards::evaluate;
use deckforge_cards::Card;
use deckforge_protocol::{PlayerId, Recipient};
use deckforge_room::Outcome;

use crate::ShedGame;
use crate::messages::GameEvent;
use crate::round;
use crate::table::{Lead, Phase, Table};

/// A private refusal to the originator; state untouched.
pub(crate) fn reject(player: PlayerId, reason: &str) -> Outcome<ShedGame> {
    Outcome::none().tell(
        Recipient::Player(player),
        GameEvent::Rejected { reason: reason.into() },
    )
}

/// Handles `Submit`.
pub fn submit(
    state: &mut Table,
    sender: PlayerId,
    cards: Vec<Card>,
) -> Outcome<ShedGame> {
    if state.phase != Phase::Playing {
        return reject(sender, "match_not_started");
    }
    let Some(idx) = state.seat_index(sender) else {
        return reject(sender, "unknown_player");
    };
    if idx != state.turn {
        return reject(sender, "not_your_turn");
    }

    match cards.len() {
        0 => return reject(sender, "empty_submission"),
        4 => return reject(sender, "four_card_submission"),
        _ => {}
    }

    {
        let Some(seat) = state.seats.get(&sender) else {
            return reject(sender, "unknown_player");
        };
        let mut seen = HashSet::new();
        if !cards.iter().all(|c| seen.insert(*c))
            || !cards.iter().all(|c| seat.hand.contains(c))
        {
            return reject(sender, "cards_not_held");
        }
    }

    let Some(combo) = evaluate(&cards, state.range) else {
        return reject(sender, "invalid_combo");
    };
    if let Some(lead) = &state.lead {
        if combo.count() != lead.combo.count() {
            return reject(sender, "count_mismatch");
        }
        if !combo.beats(&lead.combo) {
            return reject(sender, "insufficient_value");
        }
    }

    // Accepted.
    let mut outcome = Outcome::none();

    let had_passes = state.seats.values().any(|s| s.passed);
    for seat in state.seats.values_mut() {
        seat.passed = false;
    }
    if had_passes {
        outcome = outcome.broadcast(GameEvent::PassesCleared);
    }

    let turn_id = state.next_turn_id;
    state.next_turn_id += 1;
    let placement = {
        let Table { board, rng, .. } = state;
        board.place(&cards, turn_id, rng)
    };
    let (rows, cols) = state.board.dimensions();

    state.lead = Some(Lead { combo, leader: idx });
    state.last_accepted = Some(idx);

    let hand_empty = {
        let Some(seat) = state.seats.get_mut(&sender) else {
            return Outcome::none();
        };
        seat.hand.retain(|c| !cards.contains(c));
        seat.sorted_hand.retain(|c| !cards.contains(c));
        seat.hand.is_empty()
    };

    let cycle = if hand_empty { None } else { advance_turn(state) };
    let next = (!hand_empty)
        .then(|| state.rotation.get(state.turn).copied())
        .flatten();

    outcome = outcome.broadcast(GameEvent::Submitted {
        player_id: sender,
        cards,
        combo,
        placement,
        rows,
        cols,
        turn_id,
        next,
    });
    if let Some(event) = cycle {
        outcome = outcome.broadcast(event);
    }

    if hand_empty {
        merge(&mut outcome, round::finish_round(state));
    }
    outcome
}

/// Handles `Pass`.
pub fn pass(state: &mut Table, sender: PlayerId) -> Outcome<ShedGame> {
    if state.phase != Phase::Playing {
        return reject(sender, "match_not_started");
    }
    let Some(idx) = state.seat_index(sender) else {
        return reject(sender, "unknown_player");
    };
    if idx != state.turn {
        return reject(sender, "not_your_turn");
    }

    if let Some(seat) = state.seats.get_mut(&sender) {
        seat.passed = true;
    }

    let cycle = advance_turn(state);
    let next = state.rotation[state.turn];

    let mut outcome = Outcome::none()
        .broadcast(GameEvent::Passed { player_id: sender, next });
    if let Some(event) = cycle {
        outcome = outcome.broadcast(event);
    }

    // Independent trigger: everyone but one has passed. Flags clear; the
    // lead does NOT.
    let passed = state.seats.values().filter(|s| s.passed).count();
    if passed >= state.rotation.len().saturating_sub(1) && passed > 0 {
        for seat in state.seats.values_mut() {
            seat.passed = false;
        }
        outcome = outcome.broadcast(GameEvent::PassesCleared);
    }

    outcome
}

/// Advances the turn one seat. When the new index is the last accepted
/// submitter's, the cycle closes: the lead clears and the returned event
/// announces an open lead.
pub(crate) fn advance_turn(state: &mut Table) -> Option<GameEvent> {
    if state.rotation.is_empty() {
        return None;
    }
    state.turn = (state.turn + 1) % state.rotation.len();
    if state.last_accepted == Some(state.turn) {
        state.lead = None;
        state.last_accepted = None;
        return Some(GameEvent::CycleClosed {
            leader: state.rotation[state.turn],
        });
    }
    None
}

/// Appends everything `extra` asks for onto `outcome`, preserving order.
pub(crate) fn merge(outcome: &mut Outcome<ShedGame>, extra: Outcome<ShedGame>) {
    outcome.messages.extend(extra.messages);
    outcome.timers.extend(extra.timers);
    outcome.evict.extend(extra.evict);
}

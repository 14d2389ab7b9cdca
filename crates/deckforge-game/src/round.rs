//! Round lifecycle: dealing, scoring, match end, and rematch reset.

use deckforge_cards::{
    ScoreInput, aggregate_deltas, deal, net_transfers, opening_holder,
    rank_players, shuffled_deck, strong_count, transfer_matrix,
};
use deckforge_protocol::Recipient;
use deckforge_room::Outcome;

use crate::ShedGame;
use crate::messages::{GameEvent, RankLine, ScoreLine};
use crate::table::{Phase, STARTING_BALANCE, Table};
use crate::turn::merge;

/// Deals a fresh round: reshuffle, round-robin deal, opening-card holder
/// acts first.
///
/// A deal without the opening card is a deck bug, not a game situation:
/// the round aborts loudly and the match ends rather than guessing a
/// leader.
pub fn start_round(state: &mut Table) -> Outcome<ShedGame> {
    state.board.reset();
    state.lead = None;
    state.last_accepted = None;
    for seat in state.seats.values_mut() {
        seat.passed = false;
    }

    let deck = {
        let Table { range, rng, .. } = state;
        shuffled_deck(*range, rng)
    };
    let hands = match deal(&deck, state.rotation.len()) {
        Ok(hands) => hands,
        Err(e) => {
            tracing::error!(error = %e, round = state.round, "deal failed");
            state.phase = Phase::Over;
            return Outcome::none()
                .broadcast(GameEvent::Fault { reason: "deal_failed".into() });
        }
    };

    let Some(first) = opening_holder(&hands, state.range) else {
        tracing::error!(
            round = state.round,
            players = state.rotation.len(),
            "opening card missing after a full deal"
        );
        state.phase = Phase::Over;
        return Outcome::none().broadcast(GameEvent::Fault {
            reason: "opening_card_missing".into(),
        });
    };
    state.turn = first;

    let mut outcome = Outcome::none().broadcast(GameEvent::RoundStarted {
        round: state.round,
        rotation: state.rotation.clone(),
        first: state.rotation[first],
    });

    for (i, hand) in hands.into_iter().enumerate() {
        let player = state.rotation[i];
        if let Some(seat) = state.seats.get_mut(&player) {
            seat.hand = hand.clone();
            seat.sorted_hand = hand.clone();
            outcome = outcome.tell(
                Recipient::Player(player),
                GameEvent::HandDealt { round: state.round, hand },
            );
        }
    }

    tracing::info!(
        round = state.round,
        first = %state.rotation[first],
        "round dealt"
    );

    outcome
}

/// A hand emptied: score the round, move the coins, and either deal the
/// next round or end the match.
pub fn finish_round(state: &mut Table) -> Outcome<ShedGame> {
    let inputs: Vec<ScoreInput> = state
        .rotation
        .iter()
        .filter_map(|id| state.seats.get(id))
        .map(|seat| ScoreInput {
            hand: seat.hand.len() as u64,
            strong: strong_count(&seat.hand, state.range),
        })
        .collect();

    let aggregate = aggregate_deltas(&inputs);
    let matrix = transfer_matrix(&inputs);
    let nets = net_transfers(&matrix);

    let mut scores = Vec::with_capacity(state.rotation.len());
    for (i, player) in state.rotation.clone().into_iter().enumerate() {
        if let Some(seat) = state.seats.get_mut(&player) {
            seat.balance += nets[i];
            scores.push(ScoreLine {
                player_id: player,
                gained: aggregate[i],
                balance: seat.balance,
            });
        }
    }

    let easy = state.seats.values().any(|s| s.easy_display);
    let mut outcome = Outcome::none().broadcast(GameEvent::RoundScored {
        round: state.round,
        scores,
        matrix: easy.then_some(matrix),
    });

    state.round += 1;
    if state.round > state.total_rounds {
        merge(&mut outcome, end_game(state));
    } else {
        merge(&mut outcome, start_round(state));
    }
    outcome
}

/// The configured rounds are done: broadcast final standings and park the
/// table for a rematch.
fn end_game(state: &mut Table) -> Outcome<ShedGame> {
    let standings: Vec<(deckforge_protocol::PlayerId, i64)> = state
        .rotation
        .iter()
        .filter_map(|id| state.seats.get(id))
        .map(|seat| (seat.player_id, seat.balance))
        .collect();
    let ranks = rank_players(&standings);

    let lines: Vec<RankLine> = ranks
        .into_iter()
        .map(|(player_id, rank)| RankLine {
            player_id,
            score: state
                .seats
                .get(&player_id)
                .map(|s| s.balance)
                .unwrap_or_default(),
            rank,
        })
        .collect();

    state.phase = Phase::Over;
    state.round = 0;
    state.clear_round_state();
    for seat in state.seats.values_mut() {
        seat.ready = false;
    }

    tracing::info!("match ended");

    Outcome::none().broadcast(GameEvent::GameEnded { standings: lines })
}

/// `PlayAgain`: back to the lobby. Seats and nicknames persist; balances
/// and per-round state reset.
pub fn reset_for_rematch(state: &mut Table) -> Outcome<ShedGame> {
    state.phase = Phase::Lobby;
    state.round = 0;
    state.clear_round_state();
    for seat in state.seats.values_mut() {
        seat.balance = STARTING_BALANCE;
        seat.ready = false;
    }

    tracing::info!("table reset for rematch");

    Outcome::none().broadcast(state.roster_event())
}

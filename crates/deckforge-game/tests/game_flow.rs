//! End-to-end tests for the shedding game state machine, driven directly
//! through the `GameLogic` callbacks.

use deckforge_cards::{Card, RankRange};
use deckforge_game::{
    Command, GameConfig, GameEvent, GameTimer, Phase, Seat, ShedGame, Table,
};
use deckforge_protocol::{PlayerId, Recipient};
use deckforge_room::{GameLogic, Outcome};

// =========================================================================
// Helpers
// =========================================================================

/// Builds a lobby by joining players 1..=n (guest keys "guest-{i}").
/// Front insertion means the rotation ends up [n, .., 2, 1]; player 1 is
/// host.
fn lobby(n: u64) -> Table {
    let mut t = Table::new(&GameConfig::default());
    for i in 1..=n {
        ShedGame::on_join(&mut t, PlayerId(i), &format!("guest-{i}"))
            .expect("join should succeed");
    }
    t
}

/// Builds a mid-round table with fixed hands: player i+1 sits at rotation
/// index i, player 1 acting. Bypasses the deal so tests control every
/// card.
fn playing(hands: &[&[u8]]) -> Table {
    let mut t = Table::new(&GameConfig::default());
    for (i, hand) in hands.iter().enumerate() {
        let pid = PlayerId(i as u64 + 1);
        t.rotation.push(pid);
        let mut seat = Seat::new(pid, &format!("guest-{}", i + 1));
        seat.hand = hand.iter().map(|c| Card(*c)).collect();
        seat.sorted_hand = seat.hand.clone();
        t.seats.insert(pid, seat);
    }
    t.ever_joined = true;
    t.host = Some(PlayerId(1));
    t.phase = Phase::Playing;
    t.range = RankRange::for_player_count(hands.len());
    t.round = 1;
    t
}

fn cmd(t: &mut Table, player: u64, command: Command) -> Outcome<ShedGame> {
    ShedGame::handle_message(t, PlayerId(player), command)
}

fn submit(t: &mut Table, player: u64, cards: &[u8]) -> Outcome<ShedGame> {
    cmd(t, player, Command::Submit {
        cards: cards.iter().map(|c| Card(*c)).collect(),
    })
}

fn rejected_with(outcome: &Outcome<ShedGame>, expected: &str) -> bool {
    outcome.messages.iter().any(|(_, ev)| {
        matches!(ev, GameEvent::Rejected { reason } if reason == expected)
    })
}

fn has_event(
    outcome: &Outcome<ShedGame>,
    pred: impl Fn(&GameEvent) -> bool,
) -> bool {
    outcome.messages.iter().any(|(_, ev)| pred(ev))
}

/// Makes everyone ready and starts the match from the host seat.
fn start(t: &mut Table) -> Outcome<ShedGame> {
    for i in 1..=t.rotation.len() as u64 {
        cmd(t, i, Command::Ready { ready: true });
    }
    cmd(t, 1, Command::Start)
}

// =========================================================================
// Lobby
// =========================================================================

#[test]
fn test_lobby_join_order_and_host() {
    let t = lobby(3);
    assert_eq!(t.rotation, vec![PlayerId(3), PlayerId(2), PlayerId(1)]);
    assert_eq!(t.host, Some(PlayerId(1)));
    assert_eq!(t.phase, Phase::Lobby);
}

#[test]
fn test_set_nickname_rejects_empty_and_duplicate() {
    let mut t = lobby(2);

    let out = cmd(&mut t, 1, Command::SetNickname { name: "  ".into() });
    assert!(rejected_with(&out, "empty_nickname"));

    cmd(&mut t, 1, Command::SetNickname { name: "ada".into() });
    let out = cmd(&mut t, 2, Command::SetNickname { name: "ada".into() });
    assert!(rejected_with(&out, "duplicate_nickname"));
    assert_eq!(t.seats[&PlayerId(2)].nickname, "");
}

#[test]
fn test_start_requires_host_count_and_readiness() {
    let mut t = lobby(2);
    for i in 1..=2 {
        cmd(&mut t, i, Command::Ready { ready: true });
    }
    let out = cmd(&mut t, 1, Command::Start);
    assert!(rejected_with(&out, "not_enough_players"));

    let mut t = lobby(3);
    let out = cmd(&mut t, 2, Command::Start);
    assert!(rejected_with(&out, "not_host"));

    cmd(&mut t, 1, Command::Ready { ready: true });
    let out = cmd(&mut t, 1, Command::Start);
    assert!(rejected_with(&out, "not_all_ready"));
    assert_eq!(t.phase, Phase::Lobby);
}

#[test]
fn test_change_rounds_host_only_pre_game() {
    let mut t = lobby(3);
    let out = cmd(&mut t, 2, Command::ChangeRounds { rounds: 5 });
    assert!(rejected_with(&out, "not_host"));

    let out = cmd(&mut t, 1, Command::ChangeRounds { rounds: 0 });
    assert!(rejected_with(&out, "invalid_rounds"));

    cmd(&mut t, 1, Command::ChangeRounds { rounds: 5 });
    assert_eq!(t.total_rounds, 5);
}

#[test]
fn test_start_deals_evenly_and_opening_holder_acts_first() {
    let mut t = lobby(3);
    let out = start(&mut t);

    assert_eq!(t.phase, Phase::Playing);
    assert_eq!(t.round, 1);
    assert_eq!(t.range, RankRange::for_player_count(3));

    // 36 cards, 12 each, no duplicates.
    let mut all: Vec<Card> = Vec::new();
    for id in &t.rotation {
        assert_eq!(t.seats[id].hand.len(), 12);
        all.extend(&t.seats[id].hand);
    }
    all.sort_unstable();
    all.dedup();
    assert_eq!(all.len(), 36);

    // The opening card (suit 0, display rank 3) decides who leads.
    let holder = t
        .rotation
        .iter()
        .find(|id| t.seats[id].hand.contains(&Card(2)))
        .copied()
        .expect("opening card must be dealt");
    assert_eq!(t.acting_player(), Some(holder));

    assert!(has_event(&out, |ev| matches!(
        ev,
        GameEvent::RoundStarted { round: 1, first, .. } if *first == holder
    )));
    // One private hand per player.
    let hand_events = out
        .messages
        .iter()
        .filter(|(to, ev)| {
            matches!(ev, GameEvent::HandDealt { .. })
                && matches!(to, Recipient::Player(_))
        })
        .count();
    assert_eq!(hand_events, 3);
}

// =========================================================================
// Submissions
// =========================================================================

#[test]
fn test_submit_out_of_turn_rejected() {
    let mut t = playing(&[&[2, 5], &[3, 7], &[4, 8]]);
    let out = submit(&mut t, 2, &[3]);
    assert!(rejected_with(&out, "not_your_turn"));
    assert_eq!(t.turn, 0);
    assert_eq!(t.seats[&PlayerId(2)].hand.len(), 2);
}

#[test]
fn test_submit_wrong_sizes_rejected() {
    let mut t = playing(&[&[2, 3, 4, 5, 6, 7], &[8, 9], &[10, 11]]);

    let out = submit(&mut t, 1, &[]);
    assert!(rejected_with(&out, "empty_submission"));

    let out = submit(&mut t, 1, &[2, 3, 4, 5]);
    assert!(rejected_with(&out, "four_card_submission"));
}

#[test]
fn test_submit_cards_not_held_rejected() {
    let mut t = playing(&[&[2, 5], &[3, 7], &[4, 8]]);

    let out = submit(&mut t, 1, &[3]);
    assert!(rejected_with(&out, "cards_not_held"));

    // A duplicated card is not "held twice".
    let mut t = playing(&[&[2, 11, 20], &[3, 7], &[4, 8]]);
    let out = submit(&mut t, 1, &[2, 2]);
    assert!(rejected_with(&out, "cards_not_held"));
}

#[test]
fn test_submit_mixed_ranks_invalid() {
    let mut t = playing(&[&[2, 3], &[4, 5], &[6, 7]]);
    let out = submit(&mut t, 1, &[2, 3]);
    assert!(rejected_with(&out, "invalid_combo"));
}

#[test]
fn test_open_lead_accepts_any_single() {
    let mut t = playing(&[&[2, 5], &[3, 7], &[4, 8]]);
    let out = submit(&mut t, 1, &[2]);

    assert!(has_event(&out, |ev| matches!(
        ev,
        GameEvent::Submitted { player_id, next, turn_id: 1, .. }
            if *player_id == PlayerId(1) && *next == Some(PlayerId(2))
    )));
    assert!(t.lead.is_some());
    assert_eq!(t.last_accepted, Some(0));
    assert_eq!(t.turn, 1);
    assert_eq!(t.seats[&PlayerId(1)].hand, vec![Card(5)]);
    assert_eq!(t.board.snapshot().len(), 1);
}

#[test]
fn test_follow_up_must_match_count_and_beat_value() {
    // Card(3): internal rank 1, value 9. Card(2): internal rank 0.
    // Cards 4 and 13 are a display-5 pair; Card(31): suit 3, display 5,
    // internal rank 2, value 21.
    let mut t = playing(&[&[3, 30], &[2, 4, 13, 31], &[5, 32]]);
    submit(&mut t, 1, &[3]);

    let out = submit(&mut t, 2, &[4, 13]);
    assert!(rejected_with(&out, "count_mismatch"));

    let out = submit(&mut t, 2, &[2]);
    assert!(rejected_with(&out, "insufficient_value"));
    assert_eq!(t.turn, 1, "rejected player keeps the turn");

    let out = submit(&mut t, 2, &[31]);
    assert!(has_event(&out, |ev| matches!(
        ev,
        GameEvent::Submitted { player_id, .. } if *player_id == PlayerId(2)
    )));
    assert_eq!(t.last_accepted, Some(1));
}

#[test]
fn test_accept_clears_passed_flags() {
    let mut t = playing(&[&[3, 30], &[5, 31], &[4, 32]]);
    submit(&mut t, 1, &[3]);
    cmd(&mut t, 2, Command::Pass);
    assert!(t.seats[&PlayerId(2)].passed);

    let out = submit(&mut t, 3, &[32]);
    assert!(has_event(&out, |ev| matches!(ev, GameEvent::PassesCleared)));
    assert!(!t.seats[&PlayerId(2)].passed);
    assert!(t.lead.is_some(), "an accept never clears the lead");
}

// =========================================================================
// The two cycle triggers
// =========================================================================

#[test]
fn test_pass_trigger_fires_alone_on_open_lead() {
    // No lead yet: passes can hit player_count - 1 with no wrap target.
    let mut t = playing(&[&[2, 5], &[3, 7], &[4, 8]]);
    cmd(&mut t, 1, Command::Pass);
    let out = cmd(&mut t, 2, Command::Pass);

    assert!(has_event(&out, |ev| matches!(ev, GameEvent::PassesCleared)));
    assert!(
        !has_event(&out, |ev| matches!(ev, GameEvent::CycleClosed { .. })),
        "no accepted submission, so no cycle to close"
    );
    assert!(t.seats.values().all(|s| !s.passed));
    assert_eq!(t.turn, 2);
}

#[test]
fn test_index_wrap_closes_cycle_and_clears_lead() {
    let mut t = playing(&[&[3, 30], &[5, 31], &[4, 32]]);
    submit(&mut t, 1, &[3]);
    cmd(&mut t, 2, Command::Pass);
    let out = cmd(&mut t, 3, Command::Pass);

    // The turn wrapped onto the leader: both triggers fire in this one
    // command, independently.
    assert!(has_event(&out, |ev| matches!(
        ev,
        GameEvent::CycleClosed { leader } if *leader == PlayerId(1)
    )));
    assert!(has_event(&out, |ev| matches!(ev, GameEvent::PassesCleared)));
    assert!(t.lead.is_none());
    assert_eq!(t.last_accepted, None);
    assert_eq!(t.turn, 0, "leader is free to open the next cycle");

    // And the reopened lead accepts any single again.
    let out = submit(&mut t, 1, &[30]);
    assert!(has_event(&out, |ev| matches!(
        ev,
        GameEvent::Submitted { player_id, .. } if *player_id == PlayerId(1)
    )));
}

// =========================================================================
// Rounds, scoring, match end
// =========================================================================

#[test]
fn test_round_end_scores_and_ends_single_round_match() {
    // P1 sheds their last card; hands left: P1=0, P2=2, P3=3.
    let mut t = playing(&[&[2], &[3, 12], &[4, 13, 22]]);
    t.total_rounds = 1;

    let out = submit(&mut t, 1, &[2]);

    // Aggregate: max_hand 3; no strong cards held → gains 3, 1, 0.
    assert!(has_event(&out, |ev| match ev {
        GameEvent::RoundScored { round: 1, scores, matrix } => {
            matrix.is_none()
                && scores.iter().map(|s| s.gained).collect::<Vec<_>>()
                    == vec![3, 1, 0]
        }
        _ => false,
    }));

    // Net transfers: P1 +5, P2 -1, P3 -4.
    assert_eq!(t.seats[&PlayerId(1)].balance, 105);
    assert_eq!(t.seats[&PlayerId(2)].balance, 99);
    assert_eq!(t.seats[&PlayerId(3)].balance, 96);

    assert!(has_event(&out, |ev| match ev {
        GameEvent::GameEnded { standings } => {
            standings.iter().map(|l| (l.player_id, l.rank)).collect::<Vec<_>>()
                == vec![
                    (PlayerId(1), 1),
                    (PlayerId(2), 2),
                    (PlayerId(3), 3),
                ]
        }
        _ => false,
    }));
    assert_eq!(t.phase, Phase::Over);
}

#[test]
fn test_round_scores_include_matrix_for_easy_display() {
    let mut t = playing(&[&[2], &[3, 12], &[4, 13, 22]]);
    t.total_rounds = 1;
    cmd(&mut t, 2, Command::SetDisplayMode { easy: true });

    let out = submit(&mut t, 1, &[2]);
    assert!(has_event(&out, |ev| matches!(
        ev,
        GameEvent::RoundScored { matrix: Some(_), .. }
    )));
}

#[test]
fn test_round_end_deals_next_round_with_rounds_remaining() {
    let mut t = playing(&[&[2], &[3, 12], &[4, 13, 22]]);
    assert_eq!(t.total_rounds, 3);

    let out = submit(&mut t, 1, &[2]);

    assert_eq!(t.round, 2);
    assert_eq!(t.phase, Phase::Playing);
    assert!(has_event(&out, |ev| matches!(
        ev,
        GameEvent::RoundStarted { round: 2, .. }
    )));
    // Fresh full deal replaces the stub hands.
    for id in &t.rotation {
        assert_eq!(t.seats[id].hand.len(), 12);
    }
    // The new opening-card holder acts first.
    let holder = t
        .rotation
        .iter()
        .find(|id| t.seats[id].hand.contains(&Card(2)))
        .copied()
        .unwrap();
    assert_eq!(t.acting_player(), Some(holder));
    assert!(t.lead.is_none());
    assert_eq!(t.board.snapshot().len(), 0, "board resets between rounds");
}

#[test]
fn test_play_again_resets_match_but_keeps_seats() {
    let mut t = playing(&[&[2], &[3, 12], &[4, 13, 22]]);
    t.total_rounds = 1;
    cmd(&mut t, 1, Command::SetNickname { name: "ada".into() });
    submit(&mut t, 1, &[2]);
    assert_eq!(t.phase, Phase::Over);

    let out = cmd(&mut t, 2, Command::PlayAgain);

    assert_eq!(t.phase, Phase::Lobby);
    assert_eq!(t.rotation.len(), 3);
    assert_eq!(t.seats[&PlayerId(1)].nickname, "ada");
    assert!(t.seats.values().all(|s| s.balance == 100));
    assert!(t.seats.values().all(|s| s.hand.is_empty() && !s.ready));
    assert!(has_event(&out, |ev| matches!(ev, GameEvent::Roster { .. })));
}

#[test]
fn test_play_again_rejected_mid_match() {
    let mut t = playing(&[&[2, 5], &[3, 7], &[4, 8]]);
    let out = cmd(&mut t, 1, Command::PlayAgain);
    assert!(rejected_with(&out, "match_not_over"));
}

// =========================================================================
// Cosmetic commands
// =========================================================================

#[test]
fn test_sort_hand_requires_permutation() {
    let mut t = playing(&[&[2, 5, 11], &[3, 7], &[4, 8]]);

    let out = cmd(&mut t, 1, Command::SortHand {
        cards: vec![Card(11), Card(2)],
    });
    assert!(rejected_with(&out, "not_a_permutation"));

    let out = cmd(&mut t, 1, Command::SortHand {
        cards: vec![Card(11), Card(2), Card(5)],
    });
    assert!(has_event(&out, |ev| matches!(ev, GameEvent::HandSorted)));
    assert_eq!(
        t.seats[&PlayerId(1)].sorted_hand,
        vec![Card(11), Card(2), Card(5)]
    );
    assert_eq!(
        t.seats[&PlayerId(1)].hand,
        vec![Card(2), Card(5), Card(11)],
        "the real hand is untouched"
    );
}

#[test]
fn test_display_mode_announced_to_others_only() {
    let mut t = playing(&[&[2], &[3], &[4]]);
    let out = cmd(&mut t, 1, Command::SetDisplayMode { easy: true });

    assert!(out.messages.iter().any(|(to, ev)| {
        *to == Recipient::AllExcept(PlayerId(1))
            && matches!(ev, GameEvent::DisplayModeChanged { easy: true, .. })
    }));
    assert!(t.seats[&PlayerId(1)].easy_display);
}

// =========================================================================
// Session continuity
// =========================================================================

#[test]
fn test_reconnect_mid_match_preserves_hand_rotation_and_host() {
    let mut t = lobby(3);
    start(&mut t);
    let rotation_before = t.rotation.clone();
    let hand_before = t.seats[&PlayerId(1)].hand.clone();
    assert_eq!(t.host, Some(PlayerId(1)));

    ShedGame::on_disconnect(&mut t, PlayerId(1));
    let out = ShedGame::on_join(&mut t, PlayerId(99), "guest-1")
        .expect("rejoin with a known key must succeed mid-match");

    let expected: Vec<PlayerId> = rotation_before
        .iter()
        .map(|p| if *p == PlayerId(1) { PlayerId(99) } else { *p })
        .collect();
    assert_eq!(t.rotation, expected);
    assert_eq!(t.host, Some(PlayerId(99)));
    assert_eq!(t.seats[&PlayerId(99)].hand, hand_before);
    assert_eq!(out.evict, vec![PlayerId(1)]);
    assert!(out.messages.iter().any(|(to, ev)| {
        *to == Recipient::Player(PlayerId(99))
            && matches!(ev, GameEvent::Resync { hand, .. } if *hand == hand_before)
    }));
}

#[test]
fn test_expired_seat_rejoins_as_fresh_player_in_lobby() {
    let mut t = lobby(3);
    cmd(&mut t, 2, Command::SetNickname { name: "old".into() });

    ShedGame::on_disconnect(&mut t, PlayerId(2));
    ShedGame::on_timer(&mut t, GameTimer::GraceExpired {
        guest_key: "guest-2".into(),
    });
    assert_eq!(t.rotation.len(), 2);

    // Same guest key, after the window: a brand-new seat.
    ShedGame::on_join(&mut t, PlayerId(7), "guest-2").unwrap();
    let seat = &t.seats[&PlayerId(7)];
    assert!(seat.hand.is_empty());
    assert_eq!(seat.nickname, "");
    assert_eq!(seat.balance, 100);
    assert_eq!(t.rotation[0], PlayerId(7), "new seats join at the front");
}

#[test]
fn test_acting_player_removal_repairs_turn() {
    let mut t = playing(&[&[3, 30], &[5, 31], &[4, 32]]);
    submit(&mut t, 1, &[3]); // turn -> P2 (index 1)

    ShedGame::on_disconnect(&mut t, PlayerId(2));
    ShedGame::on_timer(&mut t, GameTimer::GraceExpired {
        guest_key: "guest-2".into(),
    });

    assert_eq!(t.rotation, vec![PlayerId(1), PlayerId(3)]);
    assert_eq!(t.acting_player(), Some(PlayerId(3)));
    assert_eq!(t.last_accepted, Some(0), "leader index unchanged before hole");
}

#[test]
fn test_abandonment_requires_a_prior_join() {
    let t = Table::new(&GameConfig::default());
    assert!(!ShedGame::is_abandoned(&t), "a fresh empty table is not abandoned");

    let mut t = lobby(1);
    ShedGame::on_disconnect(&mut t, PlayerId(1));
    ShedGame::on_timer(&mut t, GameTimer::GraceExpired {
        guest_key: "guest-1".into(),
    });
    assert!(ShedGame::is_abandoned(&t));
}

//! The game's wire vocabulary: inbound commands and outbound events.
//!
//! `Command` is a closed tagged union — serde rejects unknown variant
//! names and malformed payloads at the decode boundary, so nothing
//! unvalidated ever reaches the state machine. `GameEvent` is everything
//! the server can say back, broadcast or targeted.

use deckforge_cards::{Card, Combo, PlacedCard, Placement};
use deckforge_protocol::PlayerId;
use serde::{Deserialize, Serialize};

use crate::table::Phase;

/// A player's request to the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// Set the display name. Rejected when empty or already taken at
    /// this table.
    SetNickname { name: String },

    /// Toggle readiness in the lobby.
    Ready { ready: bool },

    /// Host only: start the match. Requires at least 3 seated players,
    /// all ready.
    Start,

    /// Play a combination. Cards are plain encoded integers.
    Submit { cards: Vec<Card> },

    /// Decline to beat the current lead.
    Pass,

    /// Host only, lobby only: change the number of rounds per match.
    ChangeRounds { rounds: u32 },

    /// After a match ends: reset the table for a rematch. Seats and
    /// nicknames persist; balances and round state reset.
    PlayAgain,

    /// Cosmetic: toggle the easy score display. Announced to the other
    /// players; also controls whether round scores include the pairwise
    /// transfer matrix.
    SetDisplayMode { easy: bool },

    /// Store a client-chosen hand order. Must be a permutation of the
    /// actual hand; used only so a resync can restore the player's view.
    SortHand { cards: Vec<Card> },
}

/// One seat as shown in rosters and resync snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatSummary {
    pub player_id: PlayerId,
    pub nickname: String,
    pub balance: i64,
    pub connected: bool,
    pub ready: bool,
    pub hand_count: usize,
}

/// One player's round result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreLine {
    pub player_id: PlayerId,
    /// Aggregate gain this round (always >= 0; the largest hand gains 0).
    pub gained: u64,
    /// Balance after applying the round's net transfers.
    pub balance: i64,
}

/// One player's final standing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankLine {
    pub player_id: PlayerId,
    pub score: i64,
    /// Competition rank: 1, 2, 2, 4 on a tie for second.
    pub rank: u32,
}

/// Everything the table can tell its players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    // -- Lobby & membership --
    /// Full lobby snapshot, sent to a player entering the table and
    /// broadcast after a rematch reset.
    Roster {
        players: Vec<SeatSummary>,
        host: Option<PlayerId>,
        round: u32,
        total_rounds: u32,
    },
    PlayerJoined { player_id: PlayerId },
    PlayerReconnected { player_id: PlayerId },
    PlayerDisconnected { player_id: PlayerId },
    PlayerLeft { player_id: PlayerId },
    HostChanged { host: PlayerId },
    NicknameSet { player_id: PlayerId, name: String },
    ReadyChanged { player_id: PlayerId, ready: bool },
    RoundsChanged { rounds: u32 },
    DisplayModeChanged { player_id: PlayerId, easy: bool },

    // -- Rounds & turns --
    RoundStarted {
        round: u32,
        rotation: Vec<PlayerId>,
        first: PlayerId,
    },
    /// Private: the recipient's dealt hand.
    HandDealt { round: u32, hand: Vec<Card> },
    Submitted {
        player_id: PlayerId,
        cards: Vec<Card>,
        combo: Combo,
        placement: Placement,
        rows: usize,
        cols: usize,
        turn_id: u64,
        /// Next player to act; `None` when this submission ended the
        /// round.
        next: Option<PlayerId>,
    },
    Passed { player_id: PlayerId, next: PlayerId },
    /// All passed flags were cleared (either `player_count - 1` players
    /// passed, or a submission was accepted).
    PassesCleared,
    /// The rotation returned to the last accepted submitter: the lead is
    /// open again and `leader` may play anything.
    CycleClosed { leader: PlayerId },
    RoundScored {
        round: u32,
        scores: Vec<ScoreLine>,
        /// Pairwise transfer matrix in rotation order; present when any
        /// seated player has the easy display flag on.
        matrix: Option<Vec<Vec<u64>>>,
    },
    GameEnded { standings: Vec<RankLine> },

    // -- Targeted --
    /// Private ack for a stored hand order.
    HandSorted,
    /// Private: the request was refused. `reason` is machine-readable.
    Rejected { reason: String },
    /// Private resync snapshot for a rejoining player.
    Resync {
        phase: Phase,
        round: u32,
        total_rounds: u32,
        rotation: Vec<PlayerId>,
        host: Option<PlayerId>,
        seats: Vec<SeatSummary>,
        /// The rejoiner's hand in their stored sort order.
        hand: Vec<Card>,
        board: Vec<PlacedCard>,
        rows: usize,
        cols: usize,
        lead: Option<Combo>,
        leader: Option<PlayerId>,
        turn: Option<PlayerId>,
    },

    // -- Faults --
    /// A round-fatal invariant violation. The match is aborted; the
    /// table stays open for a rematch.
    Fault { reason: String },
}

#[cfg(test)]
mod tests {
    //! Pin the JSON shapes clients depend on.

    use super::*;

    #[test]
    fn test_command_submit_json_format() {
        let cmd = Command::Submit { cards: vec![Card(2), Card(11)] };
        let json: serde_json::Value = serde_json::to_value(&cmd).unwrap();

        assert_eq!(json["type"], "Submit");
        assert_eq!(json["cards"], serde_json::json!([2, 11]));
    }

    #[test]
    fn test_command_unknown_type_rejected() {
        let result: Result<Command, _> =
            serde_json::from_str(r#"{"type": "Cheat", "cards": []}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_command_missing_field_rejected() {
        let result: Result<Command, _> =
            serde_json::from_str(r#"{"type": "SetNickname"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_command_round_trips() {
        for cmd in [
            Command::SetNickname { name: "ada".into() },
            Command::Ready { ready: true },
            Command::Start,
            Command::Submit { cards: vec![Card(0)] },
            Command::Pass,
            Command::ChangeRounds { rounds: 5 },
            Command::PlayAgain,
            Command::SetDisplayMode { easy: true },
            Command::SortHand { cards: vec![Card(3), Card(1)] },
        ] {
            let bytes = serde_json::to_vec(&cmd).unwrap();
            let decoded: Command = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(cmd, decoded);
        }
    }

    #[test]
    fn test_event_rejected_json_format() {
        let ev = GameEvent::Rejected { reason: "not_your_turn".into() };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["type"], "Rejected");
        assert_eq!(json["reason"], "not_your_turn");
    }

    #[test]
    fn test_event_round_scored_omits_nothing_when_matrix_present() {
        let ev = GameEvent::RoundScored {
            round: 1,
            scores: vec![ScoreLine {
                player_id: PlayerId(1),
                gained: 4,
                balance: 104,
            }],
            matrix: Some(vec![vec![0, 4], vec![0, 0]]),
        };
        let bytes = serde_json::to_vec(&ev).unwrap();
        let decoded: GameEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(ev, decoded);
    }
}

//! `ShedGame`: the [`GameLogic`] implementation tying the table, the
//! turn machine, and session continuity to the room framework.

use deckforge_cards::RankRange;
use deckforge_protocol::{PlayerId, Recipient};
use deckforge_room::{GameLogic, Outcome, RoomConfig};

use crate::messages::{Command, GameEvent};
use crate::session::{self, GameTimer, MAX_PLAYERS};
use crate::table::{GameConfig, Phase, Table};
use crate::{round, turn};

/// The card-shedding game, plugged into a room actor.
pub struct ShedGame;

impl GameLogic for ShedGame {
    type Config = GameConfig;
    type State = Table;
    type ClientMessage = Command;
    type ServerMessage = GameEvent;
    type Timer = GameTimer;

    fn init(config: &GameConfig) -> Table {
        Table::new(config)
    }

    fn on_join(
        state: &mut Table,
        player: PlayerId,
        guest_key: &str,
    ) -> Result<Outcome<Self>, String> {
        session::join(state, player, guest_key)
    }

    fn on_disconnect(state: &mut Table, player: PlayerId) -> Outcome<Self> {
        session::disconnect(state, player)
    }

    fn on_timer(state: &mut Table, timer: GameTimer) -> Outcome<Self> {
        match timer {
            GameTimer::GraceExpired { guest_key } => {
                session::grace_expired(state, &guest_key)
            }
        }
    }

    fn handle_message(
        state: &mut Table,
        sender: PlayerId,
        msg: Command,
    ) -> Outcome<Self> {
        match msg {
            Command::SetNickname { name } => set_nickname(state, sender, name),
            Command::Ready { ready } => set_ready(state, sender, ready),
            Command::Start => start_match(state, sender),
            Command::Submit { cards } => turn::submit(state, sender, cards),
            Command::Pass => turn::pass(state, sender),
            Command::ChangeRounds { rounds } => {
                change_rounds(state, sender, rounds)
            }
            Command::PlayAgain => play_again(state, sender),
            Command::SetDisplayMode { easy } => {
                set_display_mode(state, sender, easy)
            }
            Command::SortHand { cards } => sort_hand(state, sender, cards),
        }
    }

    fn is_abandoned(state: &Table) -> bool {
        state.ever_joined && state.seats.is_empty()
    }

    fn room_config() -> RoomConfig {
        RoomConfig { max_players: MAX_PLAYERS, ..RoomConfig::default() }
    }
}

fn set_nickname(
    state: &mut Table,
    sender: PlayerId,
    name: String,
) -> Outcome<ShedGame> {
    let name = name.trim().to_owned();
    if name.is_empty() {
        return turn::reject(sender, "empty_nickname");
    }
    let taken = state
        .seats
        .values()
        .any(|s| s.player_id != sender && s.nickname == name);
    if taken {
        return turn::reject(sender, "duplicate_nickname");
    }
    let Some(seat) = state.seats.get_mut(&sender) else {
        return turn::reject(sender, "unknown_player");
    };
    seat.nickname = name.clone();
    Outcome::none()
        .broadcast(GameEvent::NicknameSet { player_id: sender, name })
}

fn set_ready(
    state: &mut Table,
    sender: PlayerId,
    ready: bool,
) -> Outcome<ShedGame> {
    if state.phase == Phase::Playing {
        return turn::reject(sender, "match_in_progress");
    }
    let Some(seat) = state.seats.get_mut(&sender) else {
        return turn::reject(sender, "unknown_player");
    };
    seat.ready = ready;
    Outcome::none()
        .broadcast(GameEvent::ReadyChanged { player_id: sender, ready })
}

fn start_match(state: &mut Table, sender: PlayerId) -> Outcome<ShedGame> {
    match state.phase {
        Phase::Lobby => {}
        Phase::Playing => return turn::reject(sender, "match_in_progress"),
        Phase::Over => return turn::reject(sender, "match_over"),
    }
    if state.host != Some(sender) {
        return turn::reject(sender, "not_host");
    }
    if state.rotation.len() < 3 {
        return turn::reject(sender, "not_enough_players");
    }
    if !state.seats.values().all(|s| s.ready) {
        return turn::reject(sender, "not_all_ready");
    }

    state.range = RankRange::for_player_count(state.rotation.len());
    state.phase = Phase::Playing;
    state.round = 1;
    tracing::info!(
        players = state.rotation.len(),
        rounds = state.total_rounds,
        "match started"
    );
    round::start_round(state)
}

fn change_rounds(
    state: &mut Table,
    sender: PlayerId,
    rounds: u32,
) -> Outcome<ShedGame> {
    if state.phase != Phase::Lobby {
        return turn::reject(sender, "match_in_progress");
    }
    if state.host != Some(sender) {
        return turn::reject(sender, "not_host");
    }
    if rounds == 0 {
        return turn::reject(sender, "invalid_rounds");
    }
    state.total_rounds = rounds;
    Outcome::none().broadcast(GameEvent::RoundsChanged { rounds })
}

fn play_again(state: &mut Table, sender: PlayerId) -> Outcome<ShedGame> {
    if state.phase != Phase::Over {
        return turn::reject(sender, "match_not_over");
    }
    round::reset_for_rematch(state)
}

fn set_display_mode(
    state: &mut Table,
    sender: PlayerId,
    easy: bool,
) -> Outcome<ShedGame> {
    let Some(seat) = state.seats.get_mut(&sender) else {
        return turn::reject(sender, "unknown_player");
    };
    seat.easy_display = easy;
    Outcome::none().tell(
        Recipient::AllExcept(sender),
        GameEvent::DisplayModeChanged { player_id: sender, easy },
    )
}

fn sort_hand(
    state: &mut Table,
    sender: PlayerId,
    cards: Vec<deckforge_cards::Card>,
) -> Outcome<ShedGame> {
    let Some(seat) = state.seats.get_mut(&sender) else {
        return turn::reject(sender, "unknown_player");
    };
    let mut actual = seat.hand.clone();
    let mut claimed = cards.clone();
    actual.sort_unstable();
    claimed.sort_unstable();
    if actual != claimed {
        return turn::reject(sender, "not_a_permutation");
    }
    seat.sorted_hand = cards;
    Outcome::none().tell(Recipient::Player(sender), GameEvent::HandSorted)
}

//! Grace-window behavior through a real room actor, on a paused clock.

use std::time::Duration;

use deckforge_game::{GameEvent, RECONNECT_GRACE, ShedGame};
use deckforge_protocol::{PlayerId, RoomId};
use deckforge_room::RoomManager;
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Joins players 1..=n and returns the room id plus each player's event
/// receiver.
async fn room_with(
    mgr: &mut RoomManager<ShedGame>,
    n: u64,
) -> (RoomId, Vec<UnboundedReceiver<GameEvent>>) {
    let room = mgr.create_room(Default::default());
    let mut receivers = Vec::new();
    for i in 1..=n {
        let (tx, rx) = mpsc::unbounded_channel();
        mgr.join_room(PlayerId(i), room, &format!("guest-{i}"), tx)
            .await
            .expect("join should succeed");
        receivers.push(rx);
    }
    (room, receivers)
}

/// Lets the actor and any due timer tasks run.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

fn drain(rx: &mut UnboundedReceiver<GameEvent>) -> Vec<GameEvent> {
    let mut events = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        events.push(ev);
    }
    events
}

#[tokio::test(start_paused = true)]
async fn test_seat_evicted_after_grace_expires() {
    let mut mgr = RoomManager::<ShedGame>::new();
    let (room, mut receivers) = room_with(&mut mgr, 3).await;
    settle().await;
    assert_eq!(mgr.get_room_info(room).await.unwrap().player_count, 3);

    mgr.disconnect_player(PlayerId(2)).await.unwrap();
    settle().await;
    // The seat is held open through the whole window.
    tokio::time::advance(RECONNECT_GRACE - Duration::from_secs(1)).await;
    settle().await;
    assert_eq!(mgr.get_room_info(room).await.unwrap().player_count, 3);

    tokio::time::advance(Duration::from_secs(2)).await;
    settle().await;
    assert_eq!(mgr.get_room_info(room).await.unwrap().player_count, 2);

    // The remaining players saw the departure in two stages.
    let events = drain(&mut receivers[0]);
    assert!(events.iter().any(|ev| matches!(
        ev,
        GameEvent::PlayerDisconnected { player_id } if *player_id == PlayerId(2)
    )));
    assert!(events.iter().any(|ev| matches!(
        ev,
        GameEvent::PlayerLeft { player_id } if *player_id == PlayerId(2)
    )));
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_within_grace_keeps_seat() {
    let mut mgr = RoomManager::<ShedGame>::new();
    let (room, mut receivers) = room_with(&mut mgr, 3).await;
    settle().await;

    mgr.disconnect_player(PlayerId(2)).await.unwrap();
    settle().await;
    tokio::time::advance(Duration::from_secs(10)).await;
    settle().await;

    // Same guest key, new session id: the seat migrates in place.
    let (tx, mut rx) = mpsc::unbounded_channel();
    mgr.join_room(PlayerId(9), room, "guest-2", tx).await.unwrap();
    settle().await;
    assert_eq!(mgr.get_room_info(room).await.unwrap().player_count, 3);

    // The rejoiner gets a private resync, not a lobby roster.
    let events = drain(&mut rx);
    assert!(events.iter().any(|ev| matches!(ev, GameEvent::Resync { .. })));

    // The original grace timer fires into a reconnected seat: no-op.
    tokio::time::advance(RECONNECT_GRACE).await;
    settle().await;
    assert_eq!(mgr.get_room_info(room).await.unwrap().player_count, 3);

    let events = drain(&mut receivers[0]);
    assert!(events.iter().any(|ev| matches!(
        ev,
        GameEvent::PlayerReconnected { player_id } if *player_id == PlayerId(9)
    )));
    assert!(
        !events.iter().any(|ev| matches!(ev, GameEvent::PlayerLeft { .. })),
        "a reconnected seat must not be removed"
    );
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_room_is_pruned_from_listings() {
    let mut mgr = RoomManager::<ShedGame>::new();
    let (_room, receivers) = room_with(&mut mgr, 1).await;
    drop(receivers);
    settle().await;

    mgr.disconnect_player(PlayerId(1)).await.unwrap();
    settle().await;
    tokio::time::advance(RECONNECT_GRACE + Duration::from_secs(1)).await;
    settle().await;

    // The last seat expired; the actor noticed abandonment and stopped,
    // and listing drops the dead handle.
    assert!(mgr.list_rooms().await.is_empty());
    assert_eq!(mgr.room_count(), 0);
}

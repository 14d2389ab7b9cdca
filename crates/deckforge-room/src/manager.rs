//! Room manager: creates, tracks, and routes players to rooms.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use deckforge_protocol::{PlayerId, RoomId};

use crate::room::spawn_room;
use crate::{GameLogic, PlayerSender, RoomError, RoomHandle, RoomInfo};

/// Counter for generating unique room IDs.
static NEXT_ROOM_ID: AtomicU64 = AtomicU64::new(1);

/// Manages all active rooms and tracks which player is in which room.
///
/// This is the entry point for room operations from higher layers
/// (connection handlers, the server accept loop).
pub struct RoomManager<G: GameLogic> {
    rooms: HashMap<RoomId, RoomHandle<G>>,

    /// Maps each player to the room they're currently in.
    /// A player can be in at most ONE room at a time (key invariant).
    player_rooms: HashMap<PlayerId, RoomId>,
}

impl<G: GameLogic> RoomManager<G> {
    pub fn new() -> Self {
        Self { rooms: HashMap::new(), player_rooms: HashMap::new() }
    }

    /// Creates a new room and returns its ID.
    pub fn create_room(&mut self, game_config: G::Config) -> RoomId {
        let room_id = RoomId(NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed));
        let handle = spawn_room::<G>(room_id, G::room_config(), game_config);
        self.rooms.insert(room_id, handle);
        tracing::info!(%room_id, "room created");
        room_id
    }

    /// Adds a player to a room. Enforces the one-room-at-a-time
    /// invariant; the game itself may still refuse the join.
    pub async fn join_room(
        &mut self,
        player_id: PlayerId,
        room_id: RoomId,
        guest_key: &str,
        sender: PlayerSender<G>,
    ) -> Result<(), RoomError> {
        if let Some(current) = self.player_rooms.get(&player_id) {
            return Err(RoomError::AlreadyInRoom(player_id, *current));
        }

        let handle = self
            .rooms
            .get(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;

        handle.join(player_id, guest_key, sender).await?;
        self.player_rooms.insert(player_id, room_id);
        Ok(())
    }

    /// Reports that a player's connection ended, and forgets the session.
    ///
    /// The room keeps the seat alive through its grace machinery; this
    /// session id never comes back (a reconnecting client joins with a
    /// fresh session id and the same guest key), so the index entry goes
    /// now.
    pub async fn disconnect_player(
        &mut self,
        player_id: PlayerId,
    ) -> Result<(), RoomError> {
        let room_id = self
            .player_rooms
            .remove(&player_id)
            .ok_or(RoomError::NotInRoom(player_id))?;

        if let Some(handle) = self.rooms.get(&room_id) {
            handle.disconnect(player_id).await?;
        }
        Ok(())
    }

    /// Routes a game message from a player to their current room.
    pub async fn route_message(
        &self,
        player_id: PlayerId,
        msg: G::ClientMessage,
    ) -> Result<(), RoomError> {
        let room_id = self
            .player_rooms
            .get(&player_id)
            .ok_or(RoomError::NotInRoom(player_id))?;

        let handle = self
            .rooms
            .get(room_id)
            .ok_or(RoomError::NotFound(*room_id))?;

        handle.send_message(player_id, msg).await
    }

    /// Returns info about a specific room.
    pub async fn get_room_info(
        &self,
        room_id: RoomId,
    ) -> Result<RoomInfo, RoomError> {
        let handle = self
            .rooms
            .get(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;
        handle.get_info().await
    }

    /// Shuts down a room and removes all its players from the index.
    pub async fn destroy_room(&mut self, room_id: RoomId) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;

        let _ = handle.shutdown().await;
        self.player_rooms.retain(|_, rid| *rid != room_id);

        tracing::info!(%room_id, "room destroyed");
        Ok(())
    }

    /// Returns the room ID a player is currently in, if any.
    pub fn player_room(&self, player_id: &PlayerId) -> Option<RoomId> {
        self.player_rooms.get(player_id).copied()
    }

    /// Lists rooms with free capacity. Rooms that fail to respond
    /// (shutting down, abandoned) are dropped from the index as a side
    /// effect.
    pub async fn list_rooms(&mut self) -> Vec<RoomInfo> {
        let mut infos = Vec::with_capacity(self.rooms.len());
        let mut dead = Vec::new();
        for (room_id, handle) in &self.rooms {
            match handle.get_info().await {
                Ok(info) if info.has_capacity() => infos.push(info),
                Ok(_) => {}
                Err(_) => dead.push(*room_id),
            }
        }
        for room_id in dead {
            self.rooms.remove(&room_id);
            self.player_rooms.retain(|_, rid| *rid != room_id);
            tracing::debug!(%room_id, "pruned dead room");
        }
        infos
    }

    /// Finds a room with capacity or creates a new one, then joins the
    /// player.
    ///
    /// Simple matchmaking: scan existing rooms for one with a free slot
    /// and try to join it (the game may still refuse — e.g. a match in
    /// progress — in which case the scan continues). If none accepts,
    /// create a fresh room.
    pub async fn join_or_create(
        &mut self,
        player_id: PlayerId,
        guest_key: &str,
        game_config: G::Config,
        sender: PlayerSender<G>,
    ) -> Result<RoomId, RoomError> {
        if let Some(existing) = self.player_rooms.get(&player_id) {
            return Err(RoomError::AlreadyInRoom(player_id, *existing));
        }

        for handle in self.rooms.values() {
            if let Ok(info) = handle.get_info().await {
                if info.has_capacity()
                    && handle
                        .join(player_id, guest_key, sender.clone())
                        .await
                        .is_ok()
                {
                    self.player_rooms.insert(player_id, info.room_id);
                    return Ok(info.room_id);
                }
            }
        }

        let room_id = self.create_room(game_config);
        let handle = self
            .rooms
            .get(&room_id)
            .expect("just created this room");
        handle.join(player_id, guest_key, sender).await?;
        self.player_rooms.insert(player_id, room_id);
        Ok(room_id)
    }

    /// Returns the number of active rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Lists all active room IDs.
    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.keys().copied().collect()
    }
}

impl<G: GameLogic> Default for RoomManager<G> {
    fn default() -> Self {
        Self::new()
    }
}

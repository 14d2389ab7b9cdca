//! Per-connection handler: handshake, auth, and message routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive Handshake → validate version
//!   2. Authenticate token → get Identity (session id + guest key)
//!   3. Send HandshakeAck → player is connected
//!   4. Loop: receive envelopes → dispatch system or game messages
//!
//! Joining a room additionally spawns an outbound pump task: the room
//! delivers game events into an unbounded channel, and the pump drains
//! that channel into the connection. Inbound and outbound traffic run on
//! separate tasks over clones of the same connection, so a client parked
//! mid-`recv` still receives broadcasts promptly.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use deckforge_protocol::{
    Channel, Codec, Envelope, Payload, PlayerId, RoomListEntry, SystemMessage,
};
use deckforge_room::{GameLogic, RoomError};
use deckforge_session::Authenticator;
use deckforge_transport::{Connection, WebSocketConnection};

use crate::DeckforgeError;
use crate::server::{PROTOCOL_VERSION, ServerState};

/// Everything the message loop knows about the connected player.
struct ConnContext {
    player_id: PlayerId,
    guest_key: String,
    reconnect_token: String,
}

/// Drop guard that cleans up when the handler exits for any reason.
///
/// Marks the session disconnected (starting the reconnection grace
/// clock) and reports the drop to the player's room, which decides what
/// a disconnect means for the seat. Since `Drop` is synchronous, we
/// spawn a fire-and-forget task for the async locks.
struct ConnectionGuard<G: GameLogic, A: Authenticator, C: Codec> {
    player_id: PlayerId,
    state: Arc<ServerState<G, A, C>>,
}

impl<G: GameLogic, A: Authenticator, C: Codec> Drop for ConnectionGuard<G, A, C> {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            {
                let mut sessions = state.sessions.lock().await;
                let _ = sessions.disconnect(player_id);
            }
            let mut rooms = state.rooms.lock().await;
            let _ = rooms.disconnect_player(player_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<G, A, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<G, A, C>>,
) -> Result<(), DeckforgeError>
where
    G: GameLogic,
    A: Authenticator,
    C: Codec + Clone,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // --- Step 1: Handshake ---
    let identity = perform_handshake(&conn, &state).await?;

    tracing::info!(
        %conn_id,
        player_id = %identity.player_id,
        "player authenticated"
    );

    // Create session and guard atomically — if session creation fails,
    // no guard is needed. If it succeeds, the guard is immediately active.
    let reconnect_token = {
        let mut sessions = state.sessions.lock().await;
        let session = sessions.create(&identity)?;
        session.reconnect_token.clone()
    };
    let _guard = ConnectionGuard {
        player_id: identity.player_id,
        state: Arc::clone(&state),
    };

    let ctx = ConnContext {
        player_id: identity.player_id,
        guest_key: identity.guest_key,
        reconnect_token,
    };

    // --- Step 2: Message loop ---
    // The sequence counter is shared with outbound pump tasks so every
    // envelope on this connection gets a distinct, increasing seq.
    let seq = Arc::new(AtomicU64::new(1));
    let start = Instant::now();

    loop {
        let data = match tokio::time::timeout(Duration::from_secs(15), conn.recv())
            .await
        {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(player_id = %ctx.player_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(player_id = %ctx.player_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(player_id = %ctx.player_id, "connection timed out");
                break;
            }
        };

        let envelope: Envelope = match state.codec.decode(&data) {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(
                    player_id = %ctx.player_id,
                    error = %e,
                    "failed to decode envelope"
                );
                continue;
            }
        };

        match envelope.payload {
            Payload::System(sys_msg) => {
                let should_close = handle_system_message(
                    &conn, &state, &ctx, sys_msg, &seq, &start,
                )
                .await?;
                if should_close {
                    break;
                }
            }
            Payload::Game(game_data) => {
                handle_game_message::<G, A, C>(
                    &conn, &state, &ctx, game_data, &seq, &start,
                )
                .await?;
            }
        }
    }

    // _guard drops here → session disconnect and room notification fire.
    Ok(())
}

/// Performs the initial handshake: receive Handshake, validate, auth, send Ack.
async fn perform_handshake<G, A, C>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<G, A, C>>,
) -> Result<deckforge_session::Identity, DeckforgeError>
where
    G: GameLogic,
    A: Authenticator,
    C: Codec,
{
    let start = Instant::now();

    let data = match tokio::time::timeout(Duration::from_secs(5), conn.recv()).await
    {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(DeckforgeError::Protocol(
                deckforge_protocol::ProtocolError::InvalidMessage(
                    "connection closed before handshake".into(),
                ),
            ));
        }
        Ok(Err(e)) => return Err(DeckforgeError::Transport(e)),
        Err(_) => {
            return Err(DeckforgeError::Protocol(
                deckforge_protocol::ProtocolError::InvalidMessage(
                    "handshake timed out".into(),
                ),
            ));
        }
    };

    let envelope: Envelope = state.codec.decode(&data)?;

    let (version, token) = match envelope.payload {
        Payload::System(SystemMessage::Handshake { version, token }) => {
            (version, token)
        }
        _ => {
            send_error(conn, &state.codec, 400, "expected Handshake", 0, &start)
                .await?;
            return Err(DeckforgeError::Protocol(
                deckforge_protocol::ProtocolError::InvalidMessage(
                    "first message must be Handshake".into(),
                ),
            ));
        }
    };

    if version != PROTOCOL_VERSION {
        send_error(
            conn,
            &state.codec,
            400,
            &format!(
                "version mismatch: expected {PROTOCOL_VERSION}, got {version}"
            ),
            0,
            &start,
        )
        .await?;
        return Err(DeckforgeError::Protocol(
            deckforge_protocol::ProtocolError::InvalidMessage(
                "protocol version mismatch".into(),
            ),
        ));
    }

    let token_str = token.as_deref().unwrap_or("");
    let identity = match state.auth.authenticate(token_str).await {
        Ok(identity) => identity,
        Err(e) => {
            send_error(conn, &state.codec, 401, "unauthorized", 0, &start).await?;
            return Err(DeckforgeError::Session(e));
        }
    };

    let ack = Envelope {
        seq: 0,
        timestamp: start.elapsed().as_millis() as u64,
        channel: Channel::ReliableOrdered,
        payload: Payload::System(SystemMessage::HandshakeAck {
            player_id: identity.player_id,
            guest_key: identity.guest_key.clone(),
            server_time: start.elapsed().as_millis() as u64,
        }),
    };
    let ack_bytes = state.codec.encode(&ack)?;
    conn.send(&ack_bytes).await.map_err(DeckforgeError::Transport)?;

    Ok(identity)
}

/// Handles a system message. Returns `true` if the connection should close.
async fn handle_system_message<G, A, C>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<G, A, C>>,
    ctx: &ConnContext,
    msg: SystemMessage,
    seq: &Arc<AtomicU64>,
    start: &Instant,
) -> Result<bool, DeckforgeError>
where
    G: GameLogic,
    A: Authenticator,
    C: Codec + Clone,
{
    match msg {
        SystemMessage::Heartbeat { client_time } => {
            let ack = Envelope {
                seq: next_seq(seq),
                timestamp: start.elapsed().as_millis() as u64,
                channel: Channel::ReliableOrdered,
                payload: Payload::System(SystemMessage::HeartbeatAck {
                    client_time,
                    server_time: start.elapsed().as_millis() as u64,
                }),
            };
            let bytes = state.codec.encode(&ack)?;
            conn.send(&bytes).await.map_err(DeckforgeError::Transport)?;
        }

        SystemMessage::JoinRoom { room_id } => {
            let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

            // Lock only for the join operation, drop before network I/O.
            let join_result = {
                let mut rooms = state.rooms.lock().await;
                rooms
                    .join_room(ctx.player_id, room_id, &ctx.guest_key, tx)
                    .await
            };

            match join_result {
                Ok(()) => {
                    spawn_outbound_pump::<G, C>(
                        conn.clone(),
                        state.codec.clone(),
                        Arc::clone(seq),
                        *start,
                        rx,
                    );
                    let resp = Envelope {
                        seq: next_seq(seq),
                        timestamp: start.elapsed().as_millis() as u64,
                        channel: Channel::ReliableOrdered,
                        payload: Payload::System(SystemMessage::RoomJoined {
                            room_id,
                            reconnect_token: ctx.reconnect_token.clone(),
                        }),
                    };
                    let bytes = state.codec.encode(&resp)?;
                    conn.send(&bytes).await.map_err(DeckforgeError::Transport)?;
                }
                Err(e) => {
                    send_error(
                        conn,
                        &state.codec,
                        room_error_code(&e),
                        &e.to_string(),
                        next_seq(seq),
                        start,
                    )
                    .await?;
                }
            }
        }

        SystemMessage::JoinOrCreate => {
            let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

            let result = {
                let mut rooms = state.rooms.lock().await;
                rooms
                    .join_or_create(
                        ctx.player_id,
                        &ctx.guest_key,
                        G::Config::default(),
                        tx,
                    )
                    .await
            };

            match result {
                Ok(room_id) => {
                    spawn_outbound_pump::<G, C>(
                        conn.clone(),
                        state.codec.clone(),
                        Arc::clone(seq),
                        *start,
                        rx,
                    );
                    let resp = Envelope {
                        seq: next_seq(seq),
                        timestamp: start.elapsed().as_millis() as u64,
                        channel: Channel::ReliableOrdered,
                        payload: Payload::System(SystemMessage::RoomJoined {
                            room_id,
                            reconnect_token: ctx.reconnect_token.clone(),
                        }),
                    };
                    let bytes = state.codec.encode(&resp)?;
                    conn.send(&bytes).await.map_err(DeckforgeError::Transport)?;
                }
                Err(e) => {
                    send_error(
                        conn,
                        &state.codec,
                        room_error_code(&e),
                        &e.to_string(),
                        next_seq(seq),
                        start,
                    )
                    .await?;
                }
            }
        }

        SystemMessage::ListRooms => {
            let infos = state.rooms.lock().await.list_rooms().await;

            let entries: Vec<RoomListEntry> = infos
                .into_iter()
                .map(|info| RoomListEntry {
                    room_id: info.room_id,
                    player_count: info.player_count,
                    max_players: info.max_players,
                })
                .collect();

            let resp = Envelope {
                seq: next_seq(seq),
                timestamp: start.elapsed().as_millis() as u64,
                channel: Channel::ReliableOrdered,
                payload: Payload::System(SystemMessage::RoomList {
                    rooms: entries,
                }),
            };
            let bytes = state.codec.encode(&resp)?;
            conn.send(&bytes).await.map_err(DeckforgeError::Transport)?;
        }

        SystemMessage::LeaveRoom => {
            // A voluntary leave looks like a disconnect to the room; the
            // game decides whether the seat lingers through grace or is
            // evicted immediately.
            let mut rooms = state.rooms.lock().await;
            if let Err(e) = rooms.disconnect_player(ctx.player_id).await {
                tracing::debug!(
                    player_id = %ctx.player_id,
                    error = %e,
                    "leave room failed"
                );
            }
        }

        SystemMessage::Disconnect { reason } => {
            tracing::info!(player_id = %ctx.player_id, %reason, "client disconnected");
            return Ok(true);
        }

        _ => {
            tracing::debug!(
                player_id = %ctx.player_id,
                "ignoring unexpected system message"
            );
        }
    }

    Ok(false)
}

/// Handles a game message: decode, route to the player's room.
async fn handle_game_message<G, A, C>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<G, A, C>>,
    ctx: &ConnContext,
    game_data: Vec<u8>,
    seq: &Arc<AtomicU64>,
    start: &Instant,
) -> Result<(), DeckforgeError>
where
    G: GameLogic,
    A: Authenticator,
    C: Codec,
{
    let client_msg: G::ClientMessage = match state.codec.decode(&game_data) {
        Ok(msg) => msg,
        Err(e) => {
            send_error(
                conn,
                &state.codec,
                400,
                &format!("invalid game message: {e}"),
                next_seq(seq),
                start,
            )
            .await?;
            return Ok(());
        }
    };

    // PERF: cache room handle per-connection to avoid the global lock on
    // every game message. Acceptable at card-table concurrency.
    let result = state
        .rooms
        .lock()
        .await
        .route_message(ctx.player_id, client_msg)
        .await;

    if let Err(e) = result {
        send_error(
            conn,
            &state.codec,
            400,
            &e.to_string(),
            next_seq(seq),
            start,
        )
        .await?;
    }

    Ok(())
}

/// Spawns the task that drains room events into the connection.
///
/// Ends when the room drops the player's sender (eviction or room
/// shutdown) or the connection dies.
fn spawn_outbound_pump<G, C>(
    conn: WebSocketConnection,
    codec: C,
    seq: Arc<AtomicU64>,
    start: Instant,
    mut events: tokio::sync::mpsc::UnboundedReceiver<G::ServerMessage>,
) where
    G: GameLogic,
    C: Codec + Clone,
{
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let game_bytes = match codec.encode(&event) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to encode game event");
                    continue;
                }
            };
            let envelope = Envelope {
                seq: next_seq(&seq),
                timestamp: start.elapsed().as_millis() as u64,
                channel: Channel::ReliableOrdered,
                payload: Payload::Game(game_bytes),
            };
            let frame = match codec.encode(&envelope) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to encode envelope");
                    continue;
                }
            };
            if conn.send(&frame).await.is_err() {
                break;
            }
        }
    });
}

/// Maps a room error to the HTTP-style code sent to the client.
fn room_error_code(err: &RoomError) -> u16 {
    match err {
        RoomError::NotFound(_) => 404,
        RoomError::AlreadyInRoom(_, _) => 409,
        RoomError::JoinRefused(_) => 403,
        RoomError::NotInRoom(_) => 400,
        RoomError::Unavailable(_) => 503,
    }
}

/// Sends a SystemMessage::Error envelope to the client.
async fn send_error(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    code: u16,
    message: &str,
    seq: u64,
    start: &Instant,
) -> Result<(), DeckforgeError> {
    let envelope = Envelope {
        seq,
        timestamp: start.elapsed().as_millis() as u64,
        channel: Channel::ReliableOrdered,
        payload: Payload::System(SystemMessage::Error {
            code,
            message: message.to_string(),
        }),
    };
    let bytes = codec.encode(&envelope)?;
    conn.send(&bytes).await.map_err(DeckforgeError::Transport)?;
    Ok(())
}

/// Returns the next sequence number for this connection.
fn next_seq(seq: &AtomicU64) -> u64 {
    seq.fetch_add(1, Ordering::Relaxed)
}

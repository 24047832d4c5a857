//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::{RoomHandle, RoomInput, SessionId};
use crate::http::routes::AppError;
use crate::lobby::Seat;
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Longest display name accepted at join
const MAX_NAME_LEN: usize = 32;

/// Buffered direct replies (pong) per connection
const DIRECT_CHANNEL_SIZE: usize = 16;

type WsSink = SplitSink<WebSocket, Message>;
type WsStream = SplitStream<WebSocket>;

/// Join options for a WebSocket connection
#[derive(Debug, Default, Deserialize)]
pub struct WsQuery {
    pub name: Option<String>,
    pub appearance: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    if let Some(name) = &query.name {
        if name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::BadRequest(format!(
                "name must be at most {MAX_NAME_LEN} characters"
            )));
        }
    }

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, query, state)))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, query: WsQuery, state: AppState) {
    let session_id = Uuid::new_v4();
    info!(session_id = %session_id, "New WebSocket connection");

    let (mut ws_sink, ws_stream) = socket.split();

    let name = query
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| default_name(session_id));
    let appearance = query
        .appearance
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| "default".to_string());

    let seat = match state.lobby.join(session_id, name, appearance).await {
        Ok(seat) => seat,
        Err(e) => {
            error!(session_id = %session_id, error = %e, "Failed to seat participant");
            let msg = ServerMsg::Error {
                code: "unavailable".to_string(),
                message: e.to_string(),
            };
            let _ = send_msg(&mut ws_sink, &msg).await;
            return;
        }
    };

    let welcome = ServerMsg::Welcome {
        session_id,
        room_id: seat.room.id,
        server_time: unix_millis(),
    };

    let room = seat.room.clone();
    if let Err(e) = send_msg(&mut ws_sink, &welcome).await {
        error!(session_id = %session_id, error = %e, "Failed to send welcome");
    } else {
        let limiter = ConnectionRateLimiter::new(state.config.input_rate_limit);
        run_session(session_id, ws_sink, ws_stream, seat, limiter).await;
    }

    // Cleanup on disconnect
    state.lobby.leave(session_id, &room).await;

    info!(session_id = %session_id, room_id = %room.id, "WebSocket connection closed");
}

fn default_name(session_id: SessionId) -> String {
    format!("Player_{}", &session_id.simple().to_string()[..8])
}

/// Run the WebSocket session with read/write split
async fn run_session(
    session_id: SessionId,
    mut ws_sink: WsSink,
    mut ws_stream: WsStream,
    seat: Seat,
    rate_limiter: ConnectionRateLimiter,
) {
    let Seat { room, mut updates } = seat;
    let (direct_tx, mut direct_rx) = mpsc::channel::<ServerMsg>(DIRECT_CHANNEL_SIZE);
    let resync_tx = room.input_tx.clone();

    // Writer task: room broadcasts and direct replies -> WebSocket
    let writer_handle = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                update = updates.recv() => match update {
                    Ok(msg) => msg,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(
                            session_id = %session_id,
                            lagged_count = n,
                            "Client lagged, skipping {} updates", n
                        );
                        // Skipped patches leave this client's view stale, ask for a full state
                        request_resync(&resync_tx, session_id);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!(session_id = %session_id, "Room channel closed");
                        break;
                    }
                },
                Some(msg) = direct_rx.recv() => msg,
            };

            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(session_id = %session_id, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    // Reader loop: WebSocket -> room
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(session_id = %session_id, "Rate limited input message");
                    continue;
                }

                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(ClientMsg::Ping { t }) => {
                        let _ = direct_tx.send(ServerMsg::Pong { t }).await;
                    }
                    Ok(msg) => {
                        if !forward(&room, session_id, msg).await {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(session_id = %session_id, error = %e, "Failed to parse client message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(session_id = %session_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(session_id = %session_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(session_id = %session_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
}

/// Queue a full-state resend without blocking the writer
fn request_resync(room_tx: &mpsc::Sender<RoomInput>, session_id: SessionId) {
    if room_tx.try_send(RoomInput::Resync { session_id }).is_err() {
        debug!(session_id = %session_id, "Resync request dropped");
    }
}

/// Hand a client message to the room, false once the room is gone
async fn forward(room: &RoomHandle, session_id: SessionId, msg: ClientMsg) -> bool {
    let input = RoomInput::Message { session_id, msg };
    if room.input_tx.send(input).await.is_err() {
        debug!(session_id = %session_id, "Room input channel closed");
        return false;
    }
    true
}

/// Send a message over WebSocket
async fn send_msg(sink: &mut WsSink, msg: &ServerMsg) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}

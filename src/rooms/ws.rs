use axum::{
    debug_handler,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{auth::AuthUser, matches::registry, AppError, AppResult};

use super::{
    events::{ClientEvent, ServerEvent},
    relay::{room_key, ConnectionId, Relay},
};

#[debug_handler(state = crate::AppState)]
pub async fn relay_ws(
    State(db_pool): State<SqlitePool>,
    State(relay): State<Relay>,
    user: AuthUser,

    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |stream| session(stream, db_pool, relay, user.user_id))
}

async fn session(stream: WebSocket, db_pool: SqlitePool, relay: Relay, user_id: Uuid) {
    let (conn, mut rx) = relay.connect(user_id);
    tracing::info!(connection = %conn, user_id = %user_id, online = relay.online_connections(), "relay connected");

    let (mut sender, mut receiver) = stream.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!(error = %err, "dropping unserializable relay event");
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_relay = relay.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            let text = match msg {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };

            handle_frame(&db_pool, &recv_relay, conn, user_id, text.as_str()).await;
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    };

    relay.disconnect(conn);
    tracing::info!(connection = %conn, user_id = %user_id, online = relay.online_connections(), "relay disconnected");
}

/// Parses and applies one text frame. Failures are reported to the sending
/// connection as an `error` event; the socket stays open.
pub async fn handle_frame(db_pool: &SqlitePool, relay: &Relay, conn: ConnectionId, user_id: Uuid, text: &str) {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(err) => {
            relay.send_to(conn, ServerEvent::Error { message: format!("malformed event: {err}") });
            return;
        }
    };

    if let Err(err) = dispatch(db_pool, relay, conn, user_id, event).await {
        if let AppError::Internal(inner) = &err {
            tracing::error!(connection = %conn, error = %inner, "relay event failed");
        }
        relay.send_to(conn, ServerEvent::Error { message: err.to_string() });
    }
}

/// The participants must be the authenticated user and someone they are matched with.
async fn authorize_pair(db_pool: &SqlitePool, user_id: Uuid, claimed: Uuid, partner: Uuid) -> AppResult<String> {
    if claimed != user_id {
        return Err(AppError::Forbidden("Cannot act on behalf of another user".to_owned()));
    }
    if !registry::are_matched(db_pool, user_id, partner).await? {
        return Err(AppError::Forbidden("No match with this user".to_owned()));
    }
    Ok(room_key(&user_id.to_string(), &partner.to_string()))
}

/// Applies one inbound socket event for connection `conn` owned by `user_id`.
pub async fn dispatch(
    db_pool: &SqlitePool,
    relay: &Relay,
    conn: ConnectionId,
    user_id: Uuid,
    event: ClientEvent,
) -> AppResult<()> {
    match event {
        ClientEvent::JoinRoom(join) => {
            let room = authorize_pair(db_pool, user_id, join.user_id, join.match_id).await?;
            relay.join(conn, &room);
            tracing::debug!(connection = %conn, room = %room, members = relay.room_size(&room), "joined room");
            relay.send_to(conn, ServerEvent::Joined { room });
        }
        ClientEvent::ChatMessage(msg) => {
            let room = authorize_pair(db_pool, user_id, msg.sender_id, msg.receiver_id).await?;
            relay.publish(&room, ServerEvent::Message(msg));
        }
        ClientEvent::Typing(typing) => {
            let room = authorize_pair(db_pool, user_id, typing.sender_id, typing.receiver_id).await?;
            relay.publish_except(&room, ServerEvent::Typing { sender_id: typing.sender_id }, conn);
        }
    }
    Ok(())
}

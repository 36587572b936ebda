//! The WebSocket session endpoint.
//!
//! `GET /v1/game/ws` upgrades after the `jwt` cookie authenticates and the
//! `roomId` cookie resolves to a room. The connection then runs two pumps
//! under one `select!` scope — either pump ending cancels the other:
//!
//! - the **read pump** decodes inbound frames, stamps the authenticated
//!   user id over whatever the client claimed, and queues the payload on
//!   the room's channels;
//! - the **write pump** drains the session's bounded queue onto the socket
//!   and answers a closed queue with a clean close frame.
//!
//! On exit the session is marked disconnected; the player's grid state
//! survives until the next round boundary.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use gridrush_protocol::{Codec, GameMsg, JsonCodec, ProtocolError, RoomId, UserId};
use gridrush_room::Room;
use gridrush_session::{Authenticator, SEND_QUEUE_CAPACITY, Session};
use serde_json::json;
use tokio::sync::mpsc;

use crate::ServerError;
use crate::routes::AppState;

/// Upgrade handler for `/v1/game/ws`.
pub async fn websocket_endpoint<A: Authenticator>(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState<A>>>,
    headers: HeaderMap,
) -> Response {
    let Some(token) = cookie_value(&headers, "jwt") else {
        return reject(StatusCode::UNAUTHORIZED, "missing auth cookie");
    };
    let user_id = match state.auth.authenticate(&token).await {
        Ok(user_id) => user_id,
        Err(err) => {
            tracing::warn!(error = %err, "websocket auth failed");
            return reject(StatusCode::UNAUTHORIZED, "invalid auth token");
        }
    };

    let Some(room_id) = cookie_value(&headers, "roomId") else {
        return reject(StatusCode::BAD_REQUEST, "missing roomId cookie");
    };
    let Some(room) = state.rooms.get(&RoomId::new(room_id.clone())) else {
        tracing::warn!(%room_id, "websocket upgrade for unknown room");
        return reject(StatusCode::BAD_REQUEST, "unknown room");
    };

    let room = room.clone();
    ws.on_upgrade(move |socket| serve_session(socket, room, user_id))
}

fn reject(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(json!({ "error": message }))).into_response()
}

/// Reads one cookie out of the `Cookie` header.
pub(crate) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// Runs one session from upgrade to teardown.
async fn serve_session(socket: WebSocket, room: Room, user_id: UserId) {
    let (queue_tx, queue_rx) = mpsc::channel(SEND_QUEUE_CAPACITY);
    let session = Session::new(user_id.clone(), queue_tx);

    let first_time = match room.register(&session).await {
        Ok(first_time) => first_time,
        Err(err) => {
            tracing::error!(%user_id, error = %err, "room rejected registration");
            return;
        }
    };
    // The registry now holds the only sender; when it drops the entry the
    // write pump sees the queue close.
    drop(session);

    tracing::info!(
        room_id = %room.id(),
        %user_id,
        first_time,
        "session established"
    );

    let (sink, stream) = socket.split();
    tokio::select! {
        result = read_pump(stream, &room, &user_id) => {
            if let Err(err) = result {
                tracing::debug!(%user_id, error = %err, "read pump ended");
            }
        }
        result = write_pump(sink, queue_rx) => {
            if let Err(err) = result {
                tracing::debug!(%user_id, error = %err, "write pump ended");
            }
        }
    }

    room.disconnect(&user_id);
    tracing::info!(%user_id, "session closed, state kept until the round boundary");
}

async fn read_pump(
    mut stream: SplitStream<WebSocket>,
    room: &Room,
    user_id: &UserId,
) -> Result<(), ServerError> {
    let codec = JsonCodec;

    while let Some(frame) = stream.next().await {
        let message = frame?;
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => return Ok(()),
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Binary(_) => {
                return Err(ServerError::Protocol(ProtocolError::InvalidFrame(
                    "binary frame on a JSON channel".into(),
                )));
            }
        };

        match codec.decode::<GameMsg>(text.as_str())? {
            GameMsg::PlayerPosition(mut update) => {
                update.id = user_id.clone();
                room.submit_position(update).await?;
            }
            GameMsg::ItemAction(mut action) => {
                action.id = user_id.clone();
                room.submit_action(action).await?;
            }
            GameMsg::PlayerChatMsg(_) => {
                // Reserved tag; nothing behind it yet.
            }
            _ => {
                tracing::warn!(%user_id, "unexpected tag from client, dropping session");
                return Err(ServerError::Protocol(ProtocolError::InvalidFrame(
                    "unexpected message tag from client".into(),
                )));
            }
        }
    }
    Ok(())
}

async fn write_pump(
    mut sink: SplitSink<WebSocket, Message>,
    mut queue_rx: mpsc::Receiver<GameMsg>,
) -> Result<(), ServerError> {
    let codec = JsonCodec;

    while let Some(msg) = queue_rx.recv().await {
        let frame = codec.encode(&msg)?;
        sink.send(Message::Text(frame.into())).await?;
    }

    // Queue closed: the registry dropped this session. Say goodbye cleanly.
    let _ = sink.send(Message::Close(None)).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_cookie_value_finds_named_cookie() {
        let headers = headers_with_cookie("jwt=a1b2c3d4; roomId=A");

        assert_eq!(cookie_value(&headers, "jwt").as_deref(), Some("a1b2c3d4"));
        assert_eq!(cookie_value(&headers, "roomId").as_deref(), Some("A"));
    }

    #[test]
    fn test_cookie_value_handles_spacing_variants() {
        let headers = headers_with_cookie("a=1;b=2;  c=3");

        assert_eq!(cookie_value(&headers, "b").as_deref(), Some("2"));
        assert_eq!(cookie_value(&headers, "c").as_deref(), Some("3"));
    }

    #[test]
    fn test_cookie_value_missing_name_is_none() {
        let headers = headers_with_cookie("jwt=a1b2c3d4");

        assert_eq!(cookie_value(&headers, "roomId"), None);
    }

    #[test]
    fn test_cookie_value_without_header_is_none() {
        assert_eq!(cookie_value(&HeaderMap::new(), "jwt"), None);
    }
}

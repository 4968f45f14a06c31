//! Pumps frames between a single upgraded socket and the room actor it was
//! routed to. One task owns the outbound half (so a slow writer can never
//! block another connection's broadcast), one task owns the inbound half.

use crate::broadcast::next_conn_id;
use crate::room::{RoomHandle, RoomOutbound};
use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub async fn handle_socket(socket: WebSocket, room: RoomHandle, token: String, want: String, max_message_bytes: usize) {
    let conn_id = next_conn_id();
    let (mut sink, mut stream) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<RoomOutbound>();

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = outbound_rx.recv().await {
            match event {
                RoomOutbound::Message(bytes) => match Utf8Bytes::try_from((*bytes).clone()) {
                    Ok(text) => {
                        if sink.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!(%err, "dropping non-UTF-8 broadcast payload"),
                },
                RoomOutbound::Close { code, reason } => {
                    let _ = sink
                        .send(Message::Close(Some(CloseFrame {
                            code,
                            reason: Utf8Bytes::from_static(reason),
                        })))
                        .await;
                    break;
                }
            }
        }
    });

    room.open(conn_id, outbound_tx, token, want).await;

    let mut recv_task = tokio::spawn({
        let room = room.clone();
        async move {
            while let Some(Ok(message)) = stream.next().await {
                match message {
                    Message::Text(text) => {
                        if text.len() > max_message_bytes {
                            debug!(room = room.room_id(), conn_id, len = text.len(), "dropping oversized frame");
                            continue;
                        }
                        room.message(conn_id, text.to_string()).await;
                    }
                    Message::Close(_) => break,
                    // Binary/Ping/Pong carry no protocol meaning here; axum answers
                    // pings automatically.
                    _ => {}
                }
            }
            room.close(conn_id).await;
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}

mod test_helpers;

use room_server::room::relay;
use serde_json::json;
use test_helpers::{fresh_metrics, msg_type, Client, CHANNEL_CAPACITY};

#[tokio::test]
async fn relay_broadcasts_to_every_attached_socket_including_the_sender() {
    let room = relay::spawn("relay-room", fresh_metrics(), CHANNEL_CAPACITY);

    let mut a = Client::new();
    let mut b = Client::new();
    a.join(&room, "", "").await;
    let presence = a.recv_json().await;
    assert_eq!(msg_type(&presence), "presence");
    assert_eq!(presence["n"], 1);

    b.join(&room, "", "").await;
    let _ = a.recv_json().await; // presence n=2, broadcast to a
    let presence_b = b.recv_json().await;
    assert_eq!(presence_b["n"], 2);

    room.message(a.conn_id, json!({"sdp": "offer", "candidate": 1}).to_string()).await;

    let forwarded_b = b.recv_json().await;
    assert_eq!(forwarded_b["sdp"], "offer");
    assert_eq!(forwarded_b["candidate"], 1);

    let forwarded_a = a.recv_json().await;
    assert_eq!(forwarded_a["sdp"], "offer");
    assert_eq!(forwarded_a["candidate"], 1);
}

#[tokio::test]
async fn relay_unparseable_frame_is_silently_dropped() {
    let room = relay::spawn("relay-garbage", fresh_metrics(), CHANNEL_CAPACITY);

    let mut a = Client::new();
    let mut b = Client::new();
    a.join(&room, "", "").await;
    let _ = a.recv_json().await;
    b.join(&room, "", "").await;
    let _ = a.recv_json().await;
    let _ = b.recv_json().await;

    room.message(a.conn_id, "not json at all".to_string()).await;

    // Nothing arrives for the garbage frame; the next real message still works.
    room.message(a.conn_id, json!({"ok": true}).to_string()).await;
    let forwarded = b.recv_json().await;
    assert_eq!(forwarded["ok"], true);
}

#[tokio::test]
async fn relay_presence_updates_on_close() {
    let room = relay::spawn("relay-close", fresh_metrics(), CHANNEL_CAPACITY);

    let mut a = Client::new();
    let mut b = Client::new();
    a.join(&room, "", "").await;
    let _ = a.recv_json().await;
    b.join(&room, "", "").await;
    let _ = a.recv_json().await;
    let _ = b.recv_json().await;

    room.close(a.conn_id).await;
    let presence = b.recv_json().await;
    assert_eq!(presence["n"], 1);
}

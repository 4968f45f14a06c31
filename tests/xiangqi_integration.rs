mod test_helpers;

use room_server::room::xiangqi;
use serde_json::json;
use test_helpers::{fresh_metrics, fresh_store, msg_type, Client, CHANNEL_CAPACITY, GRACE_SECS};

#[tokio::test]
async fn xiangqi_legal_move_is_accepted_and_broadcast() {
    let room = xiangqi::spawn("legal-move", fresh_store(), fresh_metrics(), GRACE_SECS, CHANNEL_CAPACITY);

    let mut red = Client::new();
    let mut black = Client::new();
    red.join(&room, "", "red").await;
    assert_eq!(red.recv_json().await["you"], 1);
    black.join(&room, "", "black").await;
    assert_eq!(black.recv_json_matching(|v| msg_type(v) == "init").await["you"], 2);
    let _ = red.recv_json().await; // presence
    let _ = red.recv_json().await; // xq_seats

    // 马二进三: red horse (9,1) -> (7,2), legal opening move.
    room.message(
        red.conn_id,
        json!({"type": "xq_move", "from": {"r": 9, "c": 1}, "to": {"r": 7, "c": 2}}).to_string(),
    )
    .await;

    let mv = black.recv_json_matching(|v| msg_type(v) == "xq_move").await;
    assert_eq!(mv["from"], json!({"r": 9, "c": 1}));
    assert_eq!(mv["to"], json!({"r": 7, "c": 2}));
    assert_eq!(mv["next"], 2);
}

#[tokio::test]
async fn xiangqi_illegal_move_is_rejected_with_resync() {
    let room = xiangqi::spawn("illegal-move", fresh_store(), fresh_metrics(), GRACE_SECS, CHANNEL_CAPACITY);

    let mut red = Client::new();
    red.join(&room, "", "red").await;
    let _ = red.recv_json().await;

    // Elephant at (9,2) cannot cross the river to (5,4).
    room.message(
        red.conn_id,
        json!({"type": "xq_move", "from": {"r": 9, "c": 2}, "to": {"r": 5, "c": 4}}).to_string(),
    )
    .await;

    let rejection = red.recv_json_matching(|v| msg_type(v) == "reject").await;
    assert_eq!(rejection["reason"], "非法走法");
    assert_eq!(rejection["sync"], true);

    // The rejected move's resync re-sends a full `init`, directed only at red.
    let resync = red.recv_json().await;
    assert_eq!(msg_type(&resync), "init");
    assert_eq!(resync["you"], 1);
    assert!(resync["moves"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn xiangqi_out_of_bounds_move_is_rejected_before_engine() {
    let room = xiangqi::spawn("xq-bounds", fresh_store(), fresh_metrics(), GRACE_SECS, CHANNEL_CAPACITY);

    let mut red = Client::new();
    red.join(&room, "", "red").await;
    let _ = red.recv_json().await;

    room.message(
        red.conn_id,
        json!({"type": "xq_move", "from": {"r": 9, "c": 1}, "to": {"r": 10, "c": 2}}).to_string(),
    )
    .await;

    let rejection = red.recv_json_matching(|v| msg_type(v) == "reject").await;
    assert_eq!(rejection["reason"], "越界");
}

#[tokio::test]
async fn xiangqi_spectator_move_is_rejected() {
    let room = xiangqi::spawn("xq-spectator", fresh_store(), fresh_metrics(), GRACE_SECS, CHANNEL_CAPACITY);

    let mut red = Client::new();
    let mut black = Client::new();
    let mut watcher = Client::new();
    red.join(&room, "", "red").await;
    let _ = red.recv_json().await;
    black.join(&room, "", "black").await;
    let _ = black.recv_json_matching(|v| msg_type(v) == "init").await;
    watcher.join(&room, "", "spectate").await;
    let init = watcher.recv_json_matching(|v| msg_type(v) == "init").await;
    assert_eq!(init["you"], 0);

    room.message(
        watcher.conn_id,
        json!({"type": "xq_move", "from": {"r": 9, "c": 1}, "to": {"r": 7, "c": 2}}).to_string(),
    )
    .await;
    let rejection = watcher.recv_json_matching(|v| msg_type(v) == "reject").await;
    assert_eq!(rejection["reason"], "观战不能落子");
}

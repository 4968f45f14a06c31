//! Gomoku room actor (C4, spec.md §4.4).

use super::{broadcast_all, close_conn, send_direct, ConnEntry, RoomEvent, RoomHandle};
use crate::broadcast::ConnId;
use crate::engine::gomoku::is_winning_move;
use crate::metrics::ServerMetrics;
use crate::protocol::{
    now_millis, parse_want, GomokuClientMessage, GomokuMove, GomokuRoom, GomokuSeatsView,
    GomokuServerMessage, Role, RoomKind, VotesView,
};
use crate::retry::retry_storage_operation;
use crate::seat::{self, Allocation, OnlineSeats};
use crate::store::RoomStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

const REASON_SPECTATOR: &str = "观战不能落子";
const REASON_GAME_OVER: &str = "游戏已结束";
const REASON_WRONG_TURN: &str = "还没轮到你";
const REASON_OUT_OF_BOUNDS: &str = "越界";
const REASON_OCCUPIED: &str = "已有棋子";
const REASON_FIVE_IN_A_ROW: &str = "五连";
const REASON_TIMEOUT_LOSS: &str = "超时判负";

pub fn spawn(
    room_id: impl Into<Arc<str>>,
    store: Arc<dyn RoomStore>,
    metrics: Arc<ServerMetrics>,
    grace_period_secs: u64,
    channel_capacity: usize,
) -> RoomHandle {
    let room_id = room_id.into();
    let (tx, rx) = mpsc::channel(channel_capacity);
    let handle = RoomHandle::new(room_id.clone(), tx);
    tokio::spawn(run(room_id, store, metrics, grace_period_secs, rx));
    handle
}

async fn run(
    room_id: Arc<str>,
    store: Arc<dyn RoomStore>,
    metrics: Arc<ServerMetrics>,
    grace_period_secs: u64,
    mut rx: mpsc::Receiver<RoomEvent>,
) {
    let mut conns: HashMap<ConnId, ConnEntry> = HashMap::new();
    let mut record = match store.load_gomoku(&room_id).await {
        Ok(room) => room,
        Err(err) => {
            warn!(room = %room_id, error = %err, "failed to load gomoku room, starting from defaults");
            GomokuRoom::default()
        }
    };
    metrics.increment_rooms_created();

    while let Some(event) = rx.recv().await {
        match event {
            RoomEvent::Open {
                conn_id,
                outbound,
                token,
                want,
            } => {
                handle_open(
                    &room_id,
                    &store,
                    &metrics,
                    grace_period_secs,
                    &mut conns,
                    &mut record,
                    conn_id,
                    outbound,
                    token,
                    want,
                )
                .await;
            }
            RoomEvent::Message { conn_id, raw } => {
                handle_message(&room_id, &store, &metrics, &mut conns, &mut record, conn_id, &raw)
                    .await;
            }
            RoomEvent::Close { conn_id } => {
                handle_close(&room_id, &store, &metrics, &mut conns, &mut record, conn_id).await;
            }
        }
    }
}

fn online_seats(conns: &HashMap<ConnId, ConnEntry>, record: &GomokuRoom) -> OnlineSeats {
    let mut online = OnlineSeats::default();
    for entry in conns.values() {
        match record.seats.role_from_token(&entry.token) {
            Role::A => online.a = true,
            Role::B => online.b = true,
            Role::Spectator => {}
        }
    }
    online
}

fn seats_view(record: &GomokuRoom) -> GomokuSeatsView {
    let (black, white) = record.seats.occupancy();
    GomokuSeatsView { black, white }
}

fn votes_view(record: &GomokuRoom) -> VotesView {
    VotesView {
        rematch: record.seats.rematch.clone(),
        swap: record.seats.swap.clone(),
    }
}

async fn persist(room_id: &str, store: &Arc<dyn RoomStore>, metrics: &Arc<ServerMetrics>, record: &GomokuRoom) {
    let result = retry_storage_operation(
        "gomoku_put",
        || async { store.put_gomoku(room_id, record).await.map_err(anyhow::Error::from) },
        Some(metrics.clone()),
    )
    .await;
    if let Err(err) = result {
        metrics.increment_persistence_failures();
        warn!(room = %room_id, error = %err, "gomoku room persist failed after retries");
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_open(
    room_id: &str,
    store: &Arc<dyn RoomStore>,
    metrics: &Arc<ServerMetrics>,
    grace_period_secs: u64,
    conns: &mut HashMap<ConnId, ConnEntry>,
    record: &mut GomokuRoom,
    conn_id: ConnId,
    outbound: super::OutboundSender,
    token: String,
    want_raw: String,
) {
    conns.insert(
        conn_id,
        ConnEntry {
            outbound,
            token: token.clone(),
        },
    );
    metrics.record_connect();

    let want = parse_want(&want_raw, RoomKind::Gomoku);
    let online = online_seats(conns, record);
    let now = now_millis();
    let allocation = seat::allocate(&record.seats, &token, want, online, now, grace_period_secs);

    let (role, seat_token) = match &allocation {
        Allocation::Reconnect { role } => {
            metrics.increment_reconnects();
            (*role, record.seats.token_for(*role))
        }
        Allocation::Assigned { role, token } => {
            let had_prior = !record.seats.token_for(*role).is_empty();
            if had_prior {
                metrics.increment_seats_stolen();
            } else {
                metrics.increment_seats_assigned();
            }
            (*role, token.clone())
        }
        Allocation::Spectator => (Role::Spectator, String::new()),
    };
    seat::apply(&mut record.seats, &allocation, now);

    if role.is_player() {
        let dupes: Vec<ConnId> = conns
            .iter()
            .filter(|(id, entry)| **id != conn_id && entry.token == seat_token)
            .map(|(id, _)| *id)
            .collect();
        for dupe in dupes {
            close_conn(conns, dupe, 1000, "reconnect");
            conns.remove(&dupe);
            metrics.increment_duplicate_connections_evicted();
        }
    }

    if let Some(entry) = conns.get_mut(&conn_id) {
        entry.token = seat_token.clone();
    }

    persist(room_id, store, metrics, record).await;

    let init = GomokuServerMessage::Init {
        you: role,
        token: if role == Role::Spectator { String::new() } else { seat_token },
        moves: record.moves.clone(),
        current: record.seats.current,
        game_over: record.seats.game_over,
        winner: record.seats.winner,
        reason: record.seats.reason.clone(),
        seats: seats_view(record),
        votes: votes_view(record),
    };
    send_direct(conns, conn_id, &init);
    broadcast_all(conns, &GomokuServerMessage::Presence { n: conns.len() });
    broadcast_all(conns, &GomokuServerMessage::Seats { seats: seats_view(record) });
}

async fn handle_message(
    room_id: &str,
    store: &Arc<dyn RoomStore>,
    metrics: &Arc<ServerMetrics>,
    conns: &mut HashMap<ConnId, ConnEntry>,
    record: &mut GomokuRoom,
    conn_id: ConnId,
    raw: &str,
) {
    let Some(entry) = conns.get(&conn_id) else {
        return;
    };
    let token = entry.token.clone();
    let role = record.seats.role_from_token(&token);

    let Ok(msg) = serde_json::from_str::<GomokuClientMessage>(raw) else {
        return;
    };

    match msg {
        GomokuClientMessage::Move { r, c } => {
            handle_move(room_id, store, metrics, conns, record, conn_id, role, r, c).await;
        }
        GomokuClientMessage::Timeout => {
            handle_timeout(room_id, store, metrics, conns, record, conn_id, role).await;
        }
        GomokuClientMessage::Rematch => {
            handle_rematch(room_id, store, metrics, conns, record, conn_id, role).await;
        }
        GomokuClientMessage::Swap => {
            handle_swap(room_id, store, metrics, conns, record, conn_id, role).await;
        }
        GomokuClientMessage::Leave => {
            handle_leave(room_id, store, metrics, conns, record, conn_id, role, &token).await;
        }
    }
}

fn reject(conns: &HashMap<ConnId, ConnEntry>, conn_id: ConnId, reason: &str) {
    send_direct(
        conns,
        conn_id,
        &GomokuServerMessage::Reject { reason: reason.to_string() },
    );
}

#[allow(clippy::too_many_arguments)]
async fn handle_move(
    room_id: &str,
    store: &Arc<dyn RoomStore>,
    metrics: &Arc<ServerMetrics>,
    conns: &mut HashMap<ConnId, ConnEntry>,
    record: &mut GomokuRoom,
    conn_id: ConnId,
    role: Role,
    r: i32,
    c: i32,
) {
    if !role.is_player() {
        metrics.increment_moves_rejected();
        reject(conns, conn_id, REASON_SPECTATOR);
        return;
    }
    if record.seats.game_over {
        metrics.increment_moves_rejected();
        reject(conns, conn_id, REASON_GAME_OVER);
        return;
    }
    if record.seats.current != role {
        metrics.increment_moves_rejected();
        reject(conns, conn_id, REASON_WRONG_TURN);
        return;
    }
    if !(0..crate::engine::gomoku::BOARD_SIZE).contains(&r)
        || !(0..crate::engine::gomoku::BOARD_SIZE).contains(&c)
    {
        metrics.increment_moves_rejected();
        reject(conns, conn_id, REASON_OUT_OF_BOUNDS);
        return;
    }
    if record.moves.iter().any(|m| m.r == r && m.c == c) {
        metrics.increment_moves_rejected();
        reject(conns, conn_id, REASON_OCCUPIED);
        return;
    }

    let win = is_winning_move(&record.moves, r, c, role);
    record.moves.push(GomokuMove { r, c, p: role });
    record.seats.touch(role, now_millis());
    record.seats.clear_votes();

    if win {
        record.seats.game_over = true;
        record.seats.winner = role;
        record.seats.reason = REASON_FIVE_IN_A_ROW.to_string();
        broadcast_all(
            conns,
            &GomokuServerMessage::Move {
                r,
                c,
                p: role,
                next: None,
                win: Some(role),
                reason: Some(REASON_FIVE_IN_A_ROW.to_string()),
            },
        );
        metrics.increment_games_completed();
        info!(room = %room_id, winner = ?role, "gomoku game won");
    } else {
        record.seats.current = role.opponent();
        broadcast_all(
            conns,
            &GomokuServerMessage::Move {
                r,
                c,
                p: role,
                next: Some(record.seats.current),
                win: None,
                reason: None,
            },
        );
    }
    metrics.increment_moves_accepted();
    persist(room_id, store, metrics, record).await;
}

async fn handle_timeout(
    room_id: &str,
    store: &Arc<dyn RoomStore>,
    metrics: &Arc<ServerMetrics>,
    conns: &mut HashMap<ConnId, ConnEntry>,
    record: &mut GomokuRoom,
    conn_id: ConnId,
    role: Role,
) {
    if !role.is_player() {
        reject(conns, conn_id, REASON_SPECTATOR);
        return;
    }
    if record.seats.game_over {
        reject(conns, conn_id, REASON_GAME_OVER);
        return;
    }
    let winner = role.opponent();
    record.seats.game_over = true;
    record.seats.winner = winner;
    record.seats.reason = REASON_TIMEOUT_LOSS.to_string();
    record.seats.clear_votes();
    broadcast_all(
        conns,
        &GomokuServerMessage::Move {
            r: -1,
            c: -1,
            p: winner,
            next: None,
            win: Some(winner),
            reason: Some(REASON_TIMEOUT_LOSS.to_string()),
        },
    );
    metrics.increment_games_completed();
    persist(room_id, store, metrics, record).await;
}

async fn handle_rematch(
    room_id: &str,
    store: &Arc<dyn RoomStore>,
    metrics: &Arc<ServerMetrics>,
    conns: &mut HashMap<ConnId, ConnEntry>,
    record: &mut GomokuRoom,
    conn_id: ConnId,
    role: Role,
) {
    if !role.is_player() {
        reject(conns, conn_id, REASON_SPECTATOR);
        return;
    }
    if !record.seats.game_over {
        reject(conns, conn_id, REASON_GAME_OVER);
        return;
    }
    record.seats.rematch.set(role, true);
    broadcast_all(conns, &GomokuServerMessage::RematchPending {});
    broadcast_all(conns, &GomokuServerMessage::Votes { votes: votes_view(record) });

    let (a_seated, b_seated) = record.seats.occupancy();
    if record.seats.rematch.both() && a_seated && b_seated {
        record.moves.clear();
        record.seats.reset_game();
        broadcast_all(
            conns,
            &GomokuServerMessage::State {
                moves: record.moves.clone(),
                current: record.seats.current,
                game_over: record.seats.game_over,
            },
        );
        broadcast_all(conns, &GomokuServerMessage::Votes { votes: votes_view(record) });
    }
    persist(room_id, store, metrics, record).await;
}

async fn handle_swap(
    room_id: &str,
    store: &Arc<dyn RoomStore>,
    metrics: &Arc<ServerMetrics>,
    conns: &mut HashMap<ConnId, ConnEntry>,
    record: &mut GomokuRoom,
    conn_id: ConnId,
    role: Role,
) {
    if !role.is_player() {
        reject(conns, conn_id, REASON_SPECTATOR);
        return;
    }
    if !(record.seats.game_over || record.moves.is_empty()) {
        reject(conns, conn_id, "对局进行中不能换座");
        return;
    }
    record.seats.swap.set(role, true);
    broadcast_all(conns, &GomokuServerMessage::SwapPending {});
    broadcast_all(conns, &GomokuServerMessage::Votes { votes: votes_view(record) });

    let (a_seated, b_seated) = record.seats.occupancy();
    if record.seats.swap.both() && a_seated && b_seated {
        record.seats.swap_seats();
        record.moves.clear();
        record.seats.reset_game();
        broadcast_all(conns, &GomokuServerMessage::Seats { seats: seats_view(record) });
        let directed: Vec<ConnId> = conns.keys().copied().collect();
        for id in directed {
            if let Some(entry) = conns.get(&id) {
                let you = record.seats.role_from_token(&entry.token);
                send_direct(conns, id, &GomokuServerMessage::Role { you });
            }
        }
        broadcast_all(
            conns,
            &GomokuServerMessage::State {
                moves: record.moves.clone(),
                current: record.seats.current,
                game_over: record.seats.game_over,
            },
        );
        broadcast_all(conns, &GomokuServerMessage::Votes { votes: votes_view(record) });
    }
    persist(room_id, store, metrics, record).await;
}

async fn handle_leave(
    room_id: &str,
    store: &Arc<dyn RoomStore>,
    metrics: &Arc<ServerMetrics>,
    conns: &mut HashMap<ConnId, ConnEntry>,
    record: &mut GomokuRoom,
    _conn_id: ConnId,
    role: Role,
    token: &str,
) {
    if role.is_player() && record.seats.token_for(role) == token {
        record.seats.set_token(role, String::new());
        match role {
            Role::A => record.seats.last_seen_a = 0,
            Role::B => record.seats.last_seen_b = 0,
            Role::Spectator => {}
        }
        broadcast_all(conns, &GomokuServerMessage::Seats { seats: seats_view(record) });
        broadcast_all(conns, &GomokuServerMessage::Presence { n: conns.len() });
        persist(room_id, store, metrics, record).await;
    }
}

async fn handle_close(
    room_id: &str,
    store: &Arc<dyn RoomStore>,
    metrics: &Arc<ServerMetrics>,
    conns: &mut HashMap<ConnId, ConnEntry>,
    record: &mut GomokuRoom,
    conn_id: ConnId,
) {
    let Some(entry) = conns.remove(&conn_id) else {
        return;
    };
    metrics.record_disconnect();
    let role = record.seats.role_from_token(&entry.token);
    if role.is_player() {
        record.seats.touch(role, now_millis());
        persist(room_id, store, metrics, record).await;
    }
    broadcast_all(conns, &GomokuServerMessage::Seats { seats: seats_view(record) });
    broadcast_all(conns, &GomokuServerMessage::Presence { n: conns.len() });
}

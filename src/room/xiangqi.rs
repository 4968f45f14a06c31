//! Xiangqi room actor (C4, spec.md §4.5). Same shape as the Gomoku actor;
//! `xq_move` additionally replays the engine (C1) to validate legality and
//! detect terminal positions.

use super::{broadcast_all, close_conn, send_direct, ConnEntry, RoomEvent, RoomHandle};
use crate::broadcast::ConnId;
use crate::engine::xiangqi::{self, Engine};
use crate::metrics::ServerMetrics;
use crate::protocol::{
    now_millis, parse_want, BoardPos, Role, RoomKind, VotesView, XiangqiClientMessage,
    XiangqiMove, XiangqiRoom, XiangqiSeatsView, XiangqiServerMessage,
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
const REASON_ILLEGAL_MOVE: &str = "非法走法";
const REASON_CHECKMATE: &str = "绝杀";
const REASON_STALEMATE: &str = "困毙";
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
    let mut record = match store.load_xiangqi(&room_id).await {
        Ok(room) => room,
        Err(err) => {
            warn!(room = %room_id, error = %err, "failed to load xiangqi room, starting from defaults");
            XiangqiRoom::default()
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

fn online_seats(conns: &HashMap<ConnId, ConnEntry>, record: &XiangqiRoom) -> OnlineSeats {
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

fn seats_view(record: &XiangqiRoom) -> XiangqiSeatsView {
    let (red, black) = record.seats.occupancy();
    XiangqiSeatsView { red, black }
}

fn votes_view(record: &XiangqiRoom) -> VotesView {
    VotesView {
        rematch: record.seats.rematch.clone(),
        swap: record.seats.swap.clone(),
    }
}

fn role_color(role: Role) -> xiangqi::Color {
    match role {
        Role::A => xiangqi::Color::Red,
        Role::B | Role::Spectator => xiangqi::Color::Black,
    }
}

async fn persist(room_id: &str, store: &Arc<dyn RoomStore>, metrics: &Arc<ServerMetrics>, record: &XiangqiRoom) {
    let result = retry_storage_operation(
        "xiangqi_put",
        || async { store.put_xiangqi(room_id, record).await.map_err(anyhow::Error::from) },
        Some(metrics.clone()),
    )
    .await;
    if let Err(err) = result {
        metrics.increment_persistence_failures();
        warn!(room = %room_id, error = %err, "xiangqi room persist failed after retries");
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_open(
    room_id: &str,
    store: &Arc<dyn RoomStore>,
    metrics: &Arc<ServerMetrics>,
    grace_period_secs: u64,
    conns: &mut HashMap<ConnId, ConnEntry>,
    record: &mut XiangqiRoom,
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

    let want = parse_want(&want_raw, RoomKind::Xiangqi);
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

    let init = XiangqiServerMessage::Init {
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
    broadcast_all(conns, &XiangqiServerMessage::Presence { n: conns.len() });
    broadcast_all(conns, &XiangqiServerMessage::Seats { seats: seats_view(record) });
}

async fn handle_message(
    room_id: &str,
    store: &Arc<dyn RoomStore>,
    metrics: &Arc<ServerMetrics>,
    conns: &mut HashMap<ConnId, ConnEntry>,
    record: &mut XiangqiRoom,
    conn_id: ConnId,
    raw: &str,
) {
    let Some(entry) = conns.get(&conn_id) else {
        return;
    };
    let token = entry.token.clone();
    let role = record.seats.role_from_token(&token);

    let Ok(msg) = serde_json::from_str::<XiangqiClientMessage>(raw) else {
        return;
    };

    match msg {
        XiangqiClientMessage::Move { from, to } => {
            handle_move(room_id, store, metrics, conns, record, conn_id, role, from, to).await;
        }
        XiangqiClientMessage::Timeout => {
            handle_timeout(room_id, store, metrics, conns, record, conn_id, role).await;
        }
        XiangqiClientMessage::Rematch => {
            handle_rematch(room_id, store, metrics, conns, record, conn_id, role).await;
        }
        XiangqiClientMessage::Swap => {
            handle_swap(room_id, store, metrics, conns, record, conn_id, role).await;
        }
        XiangqiClientMessage::Leave => {
            handle_leave(room_id, store, metrics, conns, record, conn_id, role, &token).await;
        }
    }
}

fn reject(conns: &HashMap<ConnId, ConnEntry>, conn_id: ConnId, reason: &str, sync: Option<bool>) {
    send_direct(
        conns,
        conn_id,
        &XiangqiServerMessage::Reject { reason: reason.to_string(), sync },
    );
}

/// Resends `init` to resynchronize one socket after a rejected `xq_move`.
fn resync(conns: &HashMap<ConnId, ConnEntry>, conn_id: ConnId, record: &XiangqiRoom) {
    let Some(entry) = conns.get(&conn_id) else {
        return;
    };
    let role = record.seats.role_from_token(&entry.token);
    let token = if role == Role::Spectator {
        String::new()
    } else {
        record.seats.token_for(role)
    };
    let init = XiangqiServerMessage::Init {
        you: role,
        token,
        moves: record.moves.clone(),
        current: record.seats.current,
        game_over: record.seats.game_over,
        winner: record.seats.winner,
        reason: record.seats.reason.clone(),
        seats: seats_view(record),
        votes: votes_view(record),
    };
    send_direct(conns, conn_id, &init);
}

#[allow(clippy::too_many_arguments)]
async fn handle_move(
    room_id: &str,
    store: &Arc<dyn RoomStore>,
    metrics: &Arc<ServerMetrics>,
    conns: &mut HashMap<ConnId, ConnEntry>,
    record: &mut XiangqiRoom,
    conn_id: ConnId,
    role: Role,
    from: BoardPos,
    to: BoardPos,
) {
    if !role.is_player() {
        metrics.increment_moves_rejected();
        reject(conns, conn_id, REASON_SPECTATOR, None);
        return;
    }
    if record.seats.game_over {
        metrics.increment_moves_rejected();
        reject(conns, conn_id, REASON_GAME_OVER, Some(true));
        resync(conns, conn_id, record);
        return;
    }
    if !xiangqi::in_bounds(from.r, from.c) || !xiangqi::in_bounds(to.r, to.c) {
        metrics.increment_moves_rejected();
        reject(conns, conn_id, REASON_OUT_OF_BOUNDS, Some(true));
        resync(conns, conn_id, record);
        return;
    }

    let mut engine = Engine::replay(&record.moves);
    if engine.turn != role_color(role) {
        metrics.increment_moves_rejected();
        reject(conns, conn_id, REASON_WRONG_TURN, Some(true));
        resync(conns, conn_id, record);
        return;
    }

    let from_pos = xiangqi::Pos::new(from.r, from.c);
    let to_pos = xiangqi::Pos::new(to.r, to.c);
    let Some(legal_move) = engine.find_legal_move(from_pos, to_pos) else {
        metrics.increment_moves_rejected();
        reject(conns, conn_id, REASON_ILLEGAL_MOVE, Some(true));
        resync(conns, conn_id, record);
        return;
    };

    engine.apply_move(&legal_move);
    record.moves.push(XiangqiMove {
        from,
        to,
        p: legal_move.piece.kind.code(),
    });
    record.seats.touch(role, now_millis());
    record.seats.clear_votes();
    metrics.increment_moves_accepted();

    let opponent_color = engine.turn;
    let opponent_legal = engine.legal_moves(opponent_color);
    if opponent_legal.is_empty() {
        let reason = if engine.is_checked(opponent_color) {
            REASON_CHECKMATE
        } else {
            REASON_STALEMATE
        };
        record.seats.game_over = true;
        record.seats.winner = role;
        record.seats.reason = reason.to_string();
        broadcast_all(
            conns,
            &XiangqiServerMessage::Move {
                from,
                to,
                p: legal_move.piece.kind.code(),
                next: None,
                win: Some(role),
                reason: Some(reason.to_string()),
            },
        );
        broadcast_all(
            conns,
            &XiangqiServerMessage::Over { winner: role, reason: reason.to_string() },
        );
        metrics.increment_games_completed();
        info!(room = %room_id, winner = ?role, reason, "xiangqi game ended");
    } else {
        record.seats.current = role.opponent();
        broadcast_all(
            conns,
            &XiangqiServerMessage::Move {
                from,
                to,
                p: legal_move.piece.kind.code(),
                next: Some(record.seats.current),
                win: None,
                reason: None,
            },
        );
    }
    persist(room_id, store, metrics, record).await;
}

async fn handle_timeout(
    room_id: &str,
    store: &Arc<dyn RoomStore>,
    metrics: &Arc<ServerMetrics>,
    conns: &mut HashMap<ConnId, ConnEntry>,
    record: &mut XiangqiRoom,
    conn_id: ConnId,
    role: Role,
) {
    if !role.is_player() {
        reject(conns, conn_id, REASON_SPECTATOR, None);
        return;
    }
    if record.seats.game_over {
        reject(conns, conn_id, REASON_GAME_OVER, None);
        return;
    }
    let winner = role.opponent();
    record.seats.game_over = true;
    record.seats.winner = winner;
    record.seats.reason = REASON_TIMEOUT_LOSS.to_string();
    record.seats.clear_votes();
    broadcast_all(
        conns,
        &XiangqiServerMessage::Over { winner, reason: REASON_TIMEOUT_LOSS.to_string() },
    );
    metrics.increment_games_completed();
    persist(room_id, store, metrics, record).await;
}

async fn handle_rematch(
    room_id: &str,
    store: &Arc<dyn RoomStore>,
    metrics: &Arc<ServerMetrics>,
    conns: &mut HashMap<ConnId, ConnEntry>,
    record: &mut XiangqiRoom,
    conn_id: ConnId,
    role: Role,
) {
    if !role.is_player() {
        reject(conns, conn_id, REASON_SPECTATOR, None);
        return;
    }
    if !record.seats.game_over {
        reject(conns, conn_id, REASON_GAME_OVER, None);
        return;
    }
    record.seats.rematch.set(role, true);
    broadcast_all(conns, &XiangqiServerMessage::RematchPending {});
    broadcast_all(conns, &XiangqiServerMessage::Votes { votes: votes_view(record) });

    let (a_seated, b_seated) = record.seats.occupancy();
    if record.seats.rematch.both() && a_seated && b_seated {
        record.moves.clear();
        record.seats.reset_game();
        broadcast_all(
            conns,
            &XiangqiServerMessage::Reset {
                reason: "rematch".to_string(),
                current: record.seats.current,
                moves: record.moves.clone(),
            },
        );
        broadcast_all(conns, &XiangqiServerMessage::Votes { votes: votes_view(record) });
    }
    persist(room_id, store, metrics, record).await;
}

async fn handle_swap(
    room_id: &str,
    store: &Arc<dyn RoomStore>,
    metrics: &Arc<ServerMetrics>,
    conns: &mut HashMap<ConnId, ConnEntry>,
    record: &mut XiangqiRoom,
    conn_id: ConnId,
    role: Role,
) {
    if !role.is_player() {
        reject(conns, conn_id, REASON_SPECTATOR, None);
        return;
    }
    if !(record.seats.game_over || record.moves.is_empty()) {
        reject(conns, conn_id, "对局进行中不能换座", None);
        return;
    }
    record.seats.swap.set(role, true);
    broadcast_all(conns, &XiangqiServerMessage::SwapPending {});
    broadcast_all(conns, &XiangqiServerMessage::Votes { votes: votes_view(record) });

    let (a_seated, b_seated) = record.seats.occupancy();
    if record.seats.swap.both() && a_seated && b_seated {
        record.seats.swap_seats();
        record.moves.clear();
        record.seats.reset_game();
        broadcast_all(conns, &XiangqiServerMessage::Seats { seats: seats_view(record) });
        broadcast_all(
            conns,
            &XiangqiServerMessage::Reset {
                reason: "swap".to_string(),
                current: record.seats.current,
                moves: record.moves.clone(),
            },
        );
        broadcast_all(conns, &XiangqiServerMessage::Votes { votes: votes_view(record) });
        persist(room_id, store, metrics, record).await;

        // Swap forces a reconnect so clients renegotiate identity against
        // their (still-valid, now-transposed) tokens (spec.md §4.5).
        let all_conns: Vec<ConnId> = conns.keys().copied().collect();
        for id in all_conns {
            close_conn(conns, id, 1000, "swap");
        }
        conns.clear();
        return;
    }
    persist(room_id, store, metrics, record).await;
}

async fn handle_leave(
    room_id: &str,
    store: &Arc<dyn RoomStore>,
    metrics: &Arc<ServerMetrics>,
    conns: &mut HashMap<ConnId, ConnEntry>,
    record: &mut XiangqiRoom,
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
        broadcast_all(conns, &XiangqiServerMessage::Seats { seats: seats_view(record) });
        broadcast_all(conns, &XiangqiServerMessage::Presence { n: conns.len() });
        persist(room_id, store, metrics, record).await;
    }
}

async fn handle_close(
    room_id: &str,
    store: &Arc<dyn RoomStore>,
    metrics: &Arc<ServerMetrics>,
    conns: &mut HashMap<ConnId, ConnEntry>,
    record: &mut XiangqiRoom,
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
    broadcast_all(conns, &XiangqiServerMessage::Seats { seats: seats_view(record) });
    broadcast_all(conns, &XiangqiServerMessage::Presence { n: conns.len() });
}

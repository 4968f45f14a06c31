//! Wire message catalog (spec.md §6), one enum pair per room variant.
//!
//! Each variant's JSON `type` tag matches the literal strings in the
//! message catalog (spec.md §6). Seat maps use each game's own key names
//! (`black`/`white` for Gomoku, `red`/`black` for Xiangqi) so a client reads
//! seat occupancy by the name it already knows, not by abstract role letter.
//!
//! Seat occupancy is broadcast as booleans, not the seat tokens themselves —
//! the token is a bearer credential and broadcasting it to every attached
//! spectator would hand out the ability to steal a seat on reconnect.

use super::room_state::{BoardPos, VoteMap};
use super::types::Role;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct GomokuSeatsView {
    pub black: bool,
    pub white: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct XiangqiSeatsView {
    pub red: bool,
    pub black: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct VotesView {
    pub rematch: VoteMap,
    pub swap: VoteMap,
}

// ---------------------------------------------------------------------
// Gomoku
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GomokuClientMessage {
    Move { r: i32, c: i32 },
    Timeout,
    Rematch,
    Swap,
    #[serde(rename = "gm_leave")]
    Leave,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum GomokuServerMessage {
    #[serde(rename = "init")]
    Init {
        you: Role,
        token: String,
        moves: Vec<super::room_state::GomokuMove>,
        current: Role,
        #[serde(rename = "gameOver")]
        game_over: bool,
        winner: Role,
        reason: String,
        seats: GomokuSeatsView,
        votes: VotesView,
    },
    #[serde(rename = "role")]
    Role { you: Role },
    #[serde(rename = "presence")]
    Presence { n: usize },
    #[serde(rename = "gm_seats")]
    Seats { seats: GomokuSeatsView },
    #[serde(rename = "move")]
    Move {
        r: i32,
        c: i32,
        p: Role,
        #[serde(skip_serializing_if = "Option::is_none")]
        next: Option<Role>,
        #[serde(skip_serializing_if = "Option::is_none")]
        win: Option<Role>,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    #[serde(rename = "state")]
    State {
        moves: Vec<super::room_state::GomokuMove>,
        current: Role,
        #[serde(rename = "gameOver")]
        game_over: bool,
    },
    #[serde(rename = "rematch_pending")]
    RematchPending {},
    #[serde(rename = "swap_pending")]
    SwapPending {},
    #[serde(rename = "votes")]
    Votes { votes: VotesView },
    #[serde(rename = "reject")]
    Reject { reason: String },
}

// ---------------------------------------------------------------------
// Xiangqi
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum XiangqiClientMessage {
    #[serde(rename = "xq_move")]
    Move { from: BoardPos, to: BoardPos },
    #[serde(rename = "xq_timeout")]
    Timeout,
    #[serde(rename = "xq_rematch")]
    Rematch,
    #[serde(rename = "xq_swap")]
    Swap,
    #[serde(rename = "xq_leave")]
    Leave,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum XiangqiServerMessage {
    #[serde(rename = "init")]
    Init {
        you: Role,
        token: String,
        moves: Vec<super::room_state::XiangqiMove>,
        current: Role,
        #[serde(rename = "gameOver")]
        game_over: bool,
        winner: Role,
        reason: String,
        seats: XiangqiSeatsView,
        votes: VotesView,
    },
    #[serde(rename = "role")]
    Role { you: Role },
    #[serde(rename = "presence")]
    Presence { n: usize },
    #[serde(rename = "xq_seats")]
    Seats { seats: XiangqiSeatsView },
    #[serde(rename = "xq_move")]
    Move {
        from: BoardPos,
        to: BoardPos,
        p: char,
        #[serde(skip_serializing_if = "Option::is_none")]
        next: Option<Role>,
        #[serde(skip_serializing_if = "Option::is_none")]
        win: Option<Role>,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    #[serde(rename = "xq_over")]
    Over { winner: Role, reason: String },
    #[serde(rename = "xq_reset")]
    Reset {
        reason: String,
        current: Role,
        moves: Vec<super::room_state::XiangqiMove>,
    },
    #[serde(rename = "rematch_pending")]
    RematchPending {},
    #[serde(rename = "swap_pending")]
    SwapPending {},
    #[serde(rename = "xq_votes")]
    Votes { votes: VotesView },
    #[serde(rename = "reject")]
    Reject {
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        sync: Option<bool>,
    },
}

// ---------------------------------------------------------------------
// Relay — arbitrary JSON passed through verbatim (no schema, spec.md §4.6).
// ---------------------------------------------------------------------

pub type RelayMessage = serde_json::Value;

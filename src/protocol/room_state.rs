//! The persisted room record (C2, spec.md §3).

use super::types::{Role, SeatToken};
use serde::{Deserialize, Serialize};

/// Wall-clock milliseconds since epoch. `0` means "never".
pub type MillisTimestamp = u64;

pub fn now_millis() -> MillisTimestamp {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Per-role vote collection for a proposed reset (rematch or side-swap).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoteMap {
    #[serde(default)]
    pub a: bool,
    #[serde(default)]
    pub b: bool,
}

impl VoteMap {
    pub fn clear(&mut self) {
        self.a = false;
        self.b = false;
    }

    pub fn set(&mut self, role: Role, value: bool) {
        match role {
            Role::A => self.a = value,
            Role::B => self.b = value,
            Role::Spectator => {}
        }
    }

    pub fn get(&self, role: Role) -> bool {
        match role {
            Role::A => self.a,
            Role::B => self.b,
            Role::Spectator => false,
        }
    }

    pub fn both(&self) -> bool {
        self.a && self.b
    }
}

/// Seat bookkeeping shared by both Gomoku and Xiangqi rooms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatState {
    #[serde(rename = "tokenA", default)]
    pub token_a: SeatToken,
    #[serde(rename = "tokenB", default)]
    pub token_b: SeatToken,
    #[serde(rename = "lastSeenA", default)]
    pub last_seen_a: MillisTimestamp,
    #[serde(rename = "lastSeenB", default)]
    pub last_seen_b: MillisTimestamp,
    #[serde(default = "default_current")]
    pub current: Role,
    #[serde(rename = "gameOver", default)]
    pub game_over: bool,
    #[serde(default)]
    pub winner: Role,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub rematch: VoteMap,
    #[serde(default)]
    pub swap: VoteMap,
}

fn default_current() -> Role {
    Role::A
}

impl Default for SeatState {
    fn default() -> Self {
        Self {
            token_a: String::new(),
            token_b: String::new(),
            last_seen_a: 0,
            last_seen_b: 0,
            current: Role::A,
            game_over: false,
            winner: Role::Spectator,
            reason: String::new(),
            rematch: VoteMap::default(),
            swap: VoteMap::default(),
        }
    }
}

impl SeatState {
    /// Maps a bearer token to the role it currently authorizes (spec.md §4.3
    /// "roleFromToken"): stolen/stale tokens resolve to no authority.
    pub fn role_from_token(&self, token: &str) -> Role {
        if !token.is_empty() && token == self.token_a {
            Role::A
        } else if !token.is_empty() && token == self.token_b {
            Role::B
        } else {
            Role::Spectator
        }
    }

    pub fn token_for(&self, role: Role) -> SeatToken {
        match role {
            Role::A => self.token_a.clone(),
            Role::B => self.token_b.clone(),
            Role::Spectator => String::new(),
        }
    }

    pub fn set_token(&mut self, role: Role, token: SeatToken) {
        match role {
            Role::A => self.token_a = token,
            Role::B => self.token_b = token,
            Role::Spectator => {}
        }
    }

    pub fn touch(&mut self, role: Role, now: MillisTimestamp) {
        match role {
            Role::A => self.last_seen_a = now,
            Role::B => self.last_seen_b = now,
            Role::Spectator => {}
        }
    }

    pub fn last_seen(&self, role: Role) -> MillisTimestamp {
        match role {
            Role::A => self.last_seen_a,
            Role::B => self.last_seen_b,
            Role::Spectator => 0,
        }
    }

    /// Clear vote maps: invariant 6 in spec.md §3 — every accepted move and
    /// every reset wipes both rematch and swap votes.
    pub fn clear_votes(&mut self) {
        self.rematch.clear();
        self.swap.clear();
    }

    /// Reset to a fresh game while keeping seat occupancy (rematch/swap §4.4).
    pub fn reset_game(&mut self) {
        self.current = Role::A;
        self.game_over = false;
        self.winner = Role::Spectator;
        self.reason = String::new();
        self.clear_votes();
    }

    /// Exchange seat occupancy for a side-swap (spec.md §4.4 `swap`).
    pub fn swap_seats(&mut self) {
        std::mem::swap(&mut self.token_a, &mut self.token_b);
        std::mem::swap(&mut self.last_seen_a, &mut self.last_seen_b);
    }

    /// Occupancy only — never the token itself (see `messages.rs` doc comment).
    pub fn occupancy(&self) -> (bool, bool) {
        (!self.token_a.is_empty(), !self.token_b.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GomokuMove {
    pub r: i32,
    pub c: i32,
    pub p: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GomokuRoom {
    #[serde(flatten)]
    pub seats: SeatState,
    #[serde(default)]
    pub moves: Vec<GomokuMove>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoardPos {
    pub r: i32,
    pub c: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct XiangqiMove {
    pub from: BoardPos,
    pub to: BoardPos,
    pub p: char,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct XiangqiRoom {
    #[serde(flatten)]
    pub seats: SeatState,
    #[serde(default)]
    pub moves: Vec<XiangqiMove>,
}

impl Default for Role {
    fn default() -> Self {
        Role::Spectator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_from_token_resolves_and_invalidates() {
        let mut seats = SeatState::default();
        seats.set_token(Role::A, "tok-a".to_string());
        assert_eq!(seats.role_from_token("tok-a"), Role::A);
        assert_eq!(seats.role_from_token("unknown"), Role::Spectator);
        assert_eq!(seats.role_from_token(""), Role::Spectator);
    }

    #[test]
    fn reset_clears_votes_and_restores_defaults() {
        let mut seats = SeatState::default();
        seats.game_over = true;
        seats.winner = Role::A;
        seats.reason = "五连".to_string();
        seats.rematch.set(Role::A, true);
        seats.rematch.set(Role::B, true);
        seats.current = Role::B;

        seats.reset_game();

        assert!(!seats.game_over);
        assert_eq!(seats.current, Role::A);
        assert!(!seats.rematch.both());
        assert_eq!(seats.reason, "");
    }

    #[test]
    fn swap_seats_exchanges_tokens_and_last_seen() {
        let mut seats = SeatState::default();
        seats.set_token(Role::A, "tok-a".to_string());
        seats.set_token(Role::B, "tok-b".to_string());
        seats.last_seen_a = 10;
        seats.last_seen_b = 20;

        seats.swap_seats();

        assert_eq!(seats.token_a, "tok-b");
        assert_eq!(seats.token_b, "tok-a");
        assert_eq!(seats.last_seen_a, 20);
        assert_eq!(seats.last_seen_b, 10);
    }

    #[test]
    fn room_round_trips_through_json() {
        let mut room = GomokuRoom::default();
        room.seats.set_token(Role::A, "tok-a".to_string());
        room.moves.push(GomokuMove {
            r: 9,
            c: 9,
            p: Role::A,
        });

        let json = serde_json::to_string(&room).unwrap();
        let restored: GomokuRoom = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.seats.token_a, "tok-a");
        assert_eq!(restored.moves.len(), 1);
    }

    #[test]
    fn unknown_fields_tolerated_on_read() {
        let json = r#"{"tokenA":"t","extraField":"ignored"}"#;
        let room: GomokuRoom = serde_json::from_str(json).unwrap();
        assert_eq!(room.seats.token_a, "t");
        assert_eq!(room.seats.current, Role::A);
    }
}

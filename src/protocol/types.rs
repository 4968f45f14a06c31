//! Core identifiers: room kinds, seat roles, seat tokens, seat preference.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The three room kinds a connection can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomKind {
    Gomoku,
    Xiangqi,
    Relay,
}

/// A seat role within a room. `0` is spectator; `1`/`2` are the two playable
/// seats (A/B in spec terms — Black/White for Gomoku, Red/Black for Xiangqi).
/// Serializes as its bare numeric discriminant, matching the wire protocol's
/// `you`/`winner`/`p` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Role {
    Spectator = 0,
    A = 1,
    B = 2,
}

impl Serialize for Role {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = u8::deserialize(deserializer)?;
        Role::from_u8(raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid role value {raw}")))
    }
}

impl Role {
    pub const fn is_player(self) -> bool {
        matches!(self, Self::A | Self::B)
    }

    pub const fn opponent(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
            Self::Spectator => Self::Spectator,
        }
    }

    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Spectator),
            1 => Some(Self::A),
            2 => Some(Self::B),
            _ => None,
        }
    }
}

/// An opaque, unguessable seat bearer credential (spec.md §3 "Seat token").
pub type SeatToken = String;

pub fn mint_token() -> SeatToken {
    Uuid::new_v4().to_string()
}

/// Seat preference presented by an incoming connection ("want" query param).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Want {
    Auto,
    A,
    B,
    Spectate,
}

/// Parse the `want` query parameter, applying the game-specific aliases from
/// spec.md §6. Seat A is Black for Gomoku but Red for Xiangqi, so the
/// "black"/"b" alias is disambiguated by `kind`.
pub fn parse_want(raw: &str, kind: RoomKind) -> Want {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "auto" => Want::Auto,
        "a" | "1" | "red" | "r" => Want::A,
        "b" | "2" | "white" | "w" => Want::B,
        "black" => {
            if kind == RoomKind::Xiangqi {
                Want::B
            } else {
                Want::A
            }
        }
        "spectate" | "watch" | "0" => Want::Spectate,
        _ => Want::Auto,
    }
}

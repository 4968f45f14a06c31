//! Seat allocator (C3, spec.md §4.2): given a presented token and a seat
//! preference, deterministically decide reconnect / assign / steal / spectate.
//! Pure — no I/O, no locking.

use crate::protocol::{MillisTimestamp, Role, SeatState, SeatToken, Want};

/// Whether each playable seat currently has a live connection attached.
/// Stealing requires the target seat to have none.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnlineSeats {
    pub a: bool,
    pub b: bool,
}

impl OnlineSeats {
    fn is_online(self, role: Role) -> bool {
        match role {
            Role::A => self.a,
            Role::B => self.b,
            Role::Spectator => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Allocation {
    /// Presented token matched an occupied seat; same role, no new token.
    Reconnect { role: Role },
    /// A free or grace-expired seat was claimed; a token was minted.
    Assigned { role: Role, token: SeatToken },
    Spectator,
}

fn can_steal(seats: &SeatState, role: Role, online: OnlineSeats, now: MillisTimestamp, grace_ms: u64) -> bool {
    let token = seats.token_for(role);
    if token.is_empty() || online.is_online(role) {
        return false;
    }
    now.saturating_sub(seats.last_seen(role)) > grace_ms
}

/// Implements the 6-step algorithm of spec.md §4.2.
pub fn allocate(
    seats: &SeatState,
    token: &str,
    want: Want,
    online: OnlineSeats,
    now: MillisTimestamp,
    grace_secs: u64,
) -> Allocation {
    // 1. Token match: an existing seat token always reconnects to its role.
    if !token.is_empty() && token == seats.token_a {
        return Allocation::Reconnect { role: Role::A };
    }
    if !token.is_empty() && token == seats.token_b {
        return Allocation::Reconnect { role: Role::B };
    }

    // 2. Explicit spectate request.
    if want == Want::Spectate {
        return Allocation::Spectator;
    }

    let grace_ms = grace_secs.saturating_mul(1000);
    let can_steal_a = can_steal(seats, Role::A, online, now, grace_ms);
    let can_steal_b = can_steal(seats, Role::B, online, now, grace_ms);

    // 4. Try A: free seat, or steal a grace-expired one.
    if matches!(want, Want::A | Want::Auto) && (seats.token_a.is_empty() || can_steal_a) {
        return Allocation::Assigned {
            role: Role::A,
            token: crate::protocol::mint_token(),
        };
    }

    // 5. Try B, symmetric.
    if matches!(want, Want::B | Want::Auto) && (seats.token_b.is_empty() || can_steal_b) {
        return Allocation::Assigned {
            role: Role::B,
            token: crate::protocol::mint_token(),
        };
    }

    // 6. Both seats occupied by live-or-not-yet-grace-expired holders.
    Allocation::Spectator
}

/// Applies an [`Allocation`] to the room record: refreshes `lastSeen` on
/// reconnect, installs the new token and `lastSeen` on assignment, leaves the
/// record untouched for spectators.
pub fn apply(seats: &mut SeatState, allocation: &Allocation, now: MillisTimestamp) {
    match allocation {
        Allocation::Reconnect { role } => seats.touch(*role, now),
        Allocation::Assigned { role, token } => {
            seats.set_token(*role, token.clone());
            seats.touch(*role, now);
        }
        Allocation::Spectator => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRACE_SECS: u64 = 180;

    #[test]
    fn first_two_connections_get_a_then_b() {
        let mut seats = SeatState::default();
        let online = OnlineSeats::default();

        let a = allocate(&seats, "", Want::Auto, online, 1_000, GRACE_SECS);
        assert!(matches!(a, Allocation::Assigned { role: Role::A, .. }));
        apply(&mut seats, &a, 1_000);

        let b = allocate(&seats, "", Want::Auto, online, 1_000, GRACE_SECS);
        assert!(matches!(b, Allocation::Assigned { role: Role::B, .. }));
    }

    #[test]
    fn reconnect_with_valid_token_is_idempotent() {
        let mut seats = SeatState::default();
        seats.set_token(Role::A, "tok-a".to_string());
        seats.last_seen_a = 500;

        let result = allocate(&seats, "tok-a", Want::Auto, OnlineSeats::default(), 9_000, GRACE_SECS);
        assert_eq!(result, Allocation::Reconnect { role: Role::A });
    }

    #[test]
    fn steal_at_exactly_grace_is_rejected() {
        let mut seats = SeatState::default();
        seats.set_token(Role::A, "tok-a".to_string());
        seats.last_seen_a = 0;

        let now = GRACE_SECS * 1000; // now - lastSeen == GRACE, not >
        let result = allocate(&seats, "", Want::A, OnlineSeats::default(), now, GRACE_SECS);
        assert_eq!(result, Allocation::Spectator);
    }

    #[test]
    fn steal_strictly_past_grace_is_allowed() {
        let mut seats = SeatState::default();
        seats.set_token(Role::A, "tok-a".to_string());
        seats.last_seen_a = 0;

        let now = GRACE_SECS * 1000 + 1;
        let result = allocate(&seats, "", Want::A, OnlineSeats::default(), now, GRACE_SECS);
        assert!(matches!(result, Allocation::Assigned { role: Role::A, .. }));
    }

    #[test]
    fn cannot_steal_a_seat_with_a_live_connection() {
        let mut seats = SeatState::default();
        seats.set_token(Role::A, "tok-a".to_string());
        seats.last_seen_a = 0;
        let online = OnlineSeats { a: true, b: false };

        let now = GRACE_SECS * 1000 + 10_000;
        let result = allocate(&seats, "", Want::A, online, now, GRACE_SECS);
        assert_eq!(result, Allocation::Spectator);
    }

    #[test]
    fn both_seats_taken_falls_back_to_spectator() {
        let mut seats = SeatState::default();
        seats.set_token(Role::A, "tok-a".to_string());
        seats.set_token(Role::B, "tok-b".to_string());
        seats.last_seen_a = 1_000;
        seats.last_seen_b = 1_000;
        let online = OnlineSeats { a: true, b: true };

        let result = allocate(&seats, "", Want::Auto, online, 2_000, GRACE_SECS);
        assert_eq!(result, Allocation::Spectator);
    }

    #[test]
    fn explicit_spectate_always_wins() {
        let seats = SeatState::default();
        let result = allocate(&seats, "", Want::Spectate, OnlineSeats::default(), 0, GRACE_SECS);
        assert_eq!(result, Allocation::Spectator);
    }
}

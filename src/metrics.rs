use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the room server, exposed as a JSON snapshot over `/metrics`.
#[derive(Debug, Default)]
pub struct ServerMetrics {
    pub total_connections: AtomicU64,
    pub active_connections: AtomicU64,
    pub rooms_created: AtomicU64,
    pub moves_accepted: AtomicU64,
    pub moves_rejected: AtomicU64,
    pub seats_assigned: AtomicU64,
    pub seats_stolen: AtomicU64,
    pub reconnects: AtomicU64,
    pub duplicate_connections_evicted: AtomicU64,
    pub games_completed: AtomicU64,
    pub retry_attempts: AtomicU64,
    pub retry_successes: AtomicU64,
    pub persistence_failures: AtomicU64,
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_connections: u64,
    pub active_connections: u64,
    pub rooms_created: u64,
    pub moves_accepted: u64,
    pub moves_rejected: u64,
    pub seats_assigned: u64,
    pub seats_stolen: u64,
    pub reconnects: u64,
    pub duplicate_connections_evicted: u64,
    pub games_completed: u64,
    pub retry_attempts: u64,
    pub retry_successes: u64,
    pub persistence_failures: u64,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_connect(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_disconnect(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn increment_rooms_created(&self) {
        self.rooms_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_moves_accepted(&self) {
        self.moves_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_moves_rejected(&self) {
        self.moves_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_seats_assigned(&self) {
        self.seats_assigned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_seats_stolen(&self) {
        self.seats_stolen.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_reconnects(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_duplicate_connections_evicted(&self) {
        self.duplicate_connections_evicted
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_games_completed(&self) {
        self.games_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_retry_attempts(&self) {
        self.retry_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_retry_successes(&self) {
        self.retry_successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_persistence_failures(&self) {
        self.persistence_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            rooms_created: self.rooms_created.load(Ordering::Relaxed),
            moves_accepted: self.moves_accepted.load(Ordering::Relaxed),
            moves_rejected: self.moves_rejected.load(Ordering::Relaxed),
            seats_assigned: self.seats_assigned.load(Ordering::Relaxed),
            seats_stolen: self.seats_stolen.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
            duplicate_connections_evicted: self
                .duplicate_connections_evicted
                .load(Ordering::Relaxed),
            games_completed: self.games_completed.load(Ordering::Relaxed),
            retry_attempts: self.retry_attempts.load(Ordering::Relaxed),
            retry_successes: self.retry_successes.load(Ordering::Relaxed),
            persistence_failures: self.persistence_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let metrics = ServerMetrics::new();
        metrics.record_connect();
        metrics.increment_rooms_created();
        metrics.increment_moves_accepted();
        metrics.increment_seats_stolen();

        let snap = metrics.snapshot();
        assert_eq!(snap.total_connections, 1);
        assert_eq!(snap.active_connections, 1);
        assert_eq!(snap.rooms_created, 1);
        assert_eq!(snap.moves_accepted, 1);
        assert_eq!(snap.seats_stolen, 1);

        metrics.record_disconnect();
        assert_eq!(metrics.snapshot().active_connections, 0);
    }
}

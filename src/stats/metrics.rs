//! Statistics for the server and per-client sessions

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Server-wide counters
///
/// Updated lock-free from the input pump, the acceptor and client sessions.
#[derive(Debug, Default)]
pub struct ServerStats {
    total_connections: AtomicU64,
    active_clients: AtomicU64,
    frames_published: AtomicU64,
    bytes_published: AtomicU64,
}

impl ServerStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted client connection
    pub fn record_connection(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_clients.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a client disconnect
    pub fn record_disconnect(&self) {
        self.active_clients.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record one published frame
    pub fn record_frame(&self, bytes: usize) {
        self.frames_published.fetch_add(1, Ordering::Relaxed);
        self.bytes_published.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Current number of connected clients
    pub fn active_clients(&self) -> u64 {
        self.active_clients.load(Ordering::Relaxed)
    }

    /// Consistent-enough copy of all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_clients: self.active_clients.load(Ordering::Relaxed),
            frames_published: self.frames_published.load(Ordering::Relaxed),
            bytes_published: self.bytes_published.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of [`ServerStats`]
#[derive(Debug, Clone, Default)]
pub struct StatsSnapshot {
    /// Connections accepted since startup
    pub total_connections: u64,
    /// Currently connected clients
    pub active_clients: u64,
    /// Frames published to the slot
    pub frames_published: u64,
    /// Total bytes of published frames
    pub bytes_published: u64,
}

/// Per-session counters, logged when the session closes
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// When the client connected
    pub connected_at: Instant,
    /// Multipart parts written to this client
    pub frames_sent: u64,
    /// Payload and header bytes written to this client
    pub bytes_sent: u64,
}

impl SessionStats {
    /// Start counting for a new session
    pub fn new() -> Self {
        Self {
            connected_at: Instant::now(),
            frames_sent: 0,
            bytes_sent: 0,
        }
    }

    /// Record one written frame
    pub fn on_frame(&mut self, bytes: usize) {
        self.frames_sent += 1;
        self.bytes_sent += bytes as u64;
    }

    /// Session duration so far
    pub fn duration(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

//! Live client session registry
//!
//! Tracks every spawned client session so shutdown can join them all.
//! Sessions remove their own entry on exit; whatever is left at shutdown is
//! woken through the frame slot, awaited up to a deadline, and aborted if it
//! is still stuck in a socket write.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Registry entry for one live session
#[derive(Debug)]
struct ClientHandle {
    peer_addr: SocketAddr,
    handle: JoinHandle<()>,
}

/// Thread-safe set of live client sessions
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: Mutex<HashMap<u64, ClientHandle>>,
}

impl ClientRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly spawned session
    pub async fn insert(&self, session_id: u64, peer_addr: SocketAddr, handle: JoinHandle<()>) {
        let mut clients = self.clients.lock().await;
        clients.insert(session_id, ClientHandle { peer_addr, handle });
        tracing::debug!(clients = clients.len(), "current clients");
    }

    /// Remove a session's entry (called by the session itself on exit)
    pub async fn remove(&self, session_id: u64) {
        let mut clients = self.clients.lock().await;
        if clients.remove(&session_id).is_some() {
            tracing::debug!(clients = clients.len(), "current clients");
        }
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.clients.lock().await.len()
    }

    /// Whether no sessions are live
    pub async fn is_empty(&self) -> bool {
        self.clients.lock().await.is_empty()
    }

    /// Join every remaining session, bounded by one shared deadline
    ///
    /// Sessions exit cooperatively once the frame slot is closed; one that
    /// is still blocked in a write to a stalled peer when the deadline
    /// passes is aborted so shutdown completes in bounded time.
    pub async fn join_all(&self, timeout: Duration) {
        let drained: Vec<(u64, ClientHandle)> = {
            let mut clients = self.clients.lock().await;
            clients.drain().collect()
        };

        let deadline = tokio::time::Instant::now() + timeout;
        for (session_id, client) in drained {
            let mut handle = client.handle;
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(join_error)) => {
                    tracing::warn!(
                        session_id,
                        peer = %client.peer_addr,
                        error = %join_error,
                        "client session ended abnormally"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        session_id,
                        peer = %client.peer_addr,
                        "client session still writing at shutdown deadline, aborting"
                    );
                    handle.abort();
                }
            }
        }
    }
}

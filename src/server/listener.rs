//! MJPEG server: accept loop, session spawning and lifecycle
//!
//! The server runs the input pump and the TCP acceptor concurrently; a
//! resolved shutdown future, input EOF or an input read error all end the
//! run and trigger the same teardown: stop accepting, close the frame slot
//! to wake every subscriber, then join all client sessions.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::AsyncRead;
use tokio::net::{TcpListener, TcpSocket, TcpStream};

use crate::client::{ClientRegistry, ClientSession};
use crate::error::{Error, Result};
use crate::input::{pump_frames, FrameSegmenter};
use crate::slot::FrameSlot;
use crate::stats::ServerStats;

use super::config::ServerConfig;

/// Listen backlog for the accepting socket
pub const LISTEN_BACKLOG: u32 = 5;

/// MJPEG fan-out server
pub struct MjpegServer {
    config: ServerConfig,
    listener: TcpListener,
    slot: Arc<FrameSlot>,
    registry: Arc<ClientRegistry>,
    stats: Arc<ServerStats>,
    next_session_id: AtomicU64,
}

impl MjpegServer {
    /// Bind the listening socket and create the server
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        let addr = config.bind_addr();
        let listener = listen(addr).map_err(|source| Error::Bind { addr, source })?;

        tracing::info!(addr = %addr, "listening");

        Ok(Self {
            config,
            listener,
            slot: Arc::new(FrameSlot::new()),
            registry: Arc::new(ClientRegistry::new()),
            stats: Arc::new(ServerStats::new()),
            next_session_id: AtomicU64::new(1),
        })
    }

    /// Address the server is listening on
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// The shared frame slot
    pub fn slot(&self) -> &Arc<FrameSlot> {
        &self.slot
    }

    /// The live client registry
    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Server-wide counters
    pub fn stats(&self) -> &Arc<ServerStats> {
        &self.stats
    }

    /// The server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Run until the input ends or `shutdown` resolves
    ///
    /// `input` is the JPEG byte stream (stdin in the binary); `shutdown`
    /// is typically a signal future. This method performs the full
    /// teardown before returning: the listener is closed, the slot is
    /// closed, and every session is joined (bounded by the client read
    /// timeout).
    pub async fn serve<R, F>(self, input: R, shutdown: F) -> Result<()>
    where
        R: AsyncRead + Unpin,
        F: Future<Output = ()>,
    {
        let segmenter = FrameSegmenter::new(self.config.separator_policy());

        tokio::select! {
            _ = shutdown => {
                tracing::debug!("shutdown requested");
            }
            result = pump_frames(input, segmenter, &self.slot, &self.stats) => {
                match result {
                    Ok(()) => tracing::info!("input ended, shutting down"),
                    Err(error) => tracing::error!(error = %error, "input read failed, shutting down"),
                }
            }
            _ = self.accept_loop() => {
                // accept_loop never returns
            }
        }

        self.shutdown().await
    }

    async fn accept_loop(&self) {
        loop {
            match self.listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.spawn_session(socket, peer_addr).await;
                }
                Err(error) => {
                    // Transient accept failures never stop the server.
                    tracing::error!(error = %error, "accept failed");
                }
            }
        }
    }

    async fn spawn_session(&self, socket: TcpStream, peer_addr: SocketAddr) {
        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);

        tracing::info!(
            session_id,
            peer = %peer_addr,
            "new client connection"
        );
        self.stats.record_connection();

        let session = ClientSession::new(
            session_id,
            peer_addr,
            socket,
            self.slot.subscribe(),
            Arc::clone(&self.registry),
            Arc::clone(&self.stats),
        );

        let handle = tokio::spawn(session.run());
        self.registry.insert(session_id, peer_addr, handle).await;
    }

    async fn shutdown(self) -> Result<()> {
        tracing::debug!("closing server");
        // Stop accepting before waking the sessions.
        drop(self.listener);

        self.slot.close();
        self.registry.join_all(self.config.client_read_timeout).await;

        let snapshot = self.stats.snapshot();
        tracing::info!(
            total_connections = snapshot.total_connections,
            frames_published = snapshot.frames_published,
            bytes_published = snapshot.bytes_published,
            "server stopped"
        );
        Ok(())
    }
}

/// Bind with `SO_REUSEADDR` and the fixed listen backlog
fn listen(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = TcpSocket::new_v4()?;
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(LISTEN_BACKLOG)
}

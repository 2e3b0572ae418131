//! Per-client streaming session
//!
//! Each accepted connection runs one session task through a three-phase
//! machine: greet (write the response preamble, without waiting for the
//! client's request), stream (one multipart part per frame wake-up, while
//! discarding whatever the client sends), close (deregister and log). A
//! session failing in any way affects only itself.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};

use crate::protocol::{part_header, PART_TRAILER, RESPONSE_PREAMBLE};
use crate::slot::{FrameSubscriber, JpegFrame};
use crate::stats::{ServerStats, SessionStats};

use super::registry::ClientRegistry;

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Writing the response preamble
    Greeting,
    /// Delivering one multipart part per frame
    Streaming,
    /// Tearing down: deregister, log, drop the socket
    Closing,
}

/// One connected MJPEG client
pub struct ClientSession<S> {
    session_id: u64,
    peer_addr: SocketAddr,
    reader: ReadHalf<S>,
    writer: WriteHalf<S>,
    subscriber: FrameSubscriber,
    registry: Arc<ClientRegistry>,
    server_stats: Arc<ServerStats>,
    stats: SessionStats,
    phase: SessionPhase,
}

impl<S> ClientSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Create a session for an accepted socket
    pub fn new(
        session_id: u64,
        peer_addr: SocketAddr,
        socket: S,
        subscriber: FrameSubscriber,
        registry: Arc<ClientRegistry>,
        server_stats: Arc<ServerStats>,
    ) -> Self {
        let (reader, writer) = tokio::io::split(socket);

        Self {
            session_id,
            peer_addr,
            reader,
            writer,
            subscriber,
            registry,
            server_stats,
            stats: SessionStats::new(),
            phase: SessionPhase::Greeting,
        }
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Drive the session until the client goes away or the slot closes
    pub async fn run(mut self) {
        if let Err(error) = self.drive().await {
            // Broken pipe, reset: all end just this client.
            tracing::debug!(
                session_id = self.session_id,
                peer = %self.peer_addr,
                error = %error,
                "client session error"
            );
        }
        self.close().await;
    }

    async fn drive(&mut self) -> io::Result<()> {
        // Greeting: the response starts immediately; the client's request
        // is never waited for.
        self.writer.write_all(RESPONSE_PREAMBLE.as_bytes()).await?;
        self.writer.flush().await?;

        self.phase = SessionPhase::Streaming;
        tracing::debug!(
            session_id = self.session_id,
            peer = %self.peer_addr,
            "client streaming"
        );
        self.stream().await
    }

    /// Streaming phase: one part per frame, latest-only
    ///
    /// Inbound bytes (the client's HTTP request included) are read and
    /// discarded alongside the frame writes; end of stream on the read
    /// half means the client went away. Returns `Ok` when the slot closes
    /// (global shutdown or input EOF) or the peer disconnects, and `Err`
    /// on the first failed write.
    async fn stream(&mut self) -> io::Result<()> {
        let mut discard = [0u8; 1024];

        loop {
            tokio::select! {
                next = self.subscriber.next_frame() => match next {
                    Some((frame, epoch)) => {
                        // The frame is a cheap reference-counted clone out
                        // of the slot; the socket write holds no slot state.
                        self.write_part(&frame).await?;
                        tracing::trace!(
                            session_id = self.session_id,
                            epoch,
                            bytes = frame.len(),
                            "frame sent"
                        );
                    }
                    None => return Ok(()),
                },
                read = self.reader.read(&mut discard) => match read {
                    Ok(0) => {
                        tracing::debug!(
                            session_id = self.session_id,
                            peer = %self.peer_addr,
                            "client closed connection"
                        );
                        return Ok(());
                    }
                    Ok(_) => {}
                    Err(error) => return Err(error),
                },
            }
        }
    }

    async fn write_part(&mut self, frame: &JpegFrame) -> io::Result<()> {
        let header = part_header(frame.len());

        self.writer.write_all(header.as_bytes()).await?;
        self.writer.write_all(frame.as_ref()).await?;
        self.writer.write_all(PART_TRAILER).await?;
        self.writer.flush().await?;

        self.stats
            .on_frame(header.len() + frame.len() + PART_TRAILER.len());
        Ok(())
    }

    /// Closing phase: deregister and log the session's totals
    async fn close(mut self) {
        self.phase = SessionPhase::Closing;
        self.registry.remove(self.session_id).await;
        self.server_stats.record_disconnect();

        tracing::info!(
            session_id = self.session_id,
            peer = %self.peer_addr,
            frames = self.stats.frames_sent,
            bytes = self.stats.bytes_sent,
            duration_ms = self.stats.duration().as_millis() as u64,
            "client connection closed"
        );
    }
}

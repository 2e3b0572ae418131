//! MJPEG fan-out streaming server
//!
//! Reads a concatenated stream of JPEG frames (typically a camera capture
//! pipeline piped to stdin) and serves every connected HTTP client a live
//! `multipart/x-mixed-replace` stream of those frames.
//!
//! # Architecture
//!
//! ```text
//!   stdin ──► input::FrameSegmenter ──► slot::FrameSlot (latest frame)
//!                                            │
//!                     ┌──────────────────────┼─────────────────────┐
//!                     ▼                      ▼                     ▼
//!               ClientSession          ClientSession         ClientSession
//!               (tokio task)           (tokio task)          (tokio task)
//!                     │                      │                     │
//!                     ▼                      ▼                     ▼
//!                TCP client             TCP client            TCP client
//! ```
//!
//! One producer, N consumers, latest-only: the slot holds a single frame,
//! a publish wakes every subscriber, and a client that is still writing
//! when new frames arrive skips straight to the newest one. Slow or dead
//! clients never block the producer or each other.
//!
//! # Example
//!
//! ```no_run
//! use streameye::{MjpegServer, ServerConfig};
//!
//! # async fn example() -> streameye::Result<()> {
//! let config = ServerConfig::default().port(8080);
//! let server = MjpegServer::bind(config).await?;
//! server
//!     .serve(tokio::io::stdin(), std::future::pending())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod input;
pub mod protocol;
pub mod server;
pub mod slot;
pub mod stats;

pub use error::{Error, Result};
pub use server::{MjpegServer, ServerConfig};
pub use slot::{FrameSlot, FrameSubscriber, JpegFrame};

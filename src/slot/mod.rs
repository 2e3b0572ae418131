//! Shared frame slot: single-producer / multi-consumer latest-frame fan-out
//!
//! The input pump publishes each segmented JPEG frame into one shared slot;
//! every client session subscribes to that slot and writes whatever frame is
//! current when it wakes up.
//!
//! # Architecture
//!
//! ```text
//!        stdin ──► FrameSegmenter ──► FrameSlot::publish
//!                                          │
//!                   ┌──────────────────────┼──────────────────────┐
//!                   ▼                      ▼                      ▼
//!             [Subscriber]           [Subscriber]           [Subscriber]
//!             next_frame()           next_frame()           next_frame()
//!                   │                      │                      │
//!                   └──► multipart part ──► TCP socket (per client)
//! ```
//!
//! # Latest-only discipline
//!
//! The slot holds exactly one frame. A publish replaces it and wakes all
//! waiters; a subscriber that was mid-write misses the intermediate frames
//! and resumes at the latest epoch. A slow client therefore drops frames
//! silently and can never stall the producer.
//!
//! # Zero-copy
//!
//! Frames carry `bytes::Bytes`, so subscribing and cloning a frame out of
//! the slot only bumps a reference count; all sessions write from the same
//! allocation.

pub mod frame;
pub mod latest;

pub use frame::{JpegFrame, JPEG_EOI, JPEG_SOI};
pub use latest::{FrameSlot, FrameSubscriber};

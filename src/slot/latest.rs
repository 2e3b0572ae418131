//! Latest-frame rendezvous between the producer and client sessions
//!
//! A single-slot broadcast: `publish` replaces the slot's contents and wakes
//! every waiting subscriber; a subscriber that was busy writing the previous
//! frame resumes at the latest one, silently skipping whatever was published
//! in between. There is no queue anywhere.

use tokio::sync::watch;

use super::frame::JpegFrame;

/// Slot contents observed by subscribers
#[derive(Debug, Clone)]
struct SlotState {
    /// Publication counter; 0 means nothing has been published yet
    epoch: u64,
    /// Latest published frame
    frame: Option<JpegFrame>,
    /// Set once at shutdown; subscribers drain a pending frame, then stop
    closed: bool,
}

/// Single-slot latest-frame broadcast
///
/// The producer publishes by value replacement (an atomic swap inside the
/// `watch` channel); it never waits for subscribers.
#[derive(Debug)]
pub struct FrameSlot {
    tx: watch::Sender<SlotState>,
}

impl FrameSlot {
    /// Create an empty slot (epoch 0)
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SlotState {
            epoch: 0,
            frame: None,
            closed: false,
        });
        Self { tx }
    }

    /// Replace the slot's contents and wake all subscribers
    ///
    /// Returns the epoch assigned to this publication (>= 1).
    pub fn publish(&self, frame: JpegFrame) -> u64 {
        let mut epoch = 0;
        self.tx.send_modify(|state| {
            state.epoch += 1;
            state.frame = Some(frame);
            epoch = state.epoch;
        });
        epoch
    }

    /// Current epoch (0 if nothing has been published)
    pub fn epoch(&self) -> u64 {
        self.tx.borrow().epoch
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Close the slot, waking all subscribers
    ///
    /// Subscribers with an unseen frame still receive it; after that every
    /// `next_frame` call returns `None`.
    pub fn close(&self) {
        self.tx.send_modify(|state| {
            state.closed = true;
        });
    }

    /// Whether the slot has been closed
    pub fn is_closed(&self) -> bool {
        self.tx.borrow().closed
    }

    /// Create a subscriber starting at the current epoch
    ///
    /// The subscriber waits for the next publication; it does not observe a
    /// frame already in the slot.
    pub fn subscribe(&self) -> FrameSubscriber {
        let rx = self.tx.subscribe();
        let last_seen = rx.borrow().epoch;
        FrameSubscriber { rx, last_seen }
    }
}

impl Default for FrameSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// A client session's handle onto the frame slot
#[derive(Debug)]
pub struct FrameSubscriber {
    rx: watch::Receiver<SlotState>,
    last_seen: u64,
}

impl FrameSubscriber {
    /// Epoch of the last frame this subscriber observed
    pub fn last_seen(&self) -> u64 {
        self.last_seen
    }

    /// Wait for the next frame
    ///
    /// Blocks until the slot's epoch is strictly greater than the last one
    /// this subscriber observed, then returns the latest frame and its
    /// epoch. Frames published while this subscriber was busy are skipped.
    /// Returns `None` once the slot is closed and drained.
    pub async fn next_frame(&mut self) -> Option<(JpegFrame, u64)> {
        loop {
            {
                let state = self.rx.borrow_and_update();
                if state.epoch > self.last_seen {
                    if let Some(ref frame) = state.frame {
                        self.last_seen = state.epoch;
                        return Some((frame.clone(), state.epoch));
                    }
                }
                if state.closed {
                    return None;
                }
            }

            if self.rx.changed().await.is_err() {
                // Slot dropped entirely
                return None;
            }
        }
    }
}

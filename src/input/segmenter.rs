//! Frame segmenter
//!
//! Carves the raw input byte stream into discrete JPEG frames. Only the
//! separator pattern is searched for; the JPEG payload itself is never
//! interpreted.

use bytes::Bytes;

use crate::slot::JpegFrame;

use super::separator::Separator;

/// Size of one input read
pub const INPUT_BUF_LEN: usize = 64 * 1024;

/// Maximum accumulated frame size; larger input discards the accumulator
pub const JPEG_BUF_LEN: usize = 4 * 1024 * 1024;

/// Incremental splitter from raw chunks to complete JPEG frames
///
/// Feed it input chunks with [`push_chunk`](Self::push_chunk); call
/// [`finish`](Self::finish) once at end of stream to flush a trailing
/// complete frame (auto mode only).
#[derive(Debug)]
pub struct FrameSegmenter {
    separator: Separator,
    buf: Vec<u8>,
    discarded: u64,
}

impl FrameSegmenter {
    /// Create a segmenter for the given separator policy
    pub fn new(separator: Separator) -> Self {
        Self {
            separator,
            buf: Vec::with_capacity(JPEG_BUF_LEN),
            discarded: 0,
        }
    }

    /// Bytes currently buffered waiting for a separator
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Number of times the accumulator was discarded due to oversized input
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Append one input chunk and emit every frame it completes
    ///
    /// A chunk that would push the accumulator past `JPEG_BUF_LEN - 1`
    /// discards the whole accumulator (including the chunk); accumulation
    /// resumes with the next read.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<JpegFrame> {
        if chunk.len() > JPEG_BUF_LEN - 1 - self.buf.len() {
            tracing::error!(
                buffered = self.buf.len(),
                chunk = chunk.len(),
                "input: jpeg size too large, discarding buffer"
            );
            self.buf.clear();
            self.discarded += 1;
            return Vec::new();
        }

        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(at) = self.find_separator() {
            // Auto mode keeps the EOI with the emitted frame and the SOI
            // with the remainder; an explicit separator is stripped.
            let (frame_end, rest_start) = if self.separator.is_auto() {
                (at + 2, at + 2)
            } else {
                (at, at + self.separator.len())
            };

            frames.push(JpegFrame::new(Bytes::copy_from_slice(&self.buf[..frame_end])));
            self.buf.drain(..rest_start);
        }

        frames
    }

    /// Flush at end of stream
    ///
    /// In auto mode a buffered remainder that forms a complete SOI..EOI
    /// frame is emitted (the stream ended instead of a next SOI arriving).
    /// Anything else is discarded.
    pub fn finish(&mut self) -> Option<JpegFrame> {
        if self.buf.is_empty() {
            return None;
        }

        if self.separator.is_auto() {
            let frame = JpegFrame::new(Bytes::copy_from_slice(&self.buf));
            if frame.is_complete() {
                self.buf.clear();
                return Some(frame);
            }
        }

        tracing::debug!(
            bytes = self.buf.len(),
            "input: discarding trailing bytes at end of stream"
        );
        self.buf.clear();
        None
    }

    /// Search the trailing window of the accumulator for the separator
    ///
    /// The window is `min(2 * INPUT_BUF_LEN, accumulated)` bytes: a
    /// separator whose final byte was just appended cannot start earlier
    /// than one chunk before the tail.
    fn find_separator(&self) -> Option<usize> {
        let window = (2 * INPUT_BUF_LEN).min(self.buf.len());
        let start = self.buf.len() - window;
        find_pattern(&self.buf[start..], self.separator.pattern()).map(|pos| start + pos)
    }
}

/// First occurrence of `pattern` in `haystack`
fn find_pattern(haystack: &[u8], pattern: &[u8]) -> Option<usize> {
    if pattern.is_empty() || haystack.len() < pattern.len() {
        return None;
    }
    haystack.windows(pattern.len()).position(|w| w == pattern)
}

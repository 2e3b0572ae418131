//! JPEG frame type shared between the producer and client sessions

use bytes::Bytes;

/// JPEG start-of-image marker
pub const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

/// JPEG end-of-image marker
pub const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

/// A complete JPEG frame as carved out of the input stream
///
/// Cheap to clone: the data is reference-counted via `Bytes`, so every
/// client session shares the same allocation while writing it out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegFrame {
    /// Frame bytes (zero-copy via reference counting)
    pub data: Bytes,
}

impl JpegFrame {
    /// Create a frame from owned bytes
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    /// Frame size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the frame is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the frame starts with the JPEG start-of-image marker
    pub fn starts_with_soi(&self) -> bool {
        self.data.starts_with(&JPEG_SOI)
    }

    /// Whether the frame ends with the JPEG end-of-image marker
    pub fn ends_with_eoi(&self) -> bool {
        self.data.ends_with(&JPEG_EOI)
    }

    /// Whether the frame is a complete SOI..EOI image
    ///
    /// Only the two boundary markers are inspected; the frame body is
    /// never interpreted.
    pub fn is_complete(&self) -> bool {
        self.data.len() >= 4 && self.starts_with_soi() && self.ends_with_eoi()
    }
}

impl AsRef<[u8]> for JpegFrame {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

//! Input side: reading stdin and carving it into JPEG frames
//!
//! The byte stream is split on a separator only; JPEG content is never
//! decoded. In auto mode the separator is the end-of-image marker directly
//! followed by the next start-of-image marker, so well-formed concatenated
//! JPEG needs no framing from the producer.

pub mod reader;
pub mod segmenter;
pub mod separator;

pub use reader::pump_frames;
pub use segmenter::{FrameSegmenter, INPUT_BUF_LEN, JPEG_BUF_LEN};
pub use separator::{Separator, AUTO_SEPARATOR};

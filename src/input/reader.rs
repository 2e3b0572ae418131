//! Input pump: stdin chunks in, published frames out
//!
//! The pump is generic over `AsyncRead` so tests can drive it with an
//! in-memory stream; the binary passes `tokio::io::stdin()`.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::Result;
use crate::slot::{FrameSlot, JpegFrame};
use crate::stats::ServerStats;

use super::segmenter::{FrameSegmenter, INPUT_BUF_LEN};

/// Read the input to exhaustion, publishing every segmented frame
///
/// Returns `Ok(())` on end of stream (which triggers graceful shutdown in
/// the caller) and an error on a failed read. A trailing complete frame is
/// flushed before returning.
pub async fn pump_frames<R>(
    mut input: R,
    mut segmenter: FrameSegmenter,
    slot: &FrameSlot,
    stats: &ServerStats,
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; INPUT_BUF_LEN];

    loop {
        let n = input.read(&mut chunk).await?;
        if n == 0 {
            tracing::debug!("input: end of stream");
            break;
        }

        for frame in segmenter.push_chunk(&chunk[..n]) {
            publish(frame, slot, stats);
        }
    }

    if let Some(frame) = segmenter.finish() {
        publish(frame, slot, stats);
    }

    Ok(())
}

fn publish(frame: JpegFrame, slot: &FrameSlot, stats: &ServerStats) {
    let bytes = frame.len();
    let epoch = slot.publish(frame);
    stats.record_frame(bytes);
    tracing::debug!(epoch, bytes, "input: jpeg buffer ready");
}

//! HTTP response formatting for the MJPEG stream
//!
//! The server speaks just enough HTTP/1.0 to start a
//! `multipart/x-mixed-replace` response and then keeps appending parts, one
//! per frame, until the connection closes. No trailing boundary is emitted.

/// Multipart boundary token
pub const BOUNDARY: &str = "jpgboundary";

/// Response preamble written once after accept, before the first part
pub const RESPONSE_PREAMBLE: &str = "HTTP/1.0 200 OK\r\n\
Server: streamEye\r\n\
Connection: close\r\n\
Max-Age: 0\r\n\
Expires: 0\r\n\
Cache-Control: no-cache, private\r\n\
Pragma: no-cache\r\n\
Content-Type: multipart/x-mixed-replace; boundary=jpgboundary\r\n\
\r\n";

/// Terminator written after each frame's payload
pub const PART_TRAILER: &[u8] = b"\r\n";

/// Header block for one multipart part carrying `content_length` JPEG bytes
pub fn part_header(content_length: usize) -> String {
    format!(
        "--{BOUNDARY}\r\n\
Content-Type: image/jpeg\r\n\
Content-Length: {content_length}\r\n\
\r\n"
    )
}

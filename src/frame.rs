//! Frame: one encoded video frame on its way to viewers.
//!
//! DESIGN
//! ======
//! The render loop produces a `Frame`, the broadcaster stamps its sequence
//! number and publishes it, and the stream route wraps it in a multipart
//! part. The JPEG bytes are stored once and shared behind an `Arc` by every
//! subscriber, so fan-out never copies pixel data.

use std::time::{SystemTime, UNIX_EPOCH};

// =============================================================================
// WIRE CONSTANTS
// =============================================================================

/// Boundary token separating multipart stream parts.
pub const MULTIPART_BOUNDARY: &str = "frame";

/// Content type of the `/stream` response.
pub const MULTIPART_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

// =============================================================================
// FRAME
// =============================================================================

/// One rendered, JPEG-encoded frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Monotone sequence number, assigned by the broadcaster on publish.
    pub seq: u64,
    /// Render timestamp, milliseconds since Unix epoch.
    pub ts: i64,
    pub width: u32,
    pub height: u32,
    pub jpeg: Vec<u8>,
}

impl Frame {
    /// Create an unpublished frame. `seq` stays 0 until publish.
    #[must_use]
    pub fn new(width: u32, height: u32, jpeg: Vec<u8>) -> Self {
        Self { seq: 0, ts: now_ms(), width, height, jpeg }
    }

    /// Serialize as one multipart part:
    /// `--frame\r\nContent-Type: image/jpeg\r\n\r\n<jpeg>\r\n`.
    #[must_use]
    pub fn multipart_part(&self) -> Vec<u8> {
        let header = format!("--{MULTIPART_BOUNDARY}\r\nContent-Type: image/jpeg\r\n\r\n");
        let mut part = Vec::with_capacity(header.len() + self.jpeg.len() + 2);
        part.extend_from_slice(header.as_bytes());
        part.extend_from_slice(&self.jpeg);
        part.extend_from_slice(b"\r\n");
        part
    }
}

// =============================================================================
// TIME
// =============================================================================

/// Current time as milliseconds since Unix epoch.
pub(crate) fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

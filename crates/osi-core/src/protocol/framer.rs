//! Newline-delimited frame extraction from an arbitrary byte stream.
//!
//! The channel delivers bytes in chunks whose boundaries have nothing to do
//! with message boundaries. A single read may contain zero, one, or many
//! complete frames, and a frame may be split across any number of reads.
//! [`LineFramer`] buffers the incomplete tail between calls and yields each
//! complete frame exactly once, in arrival order, with the `\n` delimiter (and
//! an optional preceding `\r`) stripped.
//!
//! Faults are per frame: a frame that is not valid UTF-8, or that exceeds the
//! configured size limit, is reported as a [`FrameError`] in its slot of the
//! output and the framer carries on with the next frame.

use thiserror::Error;

/// Default upper bound for a single frame, in bytes.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Per-frame faults. The connection survives all of them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The frame bytes are not valid UTF-8.
    #[error("Request is not valid UTF-8 text")]
    InvalidUtf8,

    /// The frame grew past the size limit before its delimiter arrived.
    #[error("Request exceeds the maximum size of {limit} bytes")]
    Oversized { limit: usize },
}

/// Result of extracting one frame.
pub type Frame = Result<String, FrameError>;

/// Incremental newline framer.
#[derive(Debug)]
pub struct LineFramer {
    pending: Vec<u8>,
    max_frame_bytes: usize,
    /// Set after an oversize fault until the next delimiter is seen, so the
    /// rest of the offending frame is dropped instead of parsed.
    discarding: bool,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}

impl LineFramer {
    /// Creates a framer that rejects frames longer than `max_frame_bytes`.
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            pending: Vec::new(),
            max_frame_bytes: max_frame_bytes.max(1),
            discarding: false,
        }
    }

    /// Number of buffered bytes belonging to a not-yet-terminated frame.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Feeds one chunk and returns every frame it completes.
    ///
    /// Blank frames (empty or whitespace only) are skipped without producing
    /// an entry.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();
        let mut rest = chunk;

        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            let (segment, tail) = rest.split_at(pos);
            rest = &tail[1..];

            if self.discarding {
                self.discarding = false;
                continue;
            }

            self.pending.extend_from_slice(segment);
            let mut bytes = std::mem::take(&mut self.pending);
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }

            if bytes.len() > self.max_frame_bytes {
                frames.push(Err(FrameError::Oversized {
                    limit: self.max_frame_bytes,
                }));
                continue;
            }

            match String::from_utf8(bytes) {
                Ok(text) if text.trim().is_empty() => {}
                Ok(text) => frames.push(Ok(text)),
                Err(_) => frames.push(Err(FrameError::InvalidUtf8)),
            }
        }

        if !self.discarding {
            self.pending.extend_from_slice(rest);
            // Allow one extra byte for a trailing '\r' that may precede the
            // delimiter in the next chunk.
            if self.pending.len() > self.max_frame_bytes + 1 {
                self.pending.clear();
                self.discarding = true;
                frames.push(Err(FrameError::Oversized {
                    limit: self.max_frame_bytes,
                }));
            }
        }

        frames
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Reassembly of fragmented inbound messages.
//!
//! Bytes accumulate here until the final fragment arrives; only then is the
//! message decoded as UTF-8 and handed to the frame parser.
//!
//! tungstenite already joins continuation frames, so the event loop pushes
//! each delivered message with `fin` set. There the buffer only enforces the
//! size limit and UTF-8 validity; the `fin = false` path serves callers that
//! feed raw fragments.

// ============================================================================
// Imports
// ============================================================================

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Upper bound for a single reassembled message (16 MiB).
const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

// ============================================================================
// MessageBuffer
// ============================================================================

/// Growing buffer for one in-flight message.
#[derive(Debug, Default)]
pub struct MessageBuffer {
    bytes: Vec<u8>,
}

impl MessageBuffer {
    /// Creates an empty buffer.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fragment.
    ///
    /// Returns the complete message text once `fin` is set, `Ok(None)` while
    /// more fragments are expected. The buffer is always reset after a
    /// complete (or rejected) message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unparseable`] if the message exceeds the size limit
    /// or is not valid UTF-8.
    pub fn push(&mut self, fragment: &[u8], fin: bool) -> Result<Option<String>> {
        if self.bytes.len() + fragment.len() > MAX_MESSAGE_SIZE {
            self.bytes.clear();
            return Err(Error::unparseable(format!(
                "message exceeds {MAX_MESSAGE_SIZE} bytes"
            )));
        }

        self.bytes.extend_from_slice(fragment);

        if !fin {
            return Ok(None);
        }

        let bytes = std::mem::take(&mut self.bytes);
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| Error::unparseable(format!("message is not UTF-8: {e}")))
    }

    /// Returns the number of buffered bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if no fragment is pending.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Drops any partial message.
    #[inline]
    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================

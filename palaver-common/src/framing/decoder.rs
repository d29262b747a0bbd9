//! Incremental, boundary-insensitive message decoder

use serde_json::Value;

use super::{FrameError, MAX_BUFFERED_BYTES};
use crate::protocol::Message;

/// Decodes complete messages out of an accumulating byte buffer
///
/// Bytes are appended with [`push`](Self::push) as they arrive from the
/// socket; [`try_next`](Self::try_next) strips leading whitespace, attempts
/// to decode exactly one JSON value at the start of the buffer, and drains
/// the consumed bytes on success. An incomplete value leaves the buffer
/// untouched and is retried after the next `push`, so the decoded sequence
/// is independent of how the stream was split into reads.
///
/// A complete value that is not a recognized message (unknown `type` tag,
/// missing fields) is skipped and decoding continues with the next value.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Append bytes from a socket read
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Number of bytes currently buffered
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Decode the next complete message, if one is buffered
    ///
    /// Returns `Ok(None)` when the buffer is empty or holds only the prefix
    /// of a value; call again after the next [`push`](Self::push).
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Malformed`] when the buffer holds bytes that can
    /// never begin a valid JSON value, and [`FrameError::BufferTooLarge`]
    /// when an unfinished value exceeds [`MAX_BUFFERED_BYTES`]. Both leave
    /// the stream unrecoverable; the caller is expected to drop the
    /// connection.
    pub fn try_next(&mut self) -> Result<Option<Message>, FrameError> {
        loop {
            let whitespace = self
                .buf
                .iter()
                .take_while(|b| b.is_ascii_whitespace())
                .count();
            if whitespace > 0 {
                self.buf.drain(..whitespace);
            }
            if self.buf.is_empty() {
                return Ok(None);
            }

            let mut stream =
                serde_json::Deserializer::from_slice(&self.buf).into_iter::<Value>();
            match stream.next() {
                Some(Ok(value)) => {
                    let consumed = stream.byte_offset();
                    self.buf.drain(..consumed);
                    match serde_json::from_value::<Message>(value) {
                        Ok(message) => return Ok(Some(message)),
                        // Unrecognized message kinds are ignored without error
                        Err(_) => continue,
                    }
                }
                Some(Err(e)) if e.is_eof() => {
                    if self.buf.len() > MAX_BUFFERED_BYTES {
                        return Err(FrameError::BufferTooLarge {
                            buffered: self.buf.len(),
                            max: MAX_BUFFERED_BYTES,
                        });
                    }
                    return Ok(None);
                }
                Some(Err(e)) => return Err(FrameError::Malformed(e.to_string())),
                None => return Ok(None),
            }
        }
    }
}

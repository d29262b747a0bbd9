//! Message reader for parsing the protocol stream

use tokio::io::AsyncReadExt;

use super::{FrameDecoder, FrameError, READ_BUFFER_SIZE};
use crate::protocol::Message;

/// Reads protocol messages from an async byte stream
///
/// Wraps a [`FrameDecoder`] around the stream: each call drains the next
/// complete message from the decoder, reading more bytes from the stream
/// whenever the buffer holds only a partial value.
pub struct MessageReader<R> {
    reader: R,
    decoder: FrameDecoder,
}

impl<R> MessageReader<R> {
    /// Create a new message reader
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            decoder: FrameDecoder::new(),
        }
    }

    /// Get a reference to the underlying reader
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Get a mutable reference to the underlying reader
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Consume the message reader and return the underlying reader
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: AsyncReadExt + Unpin> MessageReader<R> {
    /// Read the next message from the stream
    ///
    /// Returns `Ok(None)` if the connection is cleanly closed. Bytes left in
    /// the buffer at EOF belong to an unfinished value and die with the
    /// connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is malformed beyond recovery or an I/O
    /// error occurs.
    ///
    /// # Note
    ///
    /// This method has no timeout; it waits indefinitely for data.
    pub async fn read_message(&mut self) -> Result<Option<Message>, FrameError> {
        loop {
            if let Some(message) = self.decoder.try_next()? {
                return Ok(Some(message));
            }

            let mut chunk = [0u8; READ_BUFFER_SIZE];
            let n = self.reader.read(&mut chunk).await?;
            if n == 0 {
                return Ok(None);
            }
            self.decoder.push(&chunk[..n]);
        }
    }
}

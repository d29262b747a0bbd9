//! Framing error type

use std::fmt;
use std::io;

/// Errors produced while decoding the byte stream
///
/// Incomplete input is not an error: the decoder simply waits for more bytes.
/// These variants all indicate a stream that can never make progress, and the
/// connection handler responds by resetting the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The buffer holds bytes that can never begin a valid JSON value
    Malformed(String),
    /// The accumulation buffer grew past the limit without completing a value
    BufferTooLarge { buffered: usize, max: usize },
    /// I/O error from the underlying stream
    Io(String),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Malformed(detail) => write!(f, "malformed message: {}", detail),
            FrameError::BufferTooLarge { buffered, max } => write!(
                f,
                "frame buffer too large: {} bytes buffered, max {}",
                buffered, max
            ),
            FrameError::Io(detail) => write!(f, "I/O error: {}", detail),
        }
    }
}

impl std::error::Error for FrameError {}

impl From<io::Error> for FrameError {
    fn from(err: io::Error) -> Self {
        FrameError::Io(err.to_string())
    }
}

impl From<FrameError> for io::Error {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Io(detail) => io::Error::other(detail),
            FrameError::Malformed(_) | FrameError::BufferTooLarge { .. } => {
                io::Error::new(io::ErrorKind::InvalidData, err.to_string())
            }
        }
    }
}

//! Incremental framing over a raw JSON byte stream
//!
//! The wire carries JSON values back-to-back with no separator, so a single
//! socket read may contain half a message, several messages, or the tail of
//! one and the head of the next. [`FrameDecoder`] accumulates bytes and
//! yields complete [`Message`](crate::protocol::Message) values regardless of
//! how the stream was split. [`MessageReader`] and [`MessageWriter`] wrap
//! async streams on top of it.

mod decoder;
mod error;
mod reader;
mod writer;

pub use decoder::FrameDecoder;
pub use error::FrameError;
pub use reader::MessageReader;
pub use writer::MessageWriter;

/// Buffer size for socket reads
pub const READ_BUFFER_SIZE: usize = 4096;

/// Maximum bytes the decoder will accumulate while waiting for one value to
/// complete (8 MiB, comfortably above one base64-encoded 512 KiB file chunk)
///
/// Exceeding this is treated as a protocol violation and resets the
/// connection rather than growing without bound.
pub const MAX_BUFFERED_BYTES: usize = 8 * 1024 * 1024;

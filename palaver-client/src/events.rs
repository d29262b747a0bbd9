//! Events surfaced to the presentation layer

use std::path::PathBuf;

/// One event from the connection's read loop
///
/// The presentation layer consumes these from the receiver returned by
/// [`Connection::connect`](crate::Connection::connect); the read loop never
/// blocks on a slow consumer (the channel is unbounded).
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Presence snapshot, received once at connect time
    UserList(Vec<String>),
    /// Another user logged in
    UserOnline(String),
    /// Another user logged out or disconnected
    UserOffline(String),
    /// Chat text
    Text { from_id: String, content: String },
    /// Inline image, base64-encoded
    Image { from_id: String, content: String },
    /// This client was added to a room
    RoomInvite { room: String, from_id: String },
    /// An incoming file transfer opened
    TransferStarted { filename: String },
    /// An incoming file transfer completed
    TransferFinished { filename: String, path: PathBuf },
    /// The connection closed; no further events will arrive
    Disconnected,
}

//! Protocol definitions for the Palaver relay
//!
//! All messages are flat JSON objects sent back-to-back over a single
//! persistent connection. There is no length prefix and no delimiter between
//! values; message boundaries are implicit in the JSON value itself, so the
//! framing layer must decode incrementally (see [`crate::framing`]).
//!
//! The wire shape is one object per message with a `type` tag and a small,
//! overlapping set of fields: `from_id`, `to_id`, `content`, `private`, and
//! (for file transfers) `filename`/`filesize`. Senders that omit `private`
//! mean a private message, so the field defaults to `true`.

use serde::{Deserialize, Serialize};

/// Backward-compatible default for senders that omit `private`
fn default_private() -> bool {
    true
}

/// One relay message
///
/// `text`, `image`, and the three `file_*` kinds are *routed*: `private: true`
/// targets the single session named by `to_id`, `private: false` fans out to
/// the room named by `to_id` (excluding the sender). The remaining kinds are
/// presence and room-membership control traffic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// Declare this connection's identity and announce presence
    Login { from_id: String },
    /// Announce departure; the session itself is only removed when the
    /// connection closes
    Logout { from_id: String },
    /// Plain chat text
    Text {
        from_id: String,
        to_id: String,
        content: String,
        #[serde(default = "default_private")]
        private: bool,
    },
    /// Inline image, base64-encoded in `content`
    Image {
        from_id: String,
        to_id: String,
        content: String,
        #[serde(default = "default_private")]
        private: bool,
    },
    /// Opens a transfer: announces filename and total size
    FileHeader {
        from_id: String,
        to_id: String,
        filename: String,
        filesize: u64,
        #[serde(default = "default_private")]
        private: bool,
    },
    /// One 512 KiB block of a transfer, base64-encoded in `content`
    FileChunk {
        from_id: String,
        to_id: String,
        filename: String,
        content: String,
        #[serde(default = "default_private")]
        private: bool,
    },
    /// Closes a transfer
    FileFinish {
        from_id: String,
        to_id: String,
        filename: String,
        #[serde(default = "default_private")]
        private: bool,
    },
    /// Snapshot of currently-known identities, sent by the server once per
    /// connection at accept time; `from_id` carries the identity list
    UserList {
        from_id: Vec<String>,
        #[serde(default)]
        to_id: String,
    },
    /// Create a room named by `content`; `to_id` lists the invitees
    CreateRoom {
        from_id: String,
        to_id: Vec<String>,
        content: String,
    },
    /// Server notification to an invitee that it is now a member of the room
    /// named by `content`; `from_id` is the room's creator
    JoinRoom { from_id: String, content: String },
}

/// Routing fields shared by the relayed message kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Routing<'a> {
    pub from_id: &'a str,
    pub to_id: &'a str,
    pub private: bool,
}

impl Message {
    /// The wire `type` tag for this message
    pub fn message_type(&self) -> &'static str {
        match self {
            Message::Login { .. } => "login",
            Message::Logout { .. } => "logout",
            Message::Text { .. } => "text",
            Message::Image { .. } => "image",
            Message::FileHeader { .. } => "file_header",
            Message::FileChunk { .. } => "file_chunk",
            Message::FileFinish { .. } => "file_finish",
            Message::UserList { .. } => "user_list",
            Message::CreateRoom { .. } => "create_room",
            Message::JoinRoom { .. } => "join_room",
        }
    }

    /// Routing fields, for the five kinds the server relays verbatim
    ///
    /// Returns `None` for presence and room-control messages, which are not
    /// routed by recipient.
    pub fn routing(&self) -> Option<Routing<'_>> {
        match self {
            Message::Text {
                from_id,
                to_id,
                private,
                ..
            }
            | Message::Image {
                from_id,
                to_id,
                private,
                ..
            }
            | Message::FileHeader {
                from_id,
                to_id,
                private,
                ..
            }
            | Message::FileChunk {
                from_id,
                to_id,
                private,
                ..
            }
            | Message::FileFinish {
                from_id,
                to_id,
                private,
                ..
            } => Some(Routing {
                from_id,
                to_id,
                private: *private,
            }),
            _ => None,
        }
    }
}

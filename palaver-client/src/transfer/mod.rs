//! File-transfer pipeline
//!
//! Transfers ride the ordinary message stream as three specialized kinds:
//! a `file_header` announcing filename and total size, one base64-encoded
//! `file_chunk` per 512 KiB block of the source, and a closing
//! `file_finish`. There is no checksum, size verification, retry, or
//! acknowledgment anywhere in the protocol; a failed transfer is observed
//! only as one that never finishes.
//!
//! Transfer state is keyed by filename alone, so two concurrent transfers
//! of the same filename to the same receiver corrupt each other. This is a
//! known limitation of the protocol, kept as-is.

mod receive;
mod send;

pub use receive::FileReceiver;
pub use send::{SharedWriter, send_file};

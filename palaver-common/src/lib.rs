//! Palaver Common Library
//!
//! Shared protocol types and framing for the Palaver relay system.

pub mod framing;
pub mod protocol;

/// Default TCP port for relay connections
pub const DEFAULT_PORT: u16 = 8888;

/// Default port as a string for form fields and display.
///
/// This is the string representation of [`DEFAULT_PORT`], provided as a constant
/// because Rust doesn't support const string formatting.
pub const DEFAULT_PORT_STR: &str = "8888";

/// Fixed block size for file-transfer chunking (512 KiB)
///
/// Both sides of a transfer rely on this: the sender reads the source file in
/// blocks of this size, and every `file_chunk` except the last carries exactly
/// this many bytes of decoded payload.
pub const FILE_CHUNK_SIZE: usize = 512 * 1024;

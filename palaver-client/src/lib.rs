//! Palaver Client Library
//!
//! The client-side protocol core: connection management, the event stream a
//! presentation layer consumes, and the file-transfer pipeline. Contains no
//! presentation code; windows, avatars, and message rendering live in the
//! embedding application.

pub mod connection;
pub mod events;
pub mod transfer;

pub use connection::Connection;
pub use events::Event;

use std::path::PathBuf;

/// Default directory for received files: `<platform downloads>/palaver`
pub fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("palaver")
}

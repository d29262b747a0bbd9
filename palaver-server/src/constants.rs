//! Shared string constants for server messages and logging

/// Startup banner prefix (version is appended)
pub const MSG_BANNER: &str = "Palaver relay server v";

/// Listening announcement prefix (address is appended)
pub const MSG_LISTENING: &str = "Listening on ";

/// Printed when the shutdown signal is received
pub const MSG_SHUTDOWN_RECEIVED: &str = "Shutdown signal received, stopping";

/// Bind failure prefix
pub const ERR_BIND: &str = "Failed to bind ";

/// Accept failure prefix
pub const ERR_ACCEPT: &str = "Failed to accept connection: ";

/// Frame decode failure prefix (peer address is appended)
pub const ERR_PARSE_MESSAGE: &str = "Failed to parse message from ";

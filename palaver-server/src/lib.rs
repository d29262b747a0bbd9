//! Palaver Relay Server Library
//!
//! This library exposes the server's internal modules for integration testing.

pub mod connection;
pub mod constants;
pub mod rooms;
pub mod router;
pub mod sessions;

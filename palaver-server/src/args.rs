//! Command-line argument parsing

use clap::Parser;
use palaver_common::DEFAULT_PORT;
use std::net::IpAddr;

/// Palaver relay server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// IP address to bind to (IPv4 or IPv6)
    #[arg(short, long, default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Enable debug logging (shows connect/disconnect messages)
    #[arg(long, default_value = "false")]
    pub debug: bool,
}

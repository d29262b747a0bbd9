//! Palaver relay server

mod args;
mod connection;
mod constants;
mod rooms;
mod router;
mod sessions;

use std::io;
use std::net::SocketAddr;

use clap::Parser;
use tokio::net::TcpListener;

use args::Args;
use connection::ConnectionParams;
use constants::*;
use rooms::RoomRegistry;
use sessions::SessionRegistry;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Print banner first
    println!("{}{}", MSG_BANNER, env!("CARGO_PKG_VERSION"));

    let addr = SocketAddr::new(args.bind, args.port);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            println!("{}{}", MSG_LISTENING, addr);
            listener
        }
        Err(e) => {
            eprintln!("{}{}: {}", ERR_BIND, addr, e);
            std::process::exit(1);
        }
    };

    let sessions = SessionRegistry::new();
    let rooms = RoomRegistry::new();

    // Setup graceful shutdown handling
    let shutdown_signal = setup_shutdown_signal();
    let debug = args.debug;

    tokio::select! {
        _ = shutdown_signal => {
            println!("{}", MSG_SHUTDOWN_RECEIVED);
        }
        // Accept loop
        _ = async {
            loop {
                match listener.accept().await {
                    Ok((socket, peer_addr)) => {
                        if debug {
                            eprintln!("Connection from {}", peer_addr);
                        }

                        let params = ConnectionParams {
                            peer_addr,
                            sessions: sessions.clone(),
                            rooms: rooms.clone(),
                            debug,
                        };

                        // Spawn a new task to handle this connection
                        tokio::spawn(async move {
                            if let Err(e) = connection::handle_connection(socket, params).await {
                                log_connection_error(&e, peer_addr, debug);
                            }
                        });
                    }
                    Err(e) => {
                        eprintln!("{}{}", ERR_ACCEPT, e);
                    }
                }
            }
        } => {}
    }
}

/// Resolve when the process receives an interrupt
async fn setup_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

/// Connection errors are routine (resets, dropped peers); keep them quiet
/// unless debugging
fn log_connection_error(e: &io::Error, peer_addr: SocketAddr, debug: bool) {
    if debug {
        eprintln!("Connection from {} ended with error: {}", peer_addr, e);
    }
}

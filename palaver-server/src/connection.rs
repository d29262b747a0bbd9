//! Client connection handling
//!
//! One task per connection. The task owns both halves of the socket: frames
//! are pulled from the read half through the incremental decoder, and
//! everything other connections route here arrives on an unbounded channel
//! and is written out by the same `select!` loop. Registry mutations happen
//! inline in this task; cross-connection delivery only ever touches another
//! connection's channel, never its socket.

use std::io;
use std::net::SocketAddr;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use palaver_common::framing::{FrameError, MessageReader, MessageWriter};
use palaver_common::protocol::Message;

use crate::constants::*;
use crate::rooms::RoomRegistry;
use crate::router::Router;
use crate::sessions::SessionRegistry;

/// Parameters for handling a connection
pub struct ConnectionParams {
    pub peer_addr: SocketAddr,
    pub sessions: SessionRegistry,
    pub rooms: RoomRegistry,
    pub debug: bool,
}

/// Handle a client connection
pub async fn handle_connection(socket: TcpStream, params: ConnectionParams) -> io::Result<()> {
    handle_connection_inner(socket, params).await
}

/// Inner connection handler that works with any AsyncRead + AsyncWrite stream
pub async fn handle_connection_inner<S>(socket: S, params: ConnectionParams) -> io::Result<()>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static,
{
    let ConnectionParams {
        peer_addr,
        sessions,
        rooms,
        debug,
    } = params;

    let (reader, writer) = tokio::io::split(socket);
    let mut reader = MessageReader::new(BufReader::new(reader));
    let mut writer = MessageWriter::new(writer);

    let router = Router::new(sessions.clone(), rooms);

    // Channel for messages other connections route to this client
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    // Presence snapshot goes out before the peer has declared itself, so
    // there is no identity to exclude yet, and the list may be empty
    let snapshot = Message::UserList {
        from_id: sessions.user_ids().await,
        to_id: String::new(),
    };
    writer.write_message(&snapshot).await?;

    // Identity this connection logged in as, once declared
    let mut login: Option<String> = None;

    // Main loop - handle both incoming messages and outgoing deliveries
    loop {
        tokio::select! {
            // Frames from the peer
            result = reader.read_message() => {
                match result {
                    Ok(Some(message)) => {
                        handle_message(message, &mut login, &tx, &sessions, &router, debug).await;
                    }
                    Ok(None) => {
                        // Connection closed cleanly
                        break;
                    }
                    Err(e) => {
                        // Malformed or oversized input: the stream can never
                        // make progress again, so reset the connection
                        if !matches!(e, FrameError::Io(_)) || debug {
                            eprintln!("{}{}: {}", ERR_PARSE_MESSAGE, peer_addr, e);
                        }
                        break;
                    }
                }
            }

            // Deliveries routed to this client
            delivery = rx.recv() => {
                match delivery {
                    Some(message) => {
                        if writer.write_message(&message).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    // Shutdown the writer gracefully
    let _ = writer.get_mut().shutdown().await;

    // Teardown is the only thing that removes the session. Room memberships
    // naming the departed identity are left as-is; delivery to them becomes
    // a no-op.
    if let Some(user_id) = login {
        if sessions.remove(&user_id).await {
            let notice = Message::Logout {
                from_id: user_id.clone(),
            };
            sessions.broadcast(&notice, &user_id).await;
        }
        if debug {
            println!("User '{}' disconnected", user_id);
        }
    }

    Ok(())
}

/// Handle one decoded message from the peer
async fn handle_message(
    message: Message,
    login: &mut Option<String>,
    tx: &mpsc::UnboundedSender<Message>,
    sessions: &SessionRegistry,
    router: &Router,
    debug: bool,
) {
    match message {
        Message::Login { ref from_id } => {
            sessions.add(from_id, tx.clone()).await;
            *login = Some(from_id.clone());
            if debug {
                println!("User '{}' logged in", from_id);
            }
            let from_id = from_id.clone();
            sessions.broadcast(&message, &from_id).await;
        }
        Message::Logout { .. } => {
            // Announced but not enforced: the session stays registered until
            // the connection actually closes
            if let Some(user_id) = login {
                sessions.broadcast(&message, user_id).await;
            }
        }
        Message::CreateRoom {
            from_id,
            to_id,
            content,
        } => {
            router.create_room(&content, &from_id, &to_id).await;
        }
        Message::Text { .. }
        | Message::Image { .. }
        | Message::FileHeader { .. }
        | Message::FileChunk { .. }
        | Message::FileFinish { .. } => {
            router.deliver(message).await;
        }
        // Consumer-side notifications; nothing to do when a peer sends them
        Message::UserList { .. } | Message::JoinRoom { .. } => {}
    }
}

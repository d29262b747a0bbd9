//! Connection management and the read loop
//!
//! One background task owns the read half of the socket exclusively and is
//! the only reader. Everything that writes - the send API here and any
//! number of background transfer tasks - shares one writer mutex, so
//! messages from concurrent senders never interleave at the byte level.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use palaver_common::framing::{MessageReader, MessageWriter};
use palaver_common::protocol::Message;

use crate::events::Event;
use crate::transfer::{FileReceiver, SharedWriter, send_file};

/// A live connection to the relay
pub struct Connection {
    user_id: String,
    writer: SharedWriter<OwnedWriteHalf>,
    running: Arc<AtomicBool>,
    reader_task: JoinHandle<()>,
}

impl Connection {
    /// Connect, declare `user_id`, and start the read loop
    ///
    /// The login message goes out before this returns, so the relay knows
    /// this identity from the first moment. Decoded traffic arrives on the
    /// returned event receiver; received files land under `download_dir`.
    pub async fn connect(
        addr: impl ToSocketAddrs,
        user_id: impl Into<String>,
        download_dir: impl Into<PathBuf>,
    ) -> io::Result<(Self, mpsc::UnboundedReceiver<Event>)> {
        let user_id = user_id.into();
        let stream = TcpStream::connect(addr).await?;
        let (read_half, write_half) = stream.into_split();

        let writer: SharedWriter<OwnedWriteHalf> =
            Arc::new(Mutex::new(MessageWriter::new(write_half)));
        writer
            .lock()
            .await
            .write_message(&Message::Login {
                from_id: user_id.clone(),
            })
            .await?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let running = Arc::new(AtomicBool::new(true));
        let reader_task = tokio::spawn(read_loop(
            MessageReader::new(BufReader::new(read_half)),
            FileReceiver::new(download_dir),
            events_tx,
            running.clone(),
        ));

        Ok((
            Self {
                user_id,
                writer,
                running,
                reader_task,
            },
            events_rx,
        ))
    }

    /// Identity this connection logged in as
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Send chat text to a user (`private`) or to a room
    pub async fn send_text(&self, to_id: &str, content: &str, private: bool) -> io::Result<()> {
        self.send(Message::Text {
            from_id: self.user_id.clone(),
            to_id: to_id.to_string(),
            content: content.to_string(),
            private,
        })
        .await
    }

    /// Send an image, already base64-encoded by the caller
    pub async fn send_image(&self, to_id: &str, content: &str, private: bool) -> io::Result<()> {
        self.send(Message::Image {
            from_id: self.user_id.clone(),
            to_id: to_id.to_string(),
            content: content.to_string(),
            private,
        })
        .await
    }

    /// Create a room and invite `invitees`
    ///
    /// The relay adds this identity as a member automatically; no
    /// `join_room` notification comes back for the creator.
    pub async fn create_room(&self, name: &str, invitees: Vec<String>) -> io::Result<()> {
        self.send(Message::CreateRoom {
            from_id: self.user_id.clone(),
            to_id: invitees,
            content: name.to_string(),
        })
        .await
    }

    /// Start a background transfer of `path`
    ///
    /// The transfer shares this connection's writer mutex frame by frame, so
    /// it cannot block other outgoing traffic for longer than one message.
    /// Failures (missing source, broken connection) are logged locally; the
    /// remote side is never told.
    pub fn send_file(&self, path: impl Into<PathBuf>, to_id: &str, private: bool) -> JoinHandle<()> {
        let writer = self.writer.clone();
        let path = path.into();
        let from_id = self.user_id.clone();
        let to_id = to_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = send_file(writer, &path, &from_id, &to_id, private).await {
                eprintln!("File send of {} failed: {}", path.display(), e);
            }
        })
    }

    /// Announce departure without closing the connection
    ///
    /// The relay broadcasts the logout but keeps this session registered
    /// until the connection actually closes.
    pub async fn logout(&self) -> io::Result<()> {
        self.send(Message::Logout {
            from_id: self.user_id.clone(),
        })
        .await
    }

    /// Close the connection and stop the read loop
    ///
    /// Cancellation is coarse: clear the running flag, shut the socket down,
    /// and let the read loop observe the closed stream. No in-flight read or
    /// write is interrupted midway.
    pub async fn close(self) {
        self.running.store(false, Ordering::SeqCst);
        {
            let mut writer = self.writer.lock().await;
            let _ = writer.get_mut().shutdown().await;
        }
        // Dropping the read half closes the socket outright, which ends a
        // read loop whose peer never closes its side
        self.reader_task.abort();
        let _ = self.reader_task.await;
    }

    async fn send(&self, message: Message) -> io::Result<()> {
        self.writer.lock().await.write_message(&message).await
    }
}

/// The single reader: decode frames, feed transfers, surface events
async fn read_loop(
    mut reader: MessageReader<BufReader<OwnedReadHalf>>,
    mut receiver: FileReceiver,
    events: mpsc::UnboundedSender<Event>,
    running: Arc<AtomicBool>,
) {
    while running.load(Ordering::SeqCst) {
        let message = match reader.read_message().await {
            Ok(Some(message)) => message,
            Ok(None) => break,
            Err(e) => {
                // A failed read after close() is just the shutdown landing
                if running.load(Ordering::SeqCst) {
                    eprintln!("Receive loop error: {}", e);
                }
                break;
            }
        };
        handle_message(message, &mut receiver, &events).await;
    }
    let _ = events.send(Event::Disconnected);
}

/// Map one inbound message to receiver state and/or an event
async fn handle_message(
    message: Message,
    receiver: &mut FileReceiver,
    events: &mpsc::UnboundedSender<Event>,
) {
    match message {
        Message::Text {
            from_id, content, ..
        } => {
            let _ = events.send(Event::Text { from_id, content });
        }
        Message::Image {
            from_id, content, ..
        } => {
            let _ = events.send(Event::Image { from_id, content });
        }
        Message::Login { from_id } => {
            let _ = events.send(Event::UserOnline(from_id));
        }
        Message::Logout { from_id } => {
            let _ = events.send(Event::UserOffline(from_id));
        }
        Message::UserList { from_id, .. } => {
            let _ = events.send(Event::UserList(from_id));
        }
        Message::JoinRoom { from_id, content } => {
            let _ = events.send(Event::RoomInvite {
                room: content,
                from_id,
            });
        }
        Message::FileHeader { filename, .. } => match receiver.begin(&filename).await {
            Ok(_) => {
                let _ = events.send(Event::TransferStarted { filename });
            }
            Err(e) => eprintln!("Failed to open output for {}: {}", filename, e),
        },
        Message::FileChunk {
            filename, content, ..
        } => {
            // A failed chunk is dropped; the transfer stays open
            if let Err(e) = receiver.append(&filename, &content).await {
                eprintln!("Failed to write chunk of {}: {}", filename, e);
            }
        }
        Message::FileFinish { filename, .. } => {
            if let Some(path) = receiver.finish(&filename).await {
                let _ = events.send(Event::TransferFinished { filename, path });
            }
        }
        // Room-creation requests only ever travel client to relay
        Message::CreateRoom { .. } => {}
    }
}

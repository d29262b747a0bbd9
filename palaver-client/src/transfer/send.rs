//! Sender side: chunk a source file into the message stream

use std::io;
use std::path::Path;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::io::{AsyncReadExt, AsyncWrite};
use tokio::sync::Mutex;

use palaver_common::FILE_CHUNK_SIZE;
use palaver_common::framing::MessageWriter;
use palaver_common::protocol::Message;

/// Writer shared between the connection and background transfer tasks
///
/// Every outbound message takes this lock for the duration of one
/// `write_message`, so a chunk's bytes never interleave with a concurrent
/// send on the wire.
pub type SharedWriter<W> = Arc<Mutex<MessageWriter<W>>>;

/// Send one file as a header, chunks, finish sequence
///
/// Reads the source in fixed 512 KiB blocks and emits one base64 `file_chunk`
/// per block. The lock is taken per message rather than for the whole
/// transfer, so other traffic can still go out between chunks.
///
/// # Errors
///
/// A missing or unreadable source fails before the header is sent; the
/// remote side never learns the transfer was attempted. An I/O error after
/// the header leaves the transfer unfinished on the receiver.
pub async fn send_file<W>(
    writer: SharedWriter<W>,
    path: &Path,
    from_id: &str,
    to_id: &str,
    private: bool,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let metadata = tokio::fs::metadata(path).await?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "source path has no file name")
        })?
        .to_string();
    let mut file = tokio::fs::File::open(path).await?;

    let header = Message::FileHeader {
        from_id: from_id.to_string(),
        to_id: to_id.to_string(),
        filename: filename.clone(),
        filesize: metadata.len(),
        private,
    };
    writer.lock().await.write_message(&header).await?;

    let mut block = vec![0u8; FILE_CHUNK_SIZE];
    loop {
        let n = read_block(&mut file, &mut block).await?;
        if n == 0 {
            break;
        }
        let chunk = Message::FileChunk {
            from_id: from_id.to_string(),
            to_id: to_id.to_string(),
            filename: filename.clone(),
            content: BASE64.encode(&block[..n]),
            private,
        };
        writer.lock().await.write_message(&chunk).await?;
    }

    let finish = Message::FileFinish {
        from_id: from_id.to_string(),
        to_id: to_id.to_string(),
        filename,
        private,
    };
    writer.lock().await.write_message(&finish).await?;

    Ok(())
}

/// Fill `block` as far as the file allows; returns 0 only at end-of-file
///
/// A single `read` may return short, but every chunk except the last must
/// carry exactly one full block, so keep reading until the block is full or
/// the file ends.
async fn read_block(file: &mut tokio::fs::File, block: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < block.len() {
        let n = file.read(&mut block[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

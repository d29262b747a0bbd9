//! Receiver side: reassemble chunked transfers

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Reassembles incoming transfers, one open output handle per filename
///
/// State machine per filename: absent -> receiving -> absent. A
/// `file_header` opens (creates or truncates) the output and enters the
/// receiving state; each `file_chunk` appends at the handle's running
/// offset; `file_finish` closes the handle and leaves the state.
///
/// Output files land in the download directory under exactly the name the
/// sender declared. The name is not sanitized, so a hostile sender can
/// point the write outside the directory; callers that care must screen
/// filenames before feeding messages in.
#[derive(Debug)]
pub struct FileReceiver {
    dir: PathBuf,
    open: HashMap<String, File>,
}

impl FileReceiver {
    /// Create a receiver writing into `dir` (created on first use)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            open: HashMap::new(),
        }
    }

    /// Filenames with a transfer currently in the receiving state
    pub fn active(&self) -> Vec<&str> {
        self.open.keys().map(|name| name.as_str()).collect()
    }

    /// Handle a `file_header`: open the output and enter the receiving state
    ///
    /// A second header for an already-receiving filename truncates the
    /// output and replaces the open handle - the two transfers corrupt each
    /// other, since state is keyed by filename alone.
    pub async fn begin(&mut self, filename: &str) -> io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(filename);
        let file = File::create(&path).await?;
        self.open.insert(filename.to_string(), file);
        Ok(path)
    }

    /// Handle a `file_chunk`: decode the payload and append it
    ///
    /// Returns `Ok(false)` when no transfer is receiving under this filename
    /// (header missed, or already finished); the chunk is discarded.
    ///
    /// # Errors
    ///
    /// A decode or write failure drops the chunk. The transfer stays in the
    /// receiving state - it is never aborted from here, and the sender is
    /// never told.
    pub async fn append(&mut self, filename: &str, content: &str) -> io::Result<bool> {
        let Some(file) = self.open.get_mut(filename) else {
            return Ok(false);
        };
        let bytes = BASE64
            .decode(content)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        file.write_all(&bytes).await?;
        Ok(true)
    }

    /// Handle a `file_finish`: close the handle and leave the receiving state
    ///
    /// Returns the output path, or `None` when the filename is unknown.
    pub async fn finish(&mut self, filename: &str) -> Option<PathBuf> {
        let mut file = self.open.remove(filename)?;
        let _ = file.flush().await;
        Some(self.dir.join(filename))
    }
}

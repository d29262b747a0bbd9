//! Message writer for sending protocol messages to a stream

use std::io;

use tokio::io::AsyncWriteExt;

use crate::protocol::Message;

/// Writes protocol messages to an async writer
///
/// Each message is serialized and written with a single `write_all`, so
/// callers that serialize access to the writer (a mutex, or one owning task)
/// get whole-message atomicity on the wire. Consecutive messages are
/// back-to-back with no separator.
pub struct MessageWriter<W> {
    writer: W,
}

impl<W> MessageWriter<W> {
    /// Create a new message writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Get a reference to the underlying writer
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Get a mutable reference to the underlying writer
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Consume the message writer and return the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: AsyncWriteExt + Unpin> MessageWriter<W> {
    /// Serialize and write one message
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    pub async fn write_message(&mut self, message: &Message) -> io::Result<()> {
        let bytes = serde_json::to_vec(message)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.writer.write_all(&bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::FrameDecoder;

    #[tokio::test]
    async fn test_writer_no_separator_between_messages() {
        let mut writer = MessageWriter::new(Vec::new());
        writer
            .write_message(&Message::Login {
                from_id: "a".into(),
            })
            .await
            .unwrap();
        writer
            .write_message(&Message::Logout {
                from_id: "a".into(),
            })
            .await
            .unwrap();

        let bytes = writer.into_inner();
        let text = String::from_utf8(bytes).unwrap();
        // Two objects butted together, exactly as the wire format demands
        assert!(text.contains(r#"}{"#));
        assert!(!text.contains('\n'));
    }

    #[tokio::test]
    async fn test_writer_output_decodes_back() {
        let messages = vec![
            Message::Login {
                from_id: "alice".into(),
            },
            Message::Text {
                from_id: "alice".into(),
                to_id: "bob".into(),
                content: "hi".into(),
                private: true,
            },
        ];

        let mut writer = MessageWriter::new(Vec::new());
        for msg in &messages {
            writer.write_message(msg).await.unwrap();
        }

        let mut decoder = FrameDecoder::new();
        decoder.push(&writer.into_inner());
        let mut decoded = Vec::new();
        while let Some(msg) = decoder.try_next().unwrap() {
            decoded.push(msg);
        }
        assert_eq!(decoded, messages);
    }
}

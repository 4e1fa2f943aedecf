//! Line-delimited JSON transport over stdin/stdout.
//!
//! Each JSON-RPC message is a single line terminated by `\n`.
//! This follows the MCP stdio transport specification.

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin, Stdout};
use tracing::trace;

use crate::error::TransportError;

/// Reads JSON-RPC messages from stdin, writes responses to stdout.
///
/// Uses line-delimited JSON: one complete JSON object per line.
/// This struct is generic over reader/writer for testability.
pub struct StdioTransport<R, W> {
    reader: BufReader<R>,
    writer: W,
    partial: Vec<u8>,
}

impl StdioTransport<Stdin, Stdout> {
    /// A transport over the process's own stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R, W> StdioTransport<R, W>
where
    R: tokio::io::AsyncRead + Unpin,
    W: tokio::io::AsyncWrite + Unpin,
{
    /// Creates a new transport with the given reader and writer.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
            partial: Vec::new(),
        }
    }

    /// Reads the next line from the input stream.
    ///
    /// Returns `None` on EOF (connection closed) and an empty string
    /// for blank lines. Cancel safe: bytes of a line cut short by a
    /// dropped future are kept and completed by the next call.
    pub async fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        self.reader
            .read_until(b'\n', &mut self.partial)
            .await
            .map_err(|e| TransportError::Read(e.to_string()))?;

        if self.partial.is_empty() {
            return Ok(None);
        }

        let bytes = std::mem::take(&mut self.partial);
        let line = String::from_utf8(bytes)
            .map_err(|e| TransportError::Read(format!("stream did not contain valid UTF-8: {e}")))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Some(String::new()));
        }

        trace!(len = trimmed.len(), "read message");
        Ok(Some(trimmed.to_string()))
    }

    /// Writes one line to the output stream and flushes.
    pub async fn write_line(&mut self, message: &str) -> Result<(), TransportError> {
        trace!(len = message.len(), "writing message");

        let mut frame = Vec::with_capacity(message.len() + 1);
        frame.extend_from_slice(message.as_bytes());
        frame.push(b'\n');
        self.writer
            .write_all(&frame)
            .await
            .map_err(|e| TransportError::Write(e.to_string()))?;
        self.writer
            .flush()
            .await
            .map_err(|e| TransportError::Write(e.to_string()))
    }

    /// Serialises `message` as compact JSON and writes it as one line.
    pub async fn write_message<T: Serialize>(&mut self, message: &T) -> Result<(), TransportError> {
        let json =
            serde_json::to_string(message).map_err(|e| TransportError::Serialize(e.to_string()))?;
        self.write_line(&json).await
    }

    /// Consumes the transport, returning the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

//! stdio transport for the MCP server.
//!
//! Messages are UTF-8 encoded JSON documents delimited by newlines:
//!
//! - stdin: receives requests from the client
//! - stdout: sends responses to the client
//! - stderr: may be used for logging (never protocol messages)
//!
//! The transport only moves framed lines; encoding and decoding live in
//! [`crate::mcp::protocol`].

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// A stdio-based line transport.
pub struct StdioTransport {
    /// Buffered reader for stdin.
    reader: BufReader<tokio::io::Stdin>,
    /// Handle for stdout.
    writer: tokio::io::Stdout,
}

impl StdioTransport {
    /// Creates a new stdio transport.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reader: BufReader::new(tokio::io::stdin()),
            writer: tokio::io::stdout(),
        }
    }

    /// Reads the next line from stdin.
    ///
    /// Returns `None` if stdin is closed (EOF).
    ///
    /// # Errors
    ///
    /// Returns an error if reading from stdin fails.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let bytes_read = self.reader.read_line(&mut line).await?;

        if bytes_read == 0 {
            // EOF - stdin closed
            return Ok(None);
        }

        // Remove the trailing newline
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }

        Ok(Some(line))
    }

    /// Writes one encoded message line to stdout, newline-terminated.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub async fn write_line(&mut self, json: &str) -> io::Result<()> {
        // Messages must not contain embedded newlines
        debug_assert!(
            !json.contains('\n'),
            "JSON message must not contain embedded newlines"
        );

        self.writer.write_all(json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;

        Ok(())
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::{encode, RequestId, Response};

    #[test]
    fn transport_default() {
        // Just ensure Default is implemented and doesn't panic
        let _transport = StdioTransport::default();
    }

    #[tokio::test]
    async fn serialise_response_no_newlines() {
        // Verify our JSON serialisation doesn't produce embedded newlines,
        // even for results containing multi-line text
        let response = Response::success(
            Some(RequestId::Number(1)),
            serde_json::json!({
                "content": [{"type": "text", "text": "line one\nline two"}],
                "nested": {"key": "value"}
            }),
        );

        let json = encode(&response).unwrap();
        assert!(
            !json.contains('\n'),
            "Serialised JSON should not contain newlines"
        );
    }

    #[tokio::test]
    async fn serialise_error_no_newlines() {
        let error = Response::method_not_found(Some(RequestId::Number(1)), "test/method");

        let json = encode(&error).unwrap();
        assert!(
            !json.contains('\n'),
            "Serialised JSON should not contain newlines"
        );
    }
}

//! Per-connection plumbing
//!
//! Each accepted socket is split. The read half goes to a reader task that
//! frames `\n`-delimited lines, decodes them and pushes them into the
//! shared [`Mailbox`]. The write half is handed to the game loop, which is
//! the only writer.

use crate::core::types::ConnectionId;
use crate::server::mailbox::Mailbox;
use crate::server::protocol::{decode_line, encode, ClientMessage, ServerMessage};
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Longest line a client may send
pub const MAX_LINE_LEN: usize = 16 * 1024;

/// Something a reader task (or the acceptor) reports to the game loop
pub enum Inbound {
    Connected(ConnectionWriter),
    Message(ClientMessage),
    Disconnected,
}

/// An [`Inbound`] tagged with the connection it came from
pub struct Envelope {
    pub conn: ConnectionId,
    pub inbound: Inbound,
}

impl Envelope {
    pub fn new(conn: ConnectionId, inbound: Inbound) -> Self {
        Self { conn, inbound }
    }

    /// Is this a decoded client message (as opposed to a session event)?
    pub fn message(&self) -> Option<&ClientMessage> {
        match &self.inbound {
            Inbound::Message(message) => Some(message),
            _ => None,
        }
    }
}

// ============================================================================
// Reading
// ============================================================================

pub struct LineReader<R> {
    inner: BufReader<R>,
    max_line_len: usize,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
            max_line_len: MAX_LINE_LEN,
        }
    }

    pub fn max_line_len(mut self, max: usize) -> Self {
        self.max_line_len = max.max(1);
        self
    }

    /// Read one line, stripping the trailing `\n` and an optional `\r`.
    ///
    /// Returns `Ok(None)` on a clean EOF between lines.
    pub async fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut buf = Vec::new();
        let limit = self.max_line_len as u64 + 1;
        let n = (&mut self.inner)
            .take(limit)
            .read_until(b'\n', &mut buf)
            .await?;

        if n == 0 {
            return Ok(None);
        }
        if buf.last() != Some(&b'\n') {
            if buf.len() > self.max_line_len {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "line too long"));
            }
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "eof while reading line",
            ));
        }

        trim_crlf(&mut buf);
        Ok(Some(buf))
    }
}

fn trim_crlf(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
}

/// Pump lines from `reader` into `mailbox` until EOF or a read error.
///
/// Malformed lines are logged and dropped. A `Disconnected` envelope is
/// always the last thing pushed for `conn`.
pub async fn read_loop<R>(conn: ConnectionId, reader: R, mailbox: Arc<Mailbox<Envelope>>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = LineReader::new(reader);

    loop {
        match lines.read_line().await {
            Ok(Some(line)) => {
                if line.iter().all(u8::is_ascii_whitespace) {
                    continue;
                }
                match decode_line(&line) {
                    Ok(message) => {
                        tracing::trace!("{} sent {:?}", conn, message);
                        mailbox.push(Envelope::new(conn, Inbound::Message(message)));
                    }
                    Err(e) => tracing::warn!("Dropping line from {}: {}", conn, e),
                }
            }
            Ok(None) => {
                tracing::debug!("{} closed its connection", conn);
                break;
            }
            Err(e) => {
                tracing::warn!("Read from {} failed: {}", conn, e);
                break;
            }
        }
    }

    mailbox.push(Envelope::new(conn, Inbound::Disconnected));
}

// ============================================================================
// Writing
// ============================================================================

/// Write half of a client connection
pub struct ConnectionWriter {
    inner: Box<dyn AsyncWrite + Unpin + Send + Sync>,
}

impl ConnectionWriter {
    pub fn new<W>(inner: W) -> Self
    where
        W: AsyncWrite + Unpin + Send + Sync + 'static,
    {
        Self {
            inner: Box::new(inner),
        }
    }

    pub async fn send(&mut self, message: &ServerMessage) -> io::Result<()> {
        let line = encode(message).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.inner.write_all(line.as_bytes()).await?;
        self.inner.flush().await
    }
}

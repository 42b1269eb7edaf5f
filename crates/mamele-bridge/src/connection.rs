//! Framed connection over a bidirectional byte stream
//!
//! Provides the two receive primitives the protocol is built from:
//! "exactly N bytes" and "up to and including a delimiter". Bytes read
//! past the end of a request are kept for the next call.

use mamele_core::{MameleError, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::rendezvous::Rendezvous;

/// Size of each read from the underlying stream
const CHUNK_SIZE: usize = 4096;

/// One end of a mamele session
pub struct Connection<S> {
    stream: S,
    /// Bytes read ahead of the current parse position
    leftover: Vec<u8>,
    /// Socket directory to remove on close, if this side created it
    rendezvous: Option<Rendezvous>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    /// Wrap a connected stream
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            leftover: Vec::new(),
            rendezvous: None,
        }
    }

    pub(crate) fn with_rendezvous(stream: S, rendezvous: Rendezvous) -> Self {
        Self {
            rendezvous: Some(rendezvous),
            ..Self::new(stream)
        }
    }

    /// Read one chunk from the stream into the leftover buffer
    async fn fill(&mut self) -> Result<()> {
        let mut chunk = [0u8; CHUNK_SIZE];
        let read = self
            .stream
            .read(&mut chunk)
            .await
            .map_err(|e| MameleError::ReceiveError(format!("Read failed: {}", e)))?;

        if read == 0 {
            return Err(MameleError::ReceiveError(
                "Connection closed by peer".into(),
            ));
        }

        self.leftover.extend_from_slice(&chunk[..read]);
        Ok(())
    }

    /// Take the first `count` buffered bytes
    fn take(&mut self, count: usize) -> Vec<u8> {
        let rest = self.leftover.split_off(count);
        std::mem::replace(&mut self.leftover, rest)
    }

    /// Block until exactly `count` bytes are available and return them
    pub async fn receive_exact(&mut self, count: usize) -> Result<Vec<u8>> {
        if count > self.leftover.len() {
            self.leftover.reserve(count - self.leftover.len());
        }
        while self.leftover.len() < count {
            self.fill().await?;
        }
        Ok(self.take(count))
    }

    /// Block until `delimiter` arrives; returns everything up to and including it
    pub async fn receive_until(&mut self, delimiter: u8) -> Result<Vec<u8>> {
        let mut scanned = 0;
        loop {
            if let Some(position) = self.leftover[scanned..]
                .iter()
                .position(|&byte| byte == delimiter)
            {
                return Ok(self.take(scanned + position + 1));
            }
            scanned = self.leftover.len();
            self.fill().await?;
        }
    }

    /// Write the whole payload
    pub async fn send(&mut self, data: &[u8]) -> Result<()> {
        self.stream
            .write_all(data)
            .await
            .map_err(|e| MameleError::SendError(format!("Write failed: {}", e)))?;

        self.stream
            .flush()
            .await
            .map_err(|e| MameleError::SendError(format!("Flush failed: {}", e)))?;

        Ok(())
    }

    /// Shut the stream down and remove the rendezvous if we created it.
    /// Failures are logged, never returned.
    pub async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            warn!("Failed to shut down connection: {}", e);
        }
        if !self.leftover.is_empty() {
            debug!("Discarding {} unread bytes on close", self.leftover.len());
        }

        if let Some(rendezvous) = self.rendezvous.take() {
            rendezvous.remove();
        }
    }
}

//! Unix socket transport
//!
//! The driver listens on a socket inside a fresh private directory and
//! hands the path to the emulator, which connects back as the client.

use crate::connection::Connection;
use crate::rendezvous::Rendezvous;
use mamele_core::{MameleError, Result};
use std::path::Path;
use tokio::net::{UnixListener, UnixStream};
use tracing::info;

/// Server side, waiting for its single peer
pub struct Listener {
    listener: UnixListener,
    rendezvous: Rendezvous,
}

/// Create the rendezvous socket and start listening.
///
/// Must be called from within a tokio runtime.
pub fn listen() -> Result<Listener> {
    let rendezvous = Rendezvous::create()?;
    let listener = UnixListener::bind(rendezvous.path()).map_err(|e| {
        MameleError::SetupError(format!(
            "Failed to bind {}: {}",
            rendezvous.path().display(),
            e
        ))
    })?;

    info!("Listening on {}", rendezvous.path().display());
    Ok(Listener {
        listener,
        rendezvous,
    })
}

impl Listener {
    /// Address to give to the peer
    pub fn address(&self) -> &Path {
        self.rendezvous.path()
    }

    /// Wait for the peer. Consumes the listener: a session has one connection.
    pub async fn accept(self) -> Result<Connection<UnixStream>> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .map_err(|e| MameleError::ConnectError(format!("Accept failed: {}", e)))?;

        info!("Peer connected on {}", self.rendezvous.path().display());
        Ok(Connection::with_rendezvous(stream, self.rendezvous))
    }
}

/// Connect to a listening driver
pub async fn connect(address: impl AsRef<Path>) -> Result<Connection<UnixStream>> {
    let address = address.as_ref();
    info!("Connecting to {}", address.display());

    let stream = UnixStream::connect(address).await.map_err(|e| {
        MameleError::ConnectError(format!("Failed to connect to {}: {}", address.display(), e))
    })?;

    Ok(Connection::new(stream))
}

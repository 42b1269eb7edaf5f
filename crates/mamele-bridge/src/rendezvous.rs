//! Filesystem rendezvous for the session socket

use mamele_core::{MameleError, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, error};

/// Socket file name inside the private directory
const SOCKET_NAME: &str = "socket";

/// A private temporary directory holding the socket file
///
/// Owned by the side that created it. Dropping it without calling
/// [`Rendezvous::remove`] still deletes the directory.
#[derive(Debug)]
pub struct Rendezvous {
    dir: TempDir,
    path: PathBuf,
}

impl Rendezvous {
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("mamelesocket")
            .tempdir()
            .map_err(|e| {
                MameleError::SetupError(format!("Failed to create socket directory: {}", e))
            })?;
        let path = dir.path().join(SOCKET_NAME);
        Ok(Self { dir, path })
    }

    /// Path of the socket file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the socket and its directory, logging any failure
    pub fn remove(self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            error!("Failed to remove socket {}: {}", self.path.display(), e);
        }
        let dir = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!("Removed socket directory {}", dir.display()),
            Err(e) => error!("Failed to remove socket directory {}: {}", dir.display(), e),
        }
    }
}

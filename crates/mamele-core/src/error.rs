//! Error types for mamele

use thiserror::Error;

/// Result type for mamele operations
pub type Result<T> = std::result::Result<T, MameleError>;

/// Mamele error types
#[derive(Debug, Error)]
pub enum MameleError {
    /// Rendezvous resource could not be created
    #[error("Setup error: {0}")]
    SetupError(String),

    /// Client could not reach the server
    #[error("Connect error: {0}")]
    ConnectError(String),

    /// Malformed command tag, payload or numeric field
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// Transport failure while writing
    #[error("Send error: {0}")]
    SendError(String),

    /// Transport failure while reading
    #[error("Receive error: {0}")]
    ReceiveError(String),

    /// Peer closed the session without being asked to
    #[error("Emulator quit unexpectedly")]
    UnexpectedQuit,

    /// Switch name outside the fixed twelve
    #[error("Invalid switch: {0}")]
    InvalidSwitch(String),

    /// ROM directory is missing
    #[error("ROM path missing: {0}")]
    MissingRomPath(String),

    /// Configuration could not be loaded
    #[error("Config error: {0}")]
    ConfigError(String),
}

impl From<serde_json::Error> for MameleError {
    fn from(err: serde_json::Error) -> Self {
        MameleError::ConfigError(err.to_string())
    }
}

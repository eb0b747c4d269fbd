//! The error type shared by the whole crate.

use std::path::PathBuf;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Anything that can abort an observation run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The environment variable naming the simulator installation is not set.
    #[error("Please declare the environment variable '{0}'")]
    MissingEnvironment(String),

    /// The configuration file could not be parsed.
    #[error("Invalid configuration in {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The simulator process could not be spawned.
    #[error("Failed to launch '{binary}': {source}")]
    Launch {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// No TraCI connection could be established.
    #[error("Could not connect to TraCI server at {addr}: {reason}")]
    Connect { addr: String, reason: String },

    /// The simulator sent something this client does not understand.
    #[error("TraCI protocol error: {0}")]
    Protocol(String),

    /// The simulator rejected a command with an error status.
    #[error("Command 0x{command:02x} failed: {description}")]
    Command { command: u8, description: String },

    /// A vehicle appeared to leave before it entered.
    #[error("Vehicle '{id}' exited at {exit} before its entry at {entry}")]
    NegativeDuration { id: String, entry: f64, exit: f64 },

    /// The run was stopped by the user.
    #[error("Interrupted")]
    Interrupted,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON export error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

//! Error types for portmap.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::reconcile::HeaderField;

/// Main error type for portmap operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Report command errors
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Inventory document errors
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// Spreadsheet reconciliation errors
    #[error("Reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// Cell grid I/O errors
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host is not present in known_hosts (strict mode)
    #[error("Unknown host key for {host}:{port}")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key differs from the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised while running a report command.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Command exited with a non-zero (or no) status while exit status is enforced
    #[error("'{command}' exited with status {status:?}: {stderr}")]
    NonZeroExit {
        command: String,
        status: Option<u32>,
        stderr: String,
    },
}

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A loaded value failed validation
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Figment could not load or extract the configuration
    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

/// Inventory document errors.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// Reading or writing the document failed
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The document is not valid inventory JSON
    #[error("invalid inventory document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Spreadsheet reconciliation errors.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// A mandatory header column could not be found in the header row
    #[error("required column '{0}' not found in header row")]
    MissingColumn(HeaderField),
}

/// Cell grid errors.
#[derive(Error, Debug)]
pub enum GridError {
    /// The A1 range could not be parsed
    #[error("invalid range '{0}'")]
    InvalidRange(String),

    /// A write targeted a cell outside the loaded rectangle
    #[error("cell ({row}, {col}) is outside the loaded range")]
    OutOfBounds { row: usize, col: usize },

    /// HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote API answered with a non-success status
    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The API base URL is unusable
    #[error("invalid API base URL '{0}'")]
    InvalidBaseUrl(String),

    /// The service account key could not sign a token request
    #[error("service account signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Result type alias using portmap's Error.
pub type Result<T> = std::result::Result<T, Error>;

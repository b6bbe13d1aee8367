//! Error types for the Phalanx aggregator.
//!
//! All errors are represented by the [`PhalanxError`] enum. Errors that
//! originate on a search node always carry that node's address, so a caller
//! can tell which part of the cluster failed.
//!
//! # Examples
//!
//! ```
//! use phalanx::error::{PhalanxError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(PhalanxError::invalid_argument("Illegal values for window"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use anyhow;
use thiserror::Error;

/// Error code a node reports when a requested (view) group does not exist there.
pub const GROUP_NOT_FOUND: &str = "GROUP_NOT_FOUND";

/// Error code used for transport failures while talking to a node.
pub const ERROR_ON_NODE: &str = "ERROR_ON_NODE";

/// The main error type for Phalanx operations.
#[derive(Error, Debug)]
pub enum PhalanxError {
    /// I/O errors (config files, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Caller supplied an invalid argument (e.g. a negative window bound)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unrecognized sort specification
    #[error("Invalid sort: {0}")]
    InvalidSort(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client failed before a response was available
    #[error("Transport error: {0}")]
    Transport(String),

    /// A node returned an error, or could not be reached
    #[error("Error on node {node_url} ({status} {code}): {message}")]
    Node {
        /// Address of the node that failed.
        node_url: String,
        /// HTTP status to report for this failure.
        status: u16,
        /// Error code reported by the node.
        code: String,
        /// Error message reported by the node.
        message: String,
    },

    /// Internal invariant violated
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with PhalanxError.
pub type Result<T> = std::result::Result<T, PhalanxError>;

impl PhalanxError {
    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        PhalanxError::InvalidArgument(msg.into())
    }

    /// Create a new invalid sort error.
    pub fn invalid_sort<S: Into<String>>(msg: S) -> Self {
        PhalanxError::InvalidSort(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        PhalanxError::InvalidConfig(msg.into())
    }

    /// Create a new transport error.
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        PhalanxError::Transport(msg.into())
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        PhalanxError::Internal(msg.into())
    }

    /// Create an error reported by a node.
    pub fn node<U, C, M>(node_url: U, status: u16, code: C, message: M) -> Self
    where
        U: Into<String>,
        C: Into<String>,
        M: Into<String>,
    {
        PhalanxError::Node {
            node_url: node_url.into(),
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Address of the node this error originated on, if any.
    pub fn node_url(&self) -> Option<&str> {
        match self {
            PhalanxError::Node { node_url, .. } => Some(node_url),
            _ => None,
        }
    }

    /// HTTP status an outer request handler should respond with.
    pub fn status_code(&self) -> u16 {
        match self {
            PhalanxError::InvalidArgument(_) | PhalanxError::InvalidSort(_) => 400,
            PhalanxError::Node { status, .. } => *status,
            _ => 500,
        }
    }
}

/// Map a low-level failure while talking to `node_url` into a node-tagged error.
///
/// Errors that are already tagged with a node pass through unchanged.
pub fn translate_node_error(node_url: &str, cause: PhalanxError) -> PhalanxError {
    match cause {
        e @ PhalanxError::Node { .. } => e,
        other => {
            log::warn!("Request to node {node_url} failed: {other}");
            PhalanxError::node(node_url, 500, ERROR_ON_NODE, other.to_string())
        }
    }
}

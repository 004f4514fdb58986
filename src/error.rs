use thiserror::Error;

use crate::catalog::Namespace;

/// Boxed error returned by a transport or device implementation.
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while reading, restoring or resetting NVRAM.
///
/// Any of these aborts the whole document-level operation. Callers usually
/// only need to distinguish [`Error::UnknownIdentifier`] and
/// [`Error::MalformedBackup`] (bad input) from [`Error::Transport`] (bad
/// device).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A sub-id has no catalog or table match, or a backup name cannot be
    /// resolved back to a sub-id.
    #[error("unknown identifier: {0}")]
    UnknownIdentifier(String),

    /// The device or its transport failed. Propagated as returned by the
    /// collaborator, no retries are attempted here.
    #[error("transport failure: {0}")]
    Transport(#[source] TransportError),

    /// The backup document is structurally invalid or holds a value that is
    /// not valid hex.
    #[error("malformed backup: {0}")]
    MalformedBackup(String),

    /// The item exists with a fixed length that differs from the new value.
    #[error("length mismatch for {namespace}/0x{sub_id:04X}: stored {stored} bytes, got {new}")]
    LengthMismatch {
        namespace: Namespace,
        sub_id: u16,
        stored: usize,
        new: usize,
    },

    /// A store image file could not be interpreted.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wraps an arbitrary transport error.
    pub fn transport<E>(error: E) -> Self
    where
        E: Into<TransportError>,
    {
        Self::Transport(error.into())
    }
}

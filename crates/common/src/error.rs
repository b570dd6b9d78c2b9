//! Error taxonomy shared by every manifold layer
//!
//! Failures surface as fixed human-readable diagnostics. A missing key on
//! read is a normal outcome, never an error.

use thiserror::Error;

/// Result type for manifold operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds that can cross the call boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Database handle was closed or never opened
    #[error("database is uninitialized")]
    Uninitialized,

    /// Required argument missing or semantically invalid
    #[error("{0}")]
    ArgsWrong(&'static str),

    /// Mutually-exclusive arguments combined
    #[error("{0}")]
    ArgsCombo(&'static str),

    /// Underlying store reports data corruption
    #[error("Failure: DB Corruption")]
    Corruption,

    /// Underlying store reports an I/O failure
    #[error("Failure: IO Error")]
    Io,

    /// Underlying store rejected an argument
    #[error("Failure: Invalid Argument")]
    InvalidArgument,

    /// Any other engine failure
    #[error("Failure")]
    Unknown,

    /// Feature absent in this build
    #[error("{0}")]
    NotSupported(&'static str),

    /// Optimistic commit validation failed
    #[error("transaction conflict: watched key was modified")]
    Conflict,

    /// Arena refused an allocation
    #[error("Failure: Out of Memory")]
    OutOfMemory,
}

impl From<fjall::Error> for Error {
    fn from(e: fjall::Error) -> Self {
        // Walk the source chain first: I/O failures keep their kind no
        // matter how deep the engine wraps them.
        let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&e);
        while let Some(err) = source {
            if err.is::<std::io::Error>() {
                return Error::Io;
            }
            source = err.source();
        }

        let text = e.to_string().to_ascii_lowercase();
        if text.contains("corrupt") {
            Error::Corruption
        } else if text.contains("invalid") {
            Error::InvalidArgument
        } else {
            Error::Unknown
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(_: std::io::Error) -> Self {
        Error::Io
    }
}

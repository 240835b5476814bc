//! Error types for bitmap serialization.

use std::io;

use thiserror::Error;

/// Error variants for reading and writing serialized bitmaps.
#[derive(Debug, Error)]
pub enum Error {
    /// The input is not a well-formed serialized bitmap.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// An I/O error occurred, including input ending before the bitmap did.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(err) => err,
            Error::InvalidFormat(reason) => io::Error::new(io::ErrorKind::InvalidData, reason),
        }
    }
}

/// A specialized Result type for bitmap serialization.
pub type Result<T> = std::result::Result<T, Error>;

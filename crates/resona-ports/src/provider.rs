use std::io::{Read, Seek};

/// Raised by a provider when it cannot produce the requested instance.
/// Resolution treats this as "skip the candidate", never as fatal.
#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("unknown info: {0}")]
    UnknownInfo(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Outcome of a file reader that could not produce a result.
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    /// The reader does not understand this stream; the next reader is tried.
    #[error("stream not recognized: {0}")]
    NotRecognized(String),
    /// Unexpected I/O failure; the scan stops here.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReadError {
    pub fn not_recognized(reason: impl Into<String>) -> Self {
        ReadError::NotRecognized(reason.into())
    }
}

/// Seekable byte source handed to file readers.
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

//! Error types for lazy archive access.

use thiserror::Error;

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, ZipError>;

/// Errors that can occur while indexing or reading a ZIP archive.
///
/// Errors fall into two families: format errors raised while locating and
/// parsing the central directory, and decode errors raised while reading an
/// entry's payload. Nothing is retried at this layer; every failure is
/// surfaced to the caller immediately.
#[derive(Debug, Error)]
pub enum ZipError {
    /// Malformed or missing archive structure (bad signature, truncated
    /// directory, invalid header).
    #[error("invalid ZIP format: {0}")]
    Format(String),

    /// Entry payload could not be decoded (corrupt deflate stream,
    /// size mismatch after inflation).
    #[error("failed to decode entry: {0}")]
    Decode(String),

    /// The decompressed bytes do not match the CRC-32 recorded in the
    /// central directory.
    #[error("checksum mismatch for '{name}': expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },

    /// The entry uses a compression method this reader does not implement.
    #[error("unsupported compression method: {0}")]
    UnsupportedCompression(u16),

    /// No entry with the given name exists in the index.
    #[error("entry not found: {0}")]
    EntryNotFound(String),

    /// I/O failure in the underlying byte source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP failure in a remote byte source.
    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for ZipError {
    fn from(err: reqwest::Error) -> Self {
        ZipError::Http(err.to_string())
    }
}

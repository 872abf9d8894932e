//! Error types for building and loading info databases.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when building or loading an info database.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] mameinfo_common::Error),

    /// Malformed or truncated XML input.
    #[error("{message}")]
    Xml { message: String },

    /// The caller's abort flag was raised during the build.
    #[error("build cancelled")]
    Cancelled,

    /// A table grew past what a 32-bit index can address.
    #[error("{what} cannot fit in 32 bits (value {value})")]
    IndexOverflow { what: &'static str, value: u64 },

    /// The output file could not be created or written.
    #[error("could not write {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The builder was asked to write before a document was processed.
    #[error("no document has been processed")]
    NotProcessed,

    /// The header did not unsalt to the expected magic.
    #[error("not an info database (bad magic {actual:?})")]
    InvalidMagic { actual: [u8; 4] },

    /// The file was written with a different record layout.
    #[error("info database layout mismatch: file fingerprint {actual:#010x}, expected {expected:#010x}")]
    SchemaMismatch { expected: u32, actual: u32 },

    /// The file is shorter than its header claims.
    #[error("info database truncated: need {needed} bytes, have {available}")]
    Truncated { needed: u64, available: u64 },

    /// The string region is missing its begin/end markers.
    #[error("corrupt string table: {0}")]
    CorruptStringTable(&'static str),

    /// A string reference points outside the string table.
    #[error("string offset {offset} out of bounds (string table size: {size})")]
    StringOffsetOutOfBounds { offset: usize, size: usize },

    /// JSON serialization error.
    #[cfg(feature = "json-export")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Result type for info database operations.
pub type Result<T> = std::result::Result<T, Error>;

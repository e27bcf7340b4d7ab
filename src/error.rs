//! Error types and handling for the redaction library
//! Author: kartik4091

use std::{io, result::Result as StdResult};

use thiserror::Error;

/// Custom result type for redaction operations
pub type Result<T> = StdResult<T, Error>;

/// Core error type for redaction operations
///
/// A span the locator cannot place is not an error; it becomes a placeholder
/// span. Rasterization failures never surface here either.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The document could not be opened or parsed. Never retried.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The classifier call failed. Aborts the identification step only.
    #[error("Identify error: {0}")]
    Identify(String),

    /// The output target could not be written.
    #[error("Write error: {0}")]
    Write(String),

    #[error("Page {page} is out of range (document has {count} pages)")]
    PageRange { page: u32, count: u32 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Wraps a `lopdf` failure raised while reading a document
    pub fn parse<E: std::fmt::Display>(e: E) -> Self {
        Error::Parse(e.to_string())
    }

    /// Wraps a failure raised while persisting output
    pub fn write<E: std::fmt::Display>(e: E) -> Self {
        Error::Write(e.to_string())
    }

    /// Wraps a classifier transport or decoding failure
    pub fn identify<E: std::fmt::Display>(e: E) -> Self {
        Error::Identify(e.to_string())
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_range_message() {
        let err = Error::PageRange { page: 4, count: 2 };
        assert_eq!(err.to_string(), "Page 4 is out of range (document has 2 pages)");
    }

    #[test]
    fn test_helpers_preserve_message() {
        assert!(matches!(Error::parse("bad xref"), Error::Parse(m) if m == "bad xref"));
        assert!(matches!(Error::write("disk full"), Error::Write(m) if m == "disk full"));
    }
}

//! Error taxonomy for per-file processing
//!
//! Two things can go wrong with a file: its source does not parse, or the
//! filesystem refuses it. Either way the file is skipped and reported, and
//! the rest of the batch keeps going.

use thiserror::Error;

/// Why a single file could not be processed.
#[derive(Debug, Error)]
pub enum Error {
    /// The source could not be parsed; the file is left untouched.
    #[error("{0}")]
    Syntax(String),

    /// The file could not be read or written.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short label for report rows and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Syntax(_) => "syntax error",
            Error::Io(_) => "io error",
        }
    }
}

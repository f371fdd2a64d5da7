use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by naming, saving, and reading dream PNGs.
///
/// Nothing in this crate recovers from these locally; every failure is
/// handed straight back to the caller.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),

    #[error("{} is not a valid PNG: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: img_parts::Error,
    },

    #[error("Failed to serialize metadata: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("sd-metadata in {} is not valid JSON: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Numeric prefix of {name:?} is not a valid integer: {source}")]
    Prefix {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("Prefix of {name:?} is the largest representable; no next prefix exists")]
    PrefixExhausted { name: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }
}

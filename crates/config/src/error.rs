use std::path::PathBuf;

use parley_protocol::StreamError;
use thiserror::Error;

/// Why a nested auto-download blob was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AutoDownloadError {
    #[error("auto-download blob is empty")]
    Empty,

    #[error("unsupported auto-download version {found}, expected {expected}")]
    Version { found: i8, expected: i8 },

    #[error("negative auto-download limit {0}")]
    NegativeLimit(i32),

    #[error(transparent)]
    Stream(#[from] StreamError),
}

/// Why a settings blob could not be decoded. The caller's record is never
/// touched when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("bad settings data: {0}")]
    Stream(#[from] StreamError),

    #[error("bad auto-download data: {0}")]
    AutoDownload(#[from] AutoDownloadError),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid session config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no config directory available on this platform")]
    NoConfigDir,
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

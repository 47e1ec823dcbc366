use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PppError {
    #[error("unrecognized observation filename: {0}")]
    UnrecognizedFormat(String),

    #[error("invalid epoch: {0}")]
    InvalidEpoch(String),

    #[error("date predates the GPS epoch (1980-01-06): {0}")]
    PreEpochDate(String),

    #[error("unrecognized long-form filename: {0}")]
    UnrecognizedLongFormat(String),

    #[error("transfer failed after {attempts} attempts for {url}: {message}")]
    TransferFailed {
        url: String,
        attempts: u32,
        message: String,
    },

    #[error("decompression failed for {path}: {message}")]
    DecompressionFailed { path: PathBuf, message: String },

    #[error("no observation files found in {0}")]
    NoObservationFiles(PathBuf),

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("no folder given on the command line or in ppp-pm.json")]
    MissingFolder,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

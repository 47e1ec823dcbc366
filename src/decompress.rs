use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use crate::error::PppError;

pub fn compressed_suffix(name: &str) -> Option<&'static str> {
    if name.ends_with(".gz") {
        Some(".gz")
    } else if name.ends_with(".Z") {
        Some(".Z")
    } else {
        None
    }
}

/// Unpacks a downloaded archive next to itself, dropping the suffix.
/// The source archive is deleted on success and retained on failure.
pub trait Decompressor: Send + Sync {
    fn decompress(&self, path: &Path) -> Result<PathBuf, PppError>;
}

// `.Z` products on the WHU mirror are gzip streams despite the suffix, so a
// single decoder covers both.
#[derive(Debug, Clone, Copy, Default)]
pub struct GzDecompressor;

impl GzDecompressor {
    pub fn new() -> Self {
        Self
    }
}

impl Decompressor for GzDecompressor {
    fn decompress(&self, path: &Path) -> Result<PathBuf, PppError> {
        let failed = |message: String| PppError::DecompressionFailed {
            path: path.to_path_buf(),
            message,
        };
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| failed("non-utf8 file name".to_string()))?;
        let suffix = compressed_suffix(name).ok_or_else(|| failed("unrecognized suffix".to_string()))?;
        let target = path.with_file_name(&name[..name.len() - suffix.len()]);

        let archive = File::open(path).map_err(|err| failed(err.to_string()))?;
        let mut decoder = GzDecoder::new(BufReader::new(archive));
        let mut out = File::create(&target).map_err(|err| failed(err.to_string()))?;
        if let Err(err) = io::copy(&mut decoder, &mut out) {
            drop(out);
            let _ = fs::remove_file(&target);
            return Err(failed(err.to_string()));
        }
        fs::remove_file(path).map_err(|err| PppError::Filesystem(err.to_string()))?;
        Ok(target)
    }
}

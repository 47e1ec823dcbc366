use std::fs;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::PppError;
use crate::manifest::Subdir;

/// Local layout for downloaded products:
/// `products/{directory_tag}/common/*` and `products/{directory_tag}/vmf/*`.
#[derive(Debug, Clone)]
pub struct Store {
    products_root: Utf8PathBuf,
}

impl Store {
    pub fn new() -> Result<Self, PppError> {
        let cwd = std::env::current_dir().map_err(|err| PppError::Filesystem(err.to_string()))?;
        let products_root = Utf8PathBuf::from_path_buf(cwd.join("products"))
            .map_err(|_| PppError::Filesystem("non-utf8 working directory".to_string()))?;
        Ok(Self { products_root })
    }

    pub fn new_with_root(products_root: Utf8PathBuf) -> Self {
        Self { products_root }
    }

    pub fn products_root(&self) -> &Utf8Path {
        &self.products_root
    }

    pub fn session_dir(&self, directory_tag: &str) -> Utf8PathBuf {
        self.products_root.join(directory_tag)
    }

    pub fn product_dir(&self, directory_tag: &str, subdir: Subdir) -> Utf8PathBuf {
        self.session_dir(directory_tag).join(subdir.as_str())
    }

    pub fn product_path(
        &self,
        directory_tag: &str,
        subdir: Subdir,
        filename: &str,
    ) -> Utf8PathBuf {
        self.product_dir(directory_tag, subdir).join(filename)
    }

    pub fn ensure_session_dirs(&self, directory_tag: &str) -> Result<(), PppError> {
        for subdir in [Subdir::Common, Subdir::Vmf] {
            fs::create_dir_all(self.product_dir(directory_tag, subdir).as_std_path())
                .map_err(|err| PppError::Filesystem(err.to_string()))?;
        }
        Ok(())
    }

    /// Target folder for normalized short names: a `short/` sibling of the
    /// source folder.
    pub fn short_dir(source_folder: &Utf8Path) -> Utf8PathBuf {
        match source_folder.parent() {
            Some(parent) => parent.join("short"),
            None => Utf8PathBuf::from("short"),
        }
    }

    pub fn copy_file_atomic(source: &Utf8Path, dest: &Utf8Path) -> Result<(), PppError> {
        let parent = dest
            .parent()
            .ok_or_else(|| PppError::Filesystem("invalid destination path".to_string()))?;
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| PppError::Filesystem(err.to_string()))?;
        let temp = tempfile::Builder::new()
            .prefix("ppp-pm-file")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| PppError::Filesystem(err.to_string()))?;
        fs::copy(source.as_std_path(), temp.path())
            .map_err(|err| PppError::Filesystem(err.to_string()))?;
        if dest.as_std_path().exists() {
            fs::remove_file(dest.as_std_path())
                .map_err(|err| PppError::Filesystem(err.to_string()))?;
        }
        temp.persist(dest.as_std_path())
            .map_err(|err| PppError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

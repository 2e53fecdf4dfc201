//! Content source abstraction for reading archive members.

use crate::error::ImportError;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::io::{Read, Seek};

/// Trait for abstracting member access (ZIP archive vs. in-memory fixtures).
pub trait ContentSource {
    /// Read the member at the given logical path as raw bytes.
    fn read_bytes(&mut self, path: &Utf8Path) -> Result<Vec<u8>>;
    /// List every file member, in archive order.
    fn list_files(&mut self) -> Result<Vec<Utf8PathBuf>>;

    /// Read a member and decode it as UTF-8.
    fn read_to_string(&mut self, path: &Utf8Path) -> Result<String> {
        let raw = self.read_bytes(path)?;
        String::from_utf8(raw).with_context(|| format!("Non-UTF8 content in {}", path))
    }
}

/// Reads members from a ZIP archive (used for `.slx` files).
pub struct ZipSource<R: Read + Seek> {
    zip: zip::ZipArchive<R>,
}

impl<R: Read + Seek> ZipSource<R> {
    /// Open the archive. Failure here is fatal for the whole import.
    pub fn new(reader: R, path: &Utf8Path) -> Result<Self, ImportError> {
        let zip = zip::ZipArchive::new(reader).map_err(|source| ImportError::Archive {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { zip })
    }
}

impl ZipSource<std::io::BufReader<std::fs::File>> {
    pub fn open(path: &Utf8Path) -> Result<Self, ImportError> {
        let file = std::fs::File::open(path.as_std_path()).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(std::io::BufReader::new(file), path)
    }
}

impl<R: Read + Seek> ContentSource for ZipSource<R> {
    fn read_bytes(&mut self, path: &Utf8Path) -> Result<Vec<u8>> {
        let p = path
            .as_str()
            .trim_start_matches("./")
            .trim_start_matches('/')
            .to_string();
        let mut f = self
            .zip
            .by_name(&p)
            .with_context(|| format!("File {} not found in zip", p))?;
        let mut raw = Vec::new();
        f.read_to_end(&mut raw)
            .with_context(|| format!("Failed to read {} from zip", p))?;
        Ok(raw)
    }

    fn list_files(&mut self) -> Result<Vec<Utf8PathBuf>> {
        let mut files = Vec::with_capacity(self.zip.len());
        for i in 0..self.zip.len() {
            let name = self.zip.by_index(i)?.name().to_string();
            if !name.ends_with('/') {
                files.push(Utf8PathBuf::from(name));
            }
        }
        Ok(files)
    }
}

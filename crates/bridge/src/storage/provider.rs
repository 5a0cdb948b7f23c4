use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::atomic_io::PartialFile;
use super::error::{AssetReadError, SaveWriteError};

/// Read side of the byte-stream provider, as needed by the core.
pub trait AssetReader: Send + Sync {
    fn exists(&self, path: &str) -> bool;

    fn read_all(&self, path: &str) -> Result<Vec<u8>, AssetReadError>;

    /// Reads `path`, treating any failure as "file does not exist".
    fn read_or_absent(&self, path: &str) -> Option<Vec<u8>> {
        match self.read_all(path) {
            Ok(bytes) => Some(bytes),
            Err(error @ AssetReadError::NotFound { .. }) => {
                debug!(path, error = %error, "file_absent");
                None
            }
            Err(error) => {
                warn!(path, error = %error, "file_read_failed");
                None
            }
        }
    }
}

/// File-system backed storage with a read-only asset namespace and a
/// read-write save namespace.
///
/// Paths starting with `<save_prefix>/` resolve inside the save directory;
/// all other paths resolve inside the asset directory.
#[derive(Debug, Clone)]
pub struct FsByteStore {
    asset_root: PathBuf,
    save_root: PathBuf,
    save_prefix: String,
}

impl FsByteStore {
    pub fn new(asset_root: impl Into<PathBuf>, save_root: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: asset_root.into(),
            save_root: save_root.into(),
            save_prefix: "sav".to_string(),
        }
    }

    pub fn with_save_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.save_prefix = prefix.into();
        self
    }

    pub fn asset_root(&self) -> &Path {
        &self.asset_root
    }

    pub fn save_root(&self) -> &Path {
        &self.save_root
    }

    /// Opens a save file for appending. Bytes are streamed to a partial
    /// file beside it and become visible under `name` only when the stream
    /// is closed.
    pub fn open_for_append(&self, name: &str) -> Result<SaveStream, SaveWriteError> {
        let path = self.save_path(name)?;
        let opened = match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(error) => Err(error),
        }
        .and_then(|existing| {
            let mut file = PartialFile::create(&path)?;
            file.write(&existing)?;
            Ok(file)
        });
        match opened {
            Ok(file) => Ok(SaveStream {
                path,
                file: Some(file),
            }),
            Err(source) => {
                warn!(path = %path.display(), error = %source, "save_open_failed");
                Err(SaveWriteError::Open { path, source })
            }
        }
    }

    pub fn delete(&self, name: &str) -> Result<(), SaveWriteError> {
        let path = self.save_path(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => {
                warn!(path = %path.display(), error = %source, "save_delete_failed");
                Err(SaveWriteError::Delete { path, source })
            }
        }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, AssetReadError> {
        let (root, relative) = match self.strip_save_prefix(path) {
            Some(rest) => (&self.save_root, rest),
            None => (&self.asset_root, path),
        };
        if !is_safe_relative(relative) {
            return Err(AssetReadError::InvalidPath {
                path: path.to_string(),
            });
        }
        Ok(root.join(relative))
    }

    fn save_path(&self, name: &str) -> Result<PathBuf, SaveWriteError> {
        let bare = self.strip_save_prefix(name).unwrap_or(name);
        if bare.contains('/') || !is_safe_relative(bare) {
            return Err(SaveWriteError::InvalidName {
                name: name.to_string(),
            });
        }
        Ok(self.save_root.join(bare))
    }

    fn strip_save_prefix<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.strip_prefix(self.save_prefix.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
    }
}

impl AssetReader for FsByteStore {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path)
            .map(|resolved| resolved.is_file())
            .unwrap_or(false)
    }

    fn read_all(&self, path: &str) -> Result<Vec<u8>, AssetReadError> {
        let resolved = self.resolve(path)?;
        fs::read(&resolved).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                AssetReadError::NotFound { path: resolved }
            } else {
                AssetReadError::Io {
                    path: resolved,
                    source,
                }
            }
        })
    }
}

/// An open save file. Dropping it without [`SaveStream::close`] discards the
/// appended bytes.
#[derive(Debug)]
pub struct SaveStream {
    path: PathBuf,
    file: Option<PartialFile>,
}

impl SaveStream {
    pub fn write_byte(&mut self, byte: u8) -> Result<(), SaveWriteError> {
        self.write_all(&[byte])
    }

    pub fn write_all(&mut self, bytes: &[u8]) -> Result<(), SaveWriteError> {
        let written = match self.file.as_mut() {
            Some(file) => file.write(bytes),
            None => return Ok(()),
        };
        written.map_err(|source| {
            warn!(path = %self.path.display(), error = %source, "save_write_failed");
            SaveWriteError::Write {
                path: self.path.clone(),
                source,
            }
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn close(mut self) -> Result<(), SaveWriteError> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };
        file.commit().map_err(|source| {
            warn!(path = %self.path.display(), error = %source, "save_commit_failed");
            SaveWriteError::Commit {
                path: self.path.clone(),
                source,
            }
        })
    }
}

impl Drop for SaveStream {
    fn drop(&mut self) {
        if self.file.is_some() {
            warn!(path = %self.path.display(), "save_stream_dropped_without_close");
        }
    }
}

fn is_safe_relative(path: &str) -> bool {
    !path.is_empty()
        && !path.starts_with('/')
        && !path.contains('\\')
        && path
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetReadError {
    #[error("invalid storage path {path:?}")]
    InvalidPath { path: String },
    #[error("file not found: {path}")]
    NotFound { path: PathBuf },
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum SaveWriteError {
    #[error("invalid save file name {name:?}")]
    InvalidName { name: String },
    #[error("failed to open save file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write save file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to commit save file {path}: {source}")]
    Commit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to delete save file {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

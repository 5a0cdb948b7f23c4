mod atomic_io;
mod error;
mod provider;

pub use error::{AssetReadError, SaveWriteError};
pub use provider::{AssetReader, FsByteStore, SaveStream};

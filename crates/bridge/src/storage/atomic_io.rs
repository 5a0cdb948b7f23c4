use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// A replacement for `target` being written next to it. Readers observe
/// either the previous file or the complete new one once
/// [`PartialFile::commit`] succeeds; an uncommitted partial file is removed
/// on drop.
#[derive(Debug)]
pub(crate) struct PartialFile {
    target: PathBuf,
    partial: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl PartialFile {
    pub(crate) fn create(target: &Path) -> io::Result<Self> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let partial = partial_path_for(target);
        let file = File::create(&partial)?;
        Ok(Self {
            target: target.to_path_buf(),
            partial,
            writer: Some(BufWriter::new(file)),
        })
    }

    pub(crate) fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.write_all(bytes),
            None => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "partial file already committed",
            )),
        }
    }

    pub(crate) fn commit(mut self) -> io::Result<()> {
        let Some(writer) = self.writer.take() else {
            return Ok(());
        };
        let file = writer.into_inner().map_err(|error| error.into_error())?;
        file.sync_all()?;
        drop(file);
        clear_destination(&self.target)?;
        fs::rename(&self.partial, &self.target)?;
        // Renamed into place; nothing left for drop to clean up.
        self.partial = PathBuf::new();
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        self.writer.take();
        if !self.partial.as_os_str().is_empty() {
            let _ = fs::remove_file(&self.partial);
        }
    }
}

// rename() over an existing file is atomic on unix; on windows the
// destination has to be removed first.
#[cfg(windows)]
fn clear_destination(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(error),
    }
}

#[cfg(not(windows))]
fn clear_destination(_path: &Path) -> io::Result<()> {
    Ok(())
}

fn partial_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("save");
    path.with_file_name(format!(".{file_name}.partial"))
}

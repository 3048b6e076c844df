//! Destination file lifecycle.
//!
//! A document is streamed into `<id>.<ext>.part`, fsynced, and only then renamed to
//! `<id>.<ext>`. The final name therefore only ever appears for a complete transfer,
//! which is what the queue builder and the reconciler rely on.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Buffered temp file for one in-flight download.
#[derive(Debug)]
pub struct PartFile {
    file: BufWriter<File>,
    temp_path: PathBuf,
}

impl PartFile {
    /// Create (or truncate a stale) temp file at `temp_path`.
    pub fn create(temp_path: &Path) -> io::Result<Self> {
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(temp_path)?;
        Ok(PartFile {
            file: BufWriter::new(file),
            temp_path: temp_path.to_path_buf(),
        })
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Flush buffered data and sync it to disk. Call before `finalize`.
    pub fn sync(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.get_ref().sync_all()
    }

    /// Close the temp file and rename it to `final_path`.
    pub fn finalize(self, final_path: &Path) -> io::Result<()> {
        let PartFile { file, temp_path } = self;
        let file = file.into_inner().map_err(|e| e.into_error())?;
        drop(file);
        std::fs::rename(&temp_path, final_path)
    }

    /// Close and delete the temp file. Used on every failure path.
    pub fn discard(self) {
        let PartFile { file, temp_path } = self;
        drop(file);
        if let Err(e) = std::fs::remove_file(&temp_path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!("could not remove {}: {}", temp_path.display(), e);
            }
        }
    }
}

impl Write for PartFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Path for the temp file: appends `.part` to the final path (e.g. `A.pdf` -> `A.pdf.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

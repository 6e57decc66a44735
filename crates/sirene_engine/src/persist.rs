//! Output persistence. A workbook lands under its final name only after
//! every byte is on disk, so an interrupted run never leaves a truncated
//! file where a previous good export stood.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory unusable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Create `dir` if missing and verify files can be created inside it.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(PersistError::OutputDir("path is not a directory".into())),
        Err(_) => fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?,
    }
    // Writability probe; the temp file is removed on drop.
    NamedTempFile::new_in(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Writes payloads into one directory via a staging temp file and a
/// rename.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write `content` to `{dir}/{filename}`, replacing any previous
    /// file of that name, and return the final path.
    pub fn write_bytes(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        // Staged in the target directory so the final rename never
        // crosses a filesystem boundary.
        let mut staging = NamedTempFile::new_in(&self.dir)?;
        staging.write_all(content)?;
        staging.flush()?;
        staging.as_file_mut().sync_all()?;

        let target = self.dir.join(filename);
        // Renaming over an existing file is not portable; clear the
        // slot first.
        if target.exists() {
            fs::remove_file(&target)?;
        }
        staging
            .persist(&target)
            .map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

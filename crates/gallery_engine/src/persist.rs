use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output folder {} is unusable: {reason}", path.display())]
    OutputDir { path: PathBuf, reason: String },
    #[error("{} already exists and is not a file", .0.display())]
    TargetOccupied(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Writes session artifacts (downloaded images, assembled documents).
///
/// Each file is staged as a temp file in the same folder and renamed into
/// place, so a reader never sees a half-written image or document and a
/// failed write leaves nothing behind under the target name.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Stores `content` as `{dir}/{filename}`, replacing an earlier file of
    /// the same name. The folder is created if missing.
    pub fn write(&self, filename: &str, content: impl AsRef<[u8]>) -> Result<PathBuf, PersistError> {
        self.prepare_dir()?;

        let target = self.dir.join(filename);
        if target.exists() && !target.is_file() {
            return Err(PersistError::TargetOccupied(target));
        }

        let mut staged = NamedTempFile::new_in(&self.dir)?;
        staged.write_all(content.as_ref())?;
        staged.flush()?;
        staged.as_file_mut().sync_all()?;
        staged.persist(&target).map_err(|err| PersistError::Io(err.error))?;
        Ok(target)
    }

    fn prepare_dir(&self) -> Result<(), PersistError> {
        let unusable = |reason: String| PersistError::OutputDir {
            path: self.dir.clone(),
            reason,
        };
        match fs::metadata(&self.dir) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(unusable("not a directory".to_string())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                fs::create_dir_all(&self.dir).map_err(|err| unusable(err.to_string()))
            }
            Err(err) => Err(unusable(err.to_string())),
        }
    }
}

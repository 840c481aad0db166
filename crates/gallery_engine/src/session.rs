//! Per-run output directories.
//!
//! Each run gets its own `{base}/{timestamp}` folder. The timestamp has second
//! resolution; if that name is already taken a `-N` suffix is appended so two
//! runs never share a folder.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::progress::ProgressSink;

pub const SESSION_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

const MAX_NAME_ATTEMPTS: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub base_path: PathBuf,
    pub timestamp: String,
    pub session_path: PathBuf,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no base directory was given")]
    MissingBase,
    #[error("base path {0:?} is not a directory")]
    BaseNotADirectory(PathBuf),
    #[error("failed to create session directory {path:?}: {source}")]
    Create { path: PathBuf, source: io::Error },
    #[error("no free session directory name for timestamp {0}")]
    NameExhausted(String),
}

/// Create a fresh session directory directly under `base`.
///
/// A missing base directory is reported as a warning and created on the way.
pub fn create_session(
    base: &Path,
    now: DateTime<Local>,
    sink: &dyn ProgressSink,
) -> Result<Session, SessionError> {
    if base.as_os_str().is_empty() {
        return Err(SessionError::MissingBase);
    }
    if base.exists() && !base.is_dir() {
        return Err(SessionError::BaseNotADirectory(base.to_path_buf()));
    }
    if !base.exists() {
        sink.warn(format!(
            "Base folder {} does not exist; it will be created",
            base.display()
        ));
    }

    let base_path = std::path::absolute(base).unwrap_or_else(|_| base.to_path_buf());
    fs::create_dir_all(&base_path).map_err(|source| SessionError::Create {
        path: base_path.clone(),
        source,
    })?;
    let timestamp = now.format(SESSION_TIMESTAMP_FORMAT).to_string();

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let name = if attempt == 0 {
            timestamp.clone()
        } else {
            format!("{timestamp}-{attempt}")
        };
        let session_path = base_path.join(&name);
        match fs::create_dir(&session_path) {
            Ok(()) => {
                return Ok(Session {
                    base_path,
                    timestamp,
                    session_path,
                })
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(source) => {
                return Err(SessionError::Create {
                    path: session_path,
                    source,
                })
            }
        }
    }

    Err(SessionError::NameExhausted(timestamp))
}

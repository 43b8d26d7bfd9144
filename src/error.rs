use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModError {
    #[error("game folder is not configured or does not exist: {0:?}")]
    InvalidRoot(PathBuf),
    #[error("failed to extract {archive:?}: {reason}")]
    Archive { archive: PathBuf, reason: String },
    #[error("{dest:?} already exists with different contents")]
    Conflict { dest: PathBuf },
    #[error(transparent)]
    Io(#[from] io::Error),
}

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Source directory does not exist: {0}")]
    SourceMissing(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to read EXIF data from {path}: {message}")]
    ExifRead { path: PathBuf, message: String },

    #[error("Path has no file name: {0}")]
    InvalidFileName(PathBuf),

    #[error("Could not find a free file name for {0}")]
    CollisionExhausted(PathBuf),

    #[error("Directory traversal error: {0}")]
    WalkDir(#[from] walkdir::Error),
}

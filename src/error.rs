use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = UploadError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Invalid root directory: {}", .0.display())]
    InvalidRoot(PathBuf),

    #[error("File not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Path {} is not inside root directory {}", path.display(), root.display())]
    PathEscapesRoot { path: PathBuf, root: PathBuf },

    #[error("Invalid artifact name: {0}")]
    InvalidArtifactName(String),

    #[error("Incompatible mode: {0}")]
    IncompatibleMode(String),

    #[error("No files to upload")]
    NoFilesToUpload,

    #[error("Archive failed: {0}")]
    ArchiveFailed(String),

    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    #[error("Unable to parse share url from response: {body}")]
    ShareParseFailed { body: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for UploadError {
    fn from(e: reqwest::Error) -> Self {
        UploadError::TransferFailed(e.to_string())
    }
}

impl From<zip::result::ZipError> for UploadError {
    fn from(e: zip::result::ZipError) -> Self {
        UploadError::ArchiveFailed(e.to_string())
    }
}

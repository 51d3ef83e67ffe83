pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

pub use config::{Credentials, UploadConfig};
pub use error::{Result, UploadError};
pub use models::{CompressionMode, IfNoFilesFound, UploadSpec};
pub use services::uploader::{ArtifactUploader, upload_files};

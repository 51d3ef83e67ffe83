use serde::Serialize;
use std::path::PathBuf;
use std::str::FromStr;

/// Public link share, as understood by the OCS sharing API.
pub const SHARE_TYPE_PUBLIC_LINK: u8 = 3;

/// Read-only permission bit of the OCS sharing API.
pub const PERMISSION_READ: u8 = 1;

/// A validated local file paired with its path inside the artifact namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSpec {
    pub absolute_path: PathBuf,
    /// Always `<artifact name>/<relative path>`, `/` separated.
    pub upload_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionMode {
    #[default]
    Zip,
    None,
}

impl CompressionMode {
    pub fn is_compressed(self) -> bool {
        matches!(self, CompressionMode::Zip)
    }
}

impl FromStr for CompressionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "zip" | "true" | "1" => Ok(CompressionMode::Zip),
            "none" | "false" | "0" => Ok(CompressionMode::None),
            other => Err(format!("unknown compression mode '{}'", other)),
        }
    }
}

/// Body of the share creation request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub path: String,
    pub share_type: u8,
    pub public_upload: String,
    pub permissions: u8,
}

impl ShareRequest {
    /// Public, read-only, non-upload-enabled link share of `path`.
    pub fn public_read_only(path: &str) -> Self {
        Self {
            path: path.to_string(),
            share_type: SHARE_TYPE_PUBLIC_LINK,
            public_upload: "false".to_string(),
            permissions: PERMISSION_READ,
        }
    }
}

/// What to do when a search turns up nothing to upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum IfNoFilesFound {
    #[default]
    Warn,
    Error,
    Ignore,
}

/// Files found by the file finder, plus the directory they are relative to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub files: Vec<PathBuf>,
    pub root_directory: PathBuf,
}

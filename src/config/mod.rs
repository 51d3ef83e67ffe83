use crate::error::{Result, UploadError};
use crate::models::CompressionMode;
use std::env;
use std::path::PathBuf;
use url::Url;

/// Credentials sent as a Basic authorization header on every request
#[derive(Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Configuration for a single upload run
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Base URL of the file storage service, e.g. `https://cloud.example.com`
    pub endpoint: String,

    pub credentials: Credentials,

    /// WebDAV root relative to the endpoint (default: "remote.php/webdav")
    pub dav_path: String,

    /// Share API path relative to the endpoint
    /// (default: "ocs/v2.php/apps/files_sharing/api/v1/shares")
    pub share_api_path: String,

    /// Remote directory holding one sub-directory per session (default: "/artifacts")
    pub remote_root: String,

    /// Local directory for staging sessions (default: system temp dir)
    pub scratch_root: PathBuf,

    /// Zip the artifact before upload (default: zip)
    pub compression: CompressionMode,

    /// Per-request HTTP timeout in seconds (default: 300)
    pub request_timeout_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            credentials: Credentials::default(),
            dav_path: "remote.php/webdav".to_string(),
            share_api_path: "ocs/v2.php/apps/files_sharing/api/v1/shares".to_string(),
            remote_root: "/artifacts".to_string(),
            scratch_root: env::temp_dir(),
            compression: CompressionMode::Zip,
            request_timeout_secs: 300,
        }
    }
}

impl UploadConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            endpoint: env::var("NEXTCLOUD_URL").unwrap_or(default.endpoint),

            credentials: Credentials {
                username: env::var("NEXTCLOUD_USERNAME").unwrap_or_default(),
                password: env::var("NEXTCLOUD_PASSWORD").unwrap_or_default(),
            },

            dav_path: env::var("NEXTCLOUD_DAV_PATH").unwrap_or(default.dav_path),

            share_api_path: env::var("NEXTCLOUD_SHARE_API_PATH")
                .unwrap_or(default.share_api_path),

            remote_root: env::var("ARTIFACT_REMOTE_ROOT").unwrap_or(default.remote_root),

            scratch_root: env::var("ARTIFACT_SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.scratch_root),

            compression: env::var("ARTIFACT_COMPRESSION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.compression),

            request_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.request_timeout_secs),
        }
    }

    /// Checks that the endpoint and credentials are usable
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.endpoint).map_err(|e| {
            UploadError::Config(format!("invalid endpoint '{}': {}", self.endpoint, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UploadError::Config(format!(
                "endpoint must be http(s), got '{}'",
                url.scheme()
            )));
        }

        if self.credentials.username.is_empty() || self.credentials.password.is_empty() {
            return Err(UploadError::Config(
                "username and password are required".to_string(),
            ));
        }

        if !self.remote_root.starts_with('/') {
            return Err(UploadError::Config(format!(
                "remote root must be absolute, got '{}'",
                self.remote_root
            )));
        }

        Ok(())
    }

    /// Joins a path onto the endpoint, collapsing the slashes between them
    pub fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn share_url(&self) -> String {
        self.endpoint_url(&self.share_api_path)
    }
}

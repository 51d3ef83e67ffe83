use crate::error::{Result, UploadError};
use crate::services::archive::PreparedArtifact;
use crate::services::storage::StorageService;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Moves a prepared artifact into its per-session remote directory.
pub struct RemoteTransport {
    storage: Arc<dyn StorageService>,
    remote_root: String,
}

impl RemoteTransport {
    pub fn new(storage: Arc<dyn StorageService>, remote_root: &str) -> Self {
        Self {
            storage,
            remote_root: format!("/{}", remote_root.trim_matches('/')),
        }
    }

    /// `/artifacts/<session-id>`
    pub fn container_path(&self, session_id: &str) -> String {
        format!("{}/{}", self.remote_root.trim_end_matches('/'), session_id)
    }

    /// `/artifacts/<session-id>/<name>[.zip]`
    pub fn remote_file_path(
        &self,
        session_id: &str,
        artifact_name: &str,
        compressed: bool,
    ) -> String {
        let extension = if compressed { ".zip" } else { "" };
        format!(
            "{}/{}{}",
            self.container_path(session_id),
            artifact_name,
            extension
        )
    }

    /// Creates `path` unless the server already has it.
    ///
    /// Not atomic: a concurrent creator is absorbed by the storage layer
    /// treating "already exists" as success.
    pub async fn ensure_directory(&self, path: &str) -> Result<()> {
        info!("📁 Checking remote directory {}", path);
        if self.storage.exists(path).await? {
            debug!("Remote directory {} already exists", path);
            return Ok(());
        }

        info!("📁 Creating remote directory {}", path);
        self.storage.create_directory(path).await
    }

    /// Uploads the artifact and returns its remote path.
    ///
    /// The local archive is released once the attempt is over, whatever its
    /// outcome. Caller-owned files are never removed.
    pub async fn upload(&self, artifact: PreparedArtifact, artifact_name: &str) -> Result<String> {
        let result = self.transfer(&artifact, artifact_name).await;

        if let Err(e) = artifact.release() {
            warn!("⚠️  {}", e);
        }

        result
    }

    async fn transfer(&self, artifact: &PreparedArtifact, artifact_name: &str) -> Result<String> {
        let container = self.container_path(&artifact.session_id);
        self.ensure_directory(&container).await?;

        let remote_path =
            self.remote_file_path(&artifact.session_id, artifact_name, artifact.compressed);

        let file = tokio::fs::File::open(&artifact.path).await.map_err(|e| {
            UploadError::TransferFailed(format!(
                "Failed to open {}: {}",
                artifact.path.display(),
                e
            ))
        })?;
        let size = file
            .metadata()
            .await
            .map_err(|e| {
                UploadError::TransferFailed(format!(
                    "Failed to stat {}: {}",
                    artifact.path.display(),
                    e
                ))
            })?
            .len();

        info!("⬆️  Uploading {} ({} bytes) to {}", artifact.path.display(), size, remote_path);
        self.storage
            .put_stream(&remote_path, Box::new(file), Some(size))
            .await?;

        info!("✅ Upload complete: {}", remote_path);
        Ok(remote_path)
    }
}

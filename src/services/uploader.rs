use crate::config::UploadConfig;
use crate::error::Result;
use crate::infrastructure::{http, storage};
use crate::services::archive::ArchiveBuilder;
use crate::services::share_service::ShareService;
use crate::services::storage::StorageService;
use crate::services::transport::RemoteTransport;
use crate::utils::validation::resolve_upload_specs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Resolve → stage/zip → upload → share, for one artifact.
pub struct ArtifactUploader {
    config: UploadConfig,
    transport: RemoteTransport,
    shares: Arc<dyn ShareService>,
}

impl ArtifactUploader {
    pub fn new(
        config: UploadConfig,
        storage: Arc<dyn StorageService>,
        shares: Arc<dyn ShareService>,
    ) -> Self {
        let transport = RemoteTransport::new(storage, &config.remote_root);
        Self {
            config,
            transport,
            shares,
        }
    }

    /// Uploads `files` (all under `root`) as `artifact_name` and returns the share URL.
    pub async fn upload(
        &self,
        root: &Path,
        artifact_name: &str,
        files: &[PathBuf],
    ) -> Result<String> {
        let specs = resolve_upload_specs(root, artifact_name, files)?;
        info!(
            "🚀 Uploading {} file(s) as artifact '{}'",
            specs.len(),
            artifact_name
        );

        let builder =
            ArchiveBuilder::new(self.config.scratch_root.clone(), self.config.compression);
        let artifact = builder.build(artifact_name, &specs).await?;

        let remote_path = self.transport.upload(artifact, artifact_name).await?;
        let url = self.shares.create_share(&remote_path).await?;

        info!("🎉 Artifact '{}' shared at {}", artifact_name, url);
        Ok(url)
    }
}

/// Uploads files to the configured WebDAV service and returns a public share URL.
pub async fn upload_files(
    config: &UploadConfig,
    root: &Path,
    artifact_name: &str,
    files: &[PathBuf],
) -> Result<String> {
    config.validate()?;

    let client = http::build_client(config)?;
    let storage_service = storage::setup_storage(config, client.clone());
    let share_service = storage::setup_share_service(config, client);

    ArtifactUploader::new(config.clone(), storage_service, share_service)
        .upload(root, artifact_name, files)
        .await
}

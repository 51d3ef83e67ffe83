use crate::error::{Result, UploadError};
use crate::models::{CompressionMode, UploadSpec};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::{FileOptions, ZipWriter};

/// Invocation-scoped scratch area, removed on `close()` or when dropped.
///
/// Layout: `<scratch-root>/<session-id>/artifact-<name>/`. Nothing is created
/// on disk until a file is staged.
#[derive(Debug)]
pub struct StagingSession {
    id: String,
    artifact_name: String,
    session_dir: PathBuf,
    staging_root: PathBuf,
    closed: bool,
}

impl StagingSession {
    pub fn new(scratch_root: &Path, artifact_name: &str) -> Self {
        let id = Uuid::new_v4().to_string();
        let session_dir = scratch_root.join(&id);
        let staging_root = session_dir.join(format!("artifact-{}", artifact_name));

        Self {
            id,
            artifact_name: artifact_name.to_string(),
            session_dir,
            staging_root,
            closed: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn staging_root(&self) -> &Path {
        &self.staging_root
    }

    /// Directory holding the staged copies, named after the artifact.
    pub fn artifact_dir(&self) -> PathBuf {
        self.staging_root.join(&self.artifact_name)
    }

    pub fn archive_path(&self) -> PathBuf {
        self.staging_root.join(format!("{}.zip", self.artifact_name))
    }

    /// Where a file with the given upload path is copied to.
    pub fn staged_path(&self, upload_path: &str) -> PathBuf {
        upload_path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.staging_root.clone(), |path, segment| path.join(segment))
    }

    /// Removes the session directory and everything in it.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        remove_session_dir(&self.session_dir).map_err(|e| {
            UploadError::ArchiveFailed(format!(
                "Failed to remove staging session {}: {}",
                self.session_dir.display(),
                e
            ))
        })
    }
}

impl Drop for StagingSession {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = remove_session_dir(&self.session_dir) {
                warn!(
                    "⚠️  Failed to clean up staging session {}: {}",
                    self.session_dir.display(),
                    e
                );
            }
        }
    }
}

fn remove_session_dir(dir: &Path) -> std::io::Result<()> {
    match std::fs::remove_dir_all(dir) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Local file ready for transport.
#[derive(Debug)]
pub struct PreparedArtifact {
    pub path: PathBuf,
    pub compressed: bool,
    pub session_id: String,
    /// `None` when `path` is a caller-owned raw file.
    session: Option<StagingSession>,
}

impl PreparedArtifact {
    pub fn is_caller_owned(&self) -> bool {
        self.session.is_none()
    }

    /// Deletes the staged copies and archive. Never touches a caller-owned file.
    pub fn release(mut self) -> Result<()> {
        match self.session.take() {
            Some(session) => {
                debug!("🧹 Removing local artifact {}", self.path.display());
                session.close()
            }
            None => Ok(()),
        }
    }
}

pub struct ArchiveBuilder {
    scratch_root: PathBuf,
    compression: CompressionMode,
}

impl ArchiveBuilder {
    pub fn new(scratch_root: PathBuf, compression: CompressionMode) -> Self {
        Self {
            scratch_root,
            compression,
        }
    }

    pub async fn build(
        &self,
        artifact_name: &str,
        specs: &[UploadSpec],
    ) -> Result<PreparedArtifact> {
        // Raw mode takes exactly one file, an empty list included.
        if !self.compression.is_compressed() && specs.len() != 1 {
            return Err(UploadError::IncompatibleMode(format!(
                "uploading without compression requires exactly one file, got {}",
                specs.len()
            )));
        }

        if specs.is_empty() {
            return Err(UploadError::NoFilesToUpload);
        }

        let session = StagingSession::new(&self.scratch_root, artifact_name);

        if !self.compression.is_compressed() {
            info!(
                "📄 Uploading {} without compression",
                specs[0].absolute_path.display()
            );
            return Ok(PreparedArtifact {
                path: specs[0].absolute_path.clone(),
                compressed: false,
                session_id: session.id().to_string(),
                session: None,
            });
        }

        stage_files(&session, specs).await?;

        let source = session.artifact_dir();
        let destination = session.archive_path();
        info!("📦 Zipping {} into {}", source.display(), destination.display());

        let archive = destination.clone();
        let entries = tokio::task::spawn_blocking(move || compress_directory(&source, &archive))
            .await
            .map_err(|e| UploadError::ArchiveFailed(format!("Compression task failed: {}", e)))??;

        info!("✅ Archive ready with {} file(s)", entries);

        Ok(PreparedArtifact {
            path: destination,
            compressed: true,
            session_id: session.id().to_string(),
            session: Some(session),
        })
    }
}

/// Copies every file into the staging area, one task per file.
///
/// Waits for all copies before returning the first failure.
async fn stage_files(session: &StagingSession, specs: &[UploadSpec]) -> Result<()> {
    let mut tasks = JoinSet::new();
    let mut seen = HashSet::new();

    for spec in specs {
        if !seen.insert(spec.upload_path.as_str()) {
            continue;
        }
        let source = spec.absolute_path.clone();
        let destination = session.staged_path(&spec.upload_path);
        tasks.spawn(copy_file(source, destination));
    }

    let mut first_error = None;
    while let Some(joined) = tasks.join_next().await {
        let outcome = joined
            .map_err(|e| UploadError::ArchiveFailed(format!("Copy task failed: {}", e)))
            .and_then(|r| r);

        if let Err(e) = outcome {
            first_error.get_or_insert(e);
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

async fn copy_file(source: PathBuf, destination: PathBuf) -> Result<()> {
    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            UploadError::ArchiveFailed(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }

    let bytes = tokio::fs::copy(&source, &destination).await.map_err(|e| {
        UploadError::ArchiveFailed(format!("Failed to stage {}: {}", source.display(), e))
    })?;

    debug!("Staged {} ({} bytes)", destination.display(), bytes);
    Ok(())
}

/// Zips the contents of `source` into `destination` with maximum Deflate
/// compression. Entry names are relative to `source`.
///
/// Returns the number of file entries. A failed run leaves no file behind.
pub fn compress_directory(source: &Path, destination: &Path) -> Result<usize> {
    let result = write_archive(source, destination);
    if result.is_err() {
        let _ = std::fs::remove_file(destination);
    }
    result
}

fn write_archive(source: &Path, destination: &Path) -> Result<usize> {
    let io_err = |context: &str, path: &Path, e: std::io::Error| {
        UploadError::ArchiveFailed(format!("{} {}: {}", context, path.display(), e))
    };

    let file = File::create(destination).map_err(|e| io_err("Failed to create", destination, e))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));

    let mut entries = 0;
    for entry in WalkDir::new(source).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| UploadError::ArchiveFailed(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| UploadError::ArchiveFailed(e.to_string()))?;

        let name = entry_name(relative);
        if name.is_empty() {
            continue;
        }

        if entry.file_type().is_dir() {
            zip.add_directory(name, options)?;
        } else if entry.file_type().is_file() {
            let size = entry
                .metadata()
                .map_err(|e| UploadError::ArchiveFailed(e.to_string()))?
                .len();
            zip.start_file(name, options.large_file(needs_zip64(size)))?;
            let mut input =
                File::open(entry.path()).map_err(|e| io_err("Failed to open", entry.path(), e))?;
            std::io::copy(&mut input, &mut zip)
                .map_err(|e| io_err("Failed to compress", entry.path(), e))?;
            entries += 1;
        }
    }

    let mut writer = zip.finish()?;
    writer
        .flush()
        .map_err(|e| io_err("Failed to flush", destination, e))?;
    let file = writer
        .into_inner()
        .map_err(|e| io_err("Failed to flush", destination, e.into_error()))?;
    file.sync_all()
        .map_err(|e| io_err("Failed to sync", destination, e))?;

    Ok(entries)
}

/// Entries past the 32-bit size limit must be written with ZIP64 extensions.
fn needs_zip64(size: u64) -> bool {
    size >= u32::MAX as u64
}

fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

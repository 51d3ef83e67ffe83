//! Expands user-supplied search paths into a flat list of files.
//!
//! Runs ahead of the upload pipeline: directories are walked recursively,
//! exclude globs are applied, and the lowest common ancestor of all search
//! paths becomes the artifact root.

use crate::error::{Result, UploadError};
use crate::models::{IfNoFilesFound, SearchResult};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

pub struct FileFinder {
    exclude: Option<GlobSet>,
}

impl FileFinder {
    pub fn new(exclude_patterns: &[String]) -> Result<Self> {
        if exclude_patterns.is_empty() {
            return Ok(Self { exclude: None });
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in exclude_patterns {
            let glob = Glob::new(pattern).map_err(|e| {
                UploadError::Config(format!("invalid exclude pattern '{}': {}", pattern, e))
            })?;
            builder.add(glob);
        }
        let set = builder
            .build()
            .map_err(|e| UploadError::Config(format!("invalid exclude patterns: {}", e)))?;

        Ok(Self { exclude: Some(set) })
    }

    /// Resolves search paths to files.
    ///
    /// Missing search paths are skipped with a warning. Files are returned in
    /// search-path order, directory contents sorted by name, without duplicates.
    pub fn find(&self, search_paths: &[PathBuf]) -> Result<SearchResult> {
        let mut existing = Vec::new();
        let mut anchors = Vec::new();

        for path in search_paths {
            let resolved = match std::fs::canonicalize(path) {
                Ok(p) => p,
                Err(_) => {
                    warn!("⚠️  Search path {} does not exist, skipping", path.display());
                    continue;
                }
            };

            let anchor = if resolved.is_dir() {
                resolved.clone()
            } else {
                resolved
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| resolved.clone())
            };
            anchors.push(anchor);
            existing.push(resolved);
        }

        let root_directory = common_ancestor(&anchors).unwrap_or_default();
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for path in existing {
            if path.is_dir() {
                for entry in WalkDir::new(&path)
                    .follow_links(false)
                    .sort_by_file_name()
                    .into_iter()
                {
                    let entry = match entry {
                        Ok(e) => e,
                        Err(e) => {
                            warn!("⚠️  Skipping unreadable entry: {}", e);
                            continue;
                        }
                    };
                    if entry.file_type().is_file() {
                        self.push_file(entry.into_path(), &root_directory, &mut seen, &mut files);
                    }
                }
            } else {
                self.push_file(path, &root_directory, &mut seen, &mut files);
            }
        }

        Ok(SearchResult {
            files,
            root_directory,
        })
    }

    fn push_file(
        &self,
        path: PathBuf,
        root: &Path,
        seen: &mut HashSet<PathBuf>,
        files: &mut Vec<PathBuf>,
    ) {
        if self.is_excluded(&path, root) {
            tracing::debug!("Excluding {}", path.display());
            return;
        }
        if seen.insert(path.clone()) {
            files.push(path);
        }
    }

    fn is_excluded(&self, path: &Path, root: &Path) -> bool {
        let Some(set) = &self.exclude else {
            return false;
        };
        let relative = path.strip_prefix(root).unwrap_or(path);
        let relative = relative.to_string_lossy().replace('\\', "/");
        set.is_match(relative.as_str())
    }
}

/// Lowest common ancestor, compared component by component.
pub fn common_ancestor(paths: &[PathBuf]) -> Option<PathBuf> {
    let mut iter = paths.iter();
    let first = iter.next()?.clone();

    Some(iter.fold(first, |acc, path| {
        let mut common = PathBuf::new();
        for (a, b) in acc.components().zip(path.components()) {
            if a != b {
                break;
            }
            common.push(a.as_os_str());
        }
        common
    }))
}

/// Applies the empty-search policy. Returns whether the upload should proceed.
pub fn check_files_found(result: &SearchResult, behavior: IfNoFilesFound) -> Result<bool> {
    if !result.files.is_empty() {
        info!(
            "🔎 Found {} file(s) under {}",
            result.files.len(),
            result.root_directory.display()
        );
        return Ok(true);
    }

    match behavior {
        IfNoFilesFound::Warn => {
            warn!("⚠️  No files were found with the provided paths. No artifacts will be uploaded.");
            Ok(false)
        }
        IfNoFilesFound::Error => Err(UploadError::NoFilesToUpload),
        IfNoFilesFound::Ignore => Ok(false),
    }
}

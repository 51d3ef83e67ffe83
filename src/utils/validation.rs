use crate::error::{Result, UploadError};
use crate::models::UploadSpec;
use std::path::{Component, Path, PathBuf};

/// Validates the artifact name used as the first segment of every upload path
/// and as the remote file name.
pub fn validate_artifact_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(UploadError::InvalidArtifactName(
            "Artifact name cannot be empty".to_string(),
        ));
    }

    if name == "." || name == ".." {
        return Err(UploadError::InvalidArtifactName(format!(
            "'{}' is not a valid artifact name",
            name
        )));
    }

    if let Some(c) = name
        .chars()
        .find(|c| c.is_control() || *c == '/' || *c == '\\')
    {
        return Err(UploadError::InvalidArtifactName(format!(
            "'{}' contains forbidden character {:?}",
            name, c
        )));
    }

    Ok(())
}

fn resolve_root(root: &Path) -> Result<PathBuf> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {
            std::fs::canonicalize(root).map_err(|_| UploadError::InvalidRoot(root.to_path_buf()))
        }
        _ => Err(UploadError::InvalidRoot(root.to_path_buf())),
    }
}

/// Joins the components of `relative` under `artifact_name` with `/` separators.
fn to_upload_path(artifact_name: &str, relative: &Path) -> String {
    let mut upload_path = artifact_name.to_string();
    for component in relative.components() {
        if let Component::Normal(segment) = component {
            upload_path.push('/');
            upload_path.push_str(&segment.to_string_lossy());
        }
    }
    upload_path
}

/// Validates candidate files against `root` and maps each one to its path
/// inside the artifact.
///
/// Directories are skipped. Output order follows input order.
pub fn resolve_upload_specs(
    root: &Path,
    artifact_name: &str,
    files: &[PathBuf],
) -> Result<Vec<UploadSpec>> {
    validate_artifact_name(artifact_name)?;
    let resolved_root = resolve_root(root)?;

    let mut specs = Vec::with_capacity(files.len());
    for file in files {
        let meta =
            std::fs::metadata(file).map_err(|_| UploadError::MissingFile(file.clone()))?;

        if meta.is_dir() {
            tracing::debug!("Skipping directory {}", file.display());
            continue;
        }

        let resolved =
            std::fs::canonicalize(file).map_err(|_| UploadError::MissingFile(file.clone()))?;

        // Component-wise, so "/a/b2" never passes for root "/a/b".
        let relative = match resolved.strip_prefix(&resolved_root) {
            Ok(rel) if rel.components().next().is_some() => rel,
            _ => {
                return Err(UploadError::PathEscapesRoot {
                    path: resolved.clone(),
                    root: resolved_root.clone(),
                });
            }
        };

        let upload_path = to_upload_path(artifact_name, relative);
        specs.push(UploadSpec {
            absolute_path: resolved.clone(),
            upload_path,
        });
    }

    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), b"A").unwrap();
        fs::create_dir_all(dir.path().join("dir").join("nested")).unwrap();
        fs::write(dir.path().join("dir").join("f.txt"), b"F").unwrap();
        fs::write(dir.path().join("dir").join("nested").join("g.txt"), b"G").unwrap();
        dir
    }

    #[test]
    fn test_validate_artifact_name() {
        assert!(validate_artifact_name("report").is_ok());
        assert!(validate_artifact_name("build-output v2").is_ok());
        assert!(validate_artifact_name("").is_err());
        assert!(validate_artifact_name("   ").is_err());
        assert!(validate_artifact_name("..").is_err());
        assert!(validate_artifact_name("a/b").is_err());
        assert!(validate_artifact_name("a\\b").is_err());
        assert!(validate_artifact_name("bad\nname").is_err());
    }

    #[test]
    fn test_resolve_maps_relative_paths() {
        let dir = create_tree();
        let root = dir.path();
        let files = vec![
            root.join("dir").join("f.txt"),
            root.join("a.txt"),
            root.join("dir").join("nested").join("g.txt"),
        ];

        let specs = resolve_upload_specs(root, "art", &files).unwrap();
        let paths: Vec<&str> = specs.iter().map(|s| s.upload_path.as_str()).collect();
        assert_eq!(paths, vec!["art/dir/f.txt", "art/a.txt", "art/dir/nested/g.txt"]);

        for spec in &specs {
            assert!(spec.absolute_path.is_absolute());
            assert!(spec.upload_path.starts_with("art/"));
        }
    }

    #[test]
    fn test_resolve_skips_directories() {
        let dir = create_tree();
        let root = dir.path();
        let files = vec![root.join("dir"), root.join("a.txt"), root.join("dir").join("nested")];

        let specs = resolve_upload_specs(root, "art", &files).unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].upload_path, "art/a.txt");
    }

    #[test]
    fn test_resolve_normalizes_dot_segments() {
        let dir = create_tree();
        let root = dir.path();
        let files = vec![root.join("dir").join("..").join("dir").join(".").join("f.txt")];

        let specs = resolve_upload_specs(root, "art", &files).unwrap();
        assert_eq!(specs[0].upload_path, "art/dir/f.txt");
    }

    #[test]
    fn test_resolve_invalid_root() {
        let dir = create_tree();
        let missing = dir.path().join("nope");
        assert!(matches!(
            resolve_upload_specs(&missing, "art", &[]),
            Err(UploadError::InvalidRoot(_))
        ));

        let file_root = dir.path().join("a.txt");
        assert!(matches!(
            resolve_upload_specs(&file_root, "art", &[]),
            Err(UploadError::InvalidRoot(_))
        ));
    }

    #[test]
    fn test_resolve_missing_file() {
        let dir = create_tree();
        let files = vec![dir.path().join("a.txt"), dir.path().join("ghost.txt")];
        assert!(matches!(
            resolve_upload_specs(dir.path(), "art", &files),
            Err(UploadError::MissingFile(p)) if p.ends_with("ghost.txt")
        ));
    }

    #[test]
    fn test_resolve_rejects_files_outside_root() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a").join("b")).unwrap();
        fs::create_dir_all(dir.path().join("a").join("c")).unwrap();
        fs::write(dir.path().join("a").join("c").join("f.txt"), b"x").unwrap();

        let root = dir.path().join("a").join("b");
        let files = vec![dir.path().join("a").join("c").join("f.txt")];
        assert!(matches!(
            resolve_upload_specs(&root, "art", &files),
            Err(UploadError::PathEscapesRoot { .. })
        ));
    }

    #[test]
    fn test_resolve_rejects_sibling_with_shared_prefix() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("root")).unwrap();
        fs::create_dir_all(dir.path().join("root2")).unwrap();
        fs::write(dir.path().join("root2").join("f.txt"), b"x").unwrap();

        let files = vec![dir.path().join("root2").join("f.txt")];
        assert!(matches!(
            resolve_upload_specs(&dir.path().join("root"), "art", &files),
            Err(UploadError::PathEscapesRoot { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_rejects_symlink_escaping_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("root");
        fs::create_dir_all(&root).unwrap();
        fs::write(dir.path().join("secret.txt"), b"x").unwrap();
        std::os::unix::fs::symlink(dir.path().join("secret.txt"), root.join("link.txt")).unwrap();

        let files = vec![root.join("link.txt")];
        assert!(matches!(
            resolve_upload_specs(&root, "art", &files),
            Err(UploadError::PathEscapesRoot { .. })
        ));
    }

    #[test]
    fn test_resolve_rejects_bad_artifact_name() {
        let dir = create_tree();
        assert!(matches!(
            resolve_upload_specs(dir.path(), "a/b", &[dir.path().join("a.txt")]),
            Err(UploadError::InvalidArtifactName(_))
        ));
    }
}

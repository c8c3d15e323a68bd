//! Collision-safe archive moves.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::processor::Archive;

use super::error::DispositionError;

/// Move a processed archive into `done_dir`.
///
/// Keeps the original name when free, otherwise `<stem>_<tag><.ext>`.
pub async fn move_to_done(archive: &Archive, done_dir: &Path) -> Result<PathBuf, DispositionError> {
    let (stem, ext) = split_name(&archive.path)?;
    let original = format!("{}{}", stem, ext);
    let tagged = format!("{}_{}{}", stem, archive.tag(), ext);

    let destination = if !done_dir.join(&original).exists() {
        done_dir.join(original)
    } else {
        free_destination(done_dir, &tagged)
    };

    relocate(&archive.path, &destination).await?;
    Ok(destination)
}

/// Move a failed archive into `failed_dir` as `<stem>_FAILED_<tag><.ext>`.
pub async fn move_to_failed(
    archive: &Archive,
    failed_dir: &Path,
) -> Result<PathBuf, DispositionError> {
    let (stem, ext) = split_name(&archive.path)?;
    let name = sanitize_file_name(&format!("{}_FAILED_{}{}", stem, archive.tag(), ext));

    let destination = free_destination(failed_dir, &name);
    relocate(&archive.path, &destination).await?;
    Ok(destination)
}

/// Keep alphanumerics, `-`, `_`, `.` and space; trim the result.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ' '))
        .collect::<String>()
        .trim()
        .to_string()
}

/// `(stem, ".ext")`, with an empty extension when there is none.
fn split_name(path: &Path) -> Result<(String, String), DispositionError> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DispositionError::InvalidName {
            path: path.to_path_buf(),
        })?;
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    Ok((stem, ext))
}

/// `dir/name`, or `dir/<stem>_<n><.ext>` for the first free `n`.
fn free_destination(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let as_path = Path::new(name);
    let stem = as_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| name.to_string());
    let ext = as_path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1..)
        .map(|n| dir.join(format!("{}_{}{}", stem, n, ext)))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

/// Rename, falling back to copy + remove across filesystems.
///
/// Either the archive ends up at `destination` and is gone from its source,
/// or the source is left untouched.
async fn relocate(source: &Path, destination: &Path) -> Result<(), DispositionError> {
    if !source.exists() {
        return Err(DispositionError::SourceNotFound {
            path: source.to_path_buf(),
        });
    }

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| DispositionError::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }

    if try_atomic_move(source, destination)
        .await
        .map_err(|e| DispositionError::move_failed(source.to_path_buf(), destination.to_path_buf(), e))?
    {
        return Ok(());
    }

    debug!(
        source = %source.display(),
        destination = %destination.display(),
        "Cross-device move, falling back to copy"
    );

    if let Err(e) = fs::copy(source, destination).await {
        let _ = fs::remove_file(destination).await;
        return Err(DispositionError::move_failed(
            source.to_path_buf(),
            destination.to_path_buf(),
            e,
        ));
    }

    if let Err(e) = fs::remove_file(source).await {
        let _ = fs::remove_file(destination).await;
        return Err(DispositionError::move_failed(
            source.to_path_buf(),
            destination.to_path_buf(),
            e,
        ));
    }

    Ok(())
}

/// Attempts to move a file atomically (rename).
async fn try_atomic_move(source: &Path, destination: &Path) -> Result<bool, std::io::Error> {
    match fs::rename(source, destination).await {
        Ok(()) => Ok(true),
        Err(e) => {
            // Cross-filesystem moves fail with EXDEV (18 on Linux)
            if e.kind() == std::io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) {
                Ok(false)
            } else {
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn inbox_archive(temp: &TempDir, name: &str, sequence: usize) -> Archive {
        let inbox = temp.path().join("inbox");
        std::fs::create_dir_all(&inbox).unwrap();
        let path = inbox.join(name);
        std::fs::write(&path, format!("archive {}", sequence)).unwrap();
        Archive::new(path, "20251217_010203", sequence)
    }

    #[tokio::test]
    async fn test_move_to_done_keeps_name() {
        let temp = TempDir::new().unwrap();
        let archive = inbox_archive(&temp, "batch.zip", 1);
        let done = temp.path().join("done/2025");

        let dest = move_to_done(&archive, &done).await.unwrap();
        assert_eq!(dest, done.join("batch.zip"));
        assert!(dest.exists());
        assert!(!archive.path.exists());
    }

    #[tokio::test]
    async fn test_same_named_archives_are_both_retained() {
        let temp = TempDir::new().unwrap();
        let done = temp.path().join("done");

        let first = inbox_archive(&temp, "batch.zip", 1);
        let first_dest = move_to_done(&first, &done).await.unwrap();

        let second = inbox_archive(&temp, "batch.zip", 2);
        let second_dest = move_to_done(&second, &done).await.unwrap();

        assert_ne!(first_dest, second_dest);
        assert_eq!(second_dest, done.join("batch_20251217_010203_002.zip"));
        assert_eq!(std::fs::read_to_string(&first_dest).unwrap(), "archive 1");
        assert_eq!(std::fs::read_to_string(&second_dest).unwrap(), "archive 2");
    }

    #[tokio::test]
    async fn test_tagged_collision_gets_numeric_suffix() {
        let temp = TempDir::new().unwrap();
        let done = temp.path().join("done");
        std::fs::create_dir_all(&done).unwrap();
        std::fs::write(done.join("batch.zip"), "old").unwrap();
        std::fs::write(done.join("batch_20251217_010203_001.zip"), "older").unwrap();

        let archive = inbox_archive(&temp, "batch.zip", 1);
        let dest = move_to_done(&archive, &done).await.unwrap();

        assert_eq!(dest, done.join("batch_20251217_010203_001_1.zip"));
        assert_eq!(std::fs::read_to_string(done.join("batch.zip")).unwrap(), "old");
    }

    #[tokio::test]
    async fn test_move_to_failed_tags_and_sanitizes() {
        let temp = TempDir::new().unwrap();
        let archive = inbox_archive(&temp, "cam#1 (north).zip", 4);
        let failed = temp.path().join("failed/2025");

        let dest = move_to_failed(&archive, &failed).await.unwrap();
        assert_eq!(
            dest.file_name().unwrap(),
            "cam1 north_FAILED_20251217_010203_004.zip"
        );
        assert!(!archive.path.exists());
    }

    #[tokio::test]
    async fn test_missing_source() {
        let temp = TempDir::new().unwrap();
        let archive = Archive::new(temp.path().join("gone.zip"), "b", 1);

        let err = move_to_done(&archive, temp.path()).await.unwrap_err();
        assert!(matches!(err, DispositionError::SourceNotFound { .. }));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("  a/b\\c:d*e?.zip "), "abcde.zip");
        assert_eq!(sanitize_file_name("Lot-7_ok.ZIP"), "Lot-7_ok.ZIP");
    }
}

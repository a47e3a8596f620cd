//! Filesystem helpers for publishing assets.
//!
//! Assets become visible under their final name only once fully written:
//! producers write to a sibling temporary path and then publish it.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::{StorageError, StorageResult};

/// Write `bytes` to `dst` via a temporary sibling file.
pub async fn write_atomic(dst: impl AsRef<Path>, bytes: &[u8]) -> StorageResult<()> {
    let dst = dst.as_ref();
    let tmp = temp_sibling(dst);

    if let Err(e) = fs::write(&tmp, bytes).await {
        discard_file(&tmp).await;
        return Err(StorageError::from(e));
    }
    publish_file(&tmp, dst).await
}

/// Move a finished file into place at `dst`, replacing whatever is there.
///
/// Falls back to copy-then-rename when `src` is on another filesystem (EXDEV).
pub async fn publish_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> StorageResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if let Some(parent) = dst.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            tracing::debug!(
                "Cross-device publish, copying: {} -> {}",
                src.display(),
                dst.display()
            );
            copy_and_delete(src, dst).await
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::not_found(src)),
        Err(e) => Err(StorageError::from(e)),
    }
}

/// Remove a file, ignoring a missing one. Other failures are logged.
pub async fn discard_file(path: impl AsRef<Path>) {
    let path = path.as_ref();
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
    }
}

/// `<name>.tmp` next to `path`.
fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// EXDEV is error code 18 on Linux/macOS.
fn is_cross_device_error(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(18)
}

async fn copy_and_delete(src: &Path, dst: &Path) -> StorageResult<()> {
    let tmp_dst = temp_sibling(dst);

    if let Err(e) = fs::copy(src, &tmp_dst).await {
        discard_file(&tmp_dst).await;
        return Err(StorageError::from(e));
    }

    if let Err(e) = fs::rename(&tmp_dst, dst).await {
        discard_file(&tmp_dst).await;
        return Err(StorageError::from(e));
    }

    discard_file(src).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_atomic_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let dst = dir.path().join("job_image_0.png");

        write_atomic(&dst, b"png").await.unwrap();

        assert_eq!(fs::read(&dst).await.unwrap(), b"png");
        assert!(!dir.path().join("job_image_0.png.tmp").exists());
    }

    #[tokio::test]
    async fn test_publish_replaces_destination() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("job_final.partial.mp4");
        let dst = dir.path().join("job_final.mp4");
        fs::write(&src, b"new").await.unwrap();
        fs::write(&dst, b"old").await.unwrap();

        publish_file(&src, &dst).await.unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read(&dst).await.unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_publish_missing_source() {
        let dir = TempDir::new().unwrap();
        let err = publish_file(dir.path().join("nope"), dir.path().join("dst"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_discard_missing_file_is_noop() {
        let dir = TempDir::new().unwrap();
        discard_file(dir.path().join("absent")).await;
    }

    #[test]
    fn test_is_cross_device_error() {
        assert!(is_cross_device_error(&std::io::Error::from_raw_os_error(18)));
        assert!(!is_cross_device_error(&std::io::Error::from_raw_os_error(2)));
    }
}

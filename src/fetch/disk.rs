use crate::error::Result;
use std::path::Path;

const MB: u64 = 1_024 * 1_024;

/// Check that `dir` can hold `required_bytes` plus `headroom_bytes`
#[cfg(unix)]
pub fn ensure_free_space(dir: &Path, required_bytes: u64, headroom_bytes: u64) -> Result<()> {
    use crate::error::FetchError;

    // Get filesystem stats for the destination directory
    let stats = nix::sys::statvfs::statvfs(dir).map_err(|e| {
        FetchError::Io(std::io::Error::other(format!(
            "Failed to check disk space at {}: {e}",
            dir.display()
        )))
    })?;

    #[allow(clippy::useless_conversion)]
    let available_bytes = u64::from(stats.blocks_available()) * u64::from(stats.fragment_size());
    let required_with_headroom = required_bytes.saturating_add(headroom_bytes);

    if available_bytes < required_with_headroom {
        return Err(FetchError::InsufficientSpace {
            required_mb: required_with_headroom.div_ceil(MB),
            available_mb: available_bytes / MB,
        });
    }

    Ok(())
}

#[cfg(not(unix))]
pub fn ensure_free_space(_dir: &Path, _required_bytes: u64, _headroom_bytes: u64) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use tempfile::TempDir;

    #[test]
    fn test_small_requirement_fits() {
        let temp_dir = TempDir::new().unwrap();
        assert!(ensure_free_space(temp_dir.path(), 1024, 0).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_impossible_requirement_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = ensure_free_space(temp_dir.path(), u64::MAX / 2, u64::MAX / 2);
        assert!(matches!(result, Err(FetchError::InsufficientSpace { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_missing_directory_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = ensure_free_space(&temp_dir.path().join("missing"), 1, 0);
        assert!(matches!(result, Err(FetchError::Io(_))));
    }
}

//! Reading and atomically writing the secret file.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::warn;
use zeroize::Zeroizing;

use super::record::PersistedRecord;
use super::SecretsError;

/// Read the record at `path`.
///
/// Returns `Ok(None)` when the file does not exist.
///
/// # Errors
///
/// Returns [`SecretsError::Io`] if the file exists but cannot be read, and
/// [`SecretsError::Corrupt`] if it is not a valid JSON record.
pub(super) fn read(path: &Path) -> Result<Option<PersistedRecord>, SecretsError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => Zeroizing::new(raw),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let record = serde_json::from_str(&raw)
        .map_err(|e| SecretsError::Corrupt(format!("invalid JSON: {e}")))?;
    Ok(Some(record))
}

/// Write `record` to `path` via a sibling temp file and rename.
///
/// Missing parent directories are created. The temp file is restricted to
/// owner read/write before it replaces the old record, so the final file is
/// never readable by other users.
///
/// # Errors
///
/// Returns [`SecretsError::Io`] on any filesystem failure other than setting
/// permissions, which is only logged.
pub(super) fn write(path: &Path, record: &PersistedRecord) -> Result<(), SecretsError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let json = Zeroizing::new(serde_json::to_vec_pretty(record)?);
    let tmp_path = temp_path(path);

    let result = write_and_rename(&tmp_path, path, &json);
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result.map_err(SecretsError::from)
}

fn write_and_rename(tmp_path: &Path, path: &Path, bytes: &[u8]) -> io::Result<()> {
    // A leftover temp file keeps its old mode; start from a fresh inode.
    match fs::remove_file(tmp_path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    {
        let mut file = open_owner_only(tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    restrict_permissions(tmp_path);
    fs::rename(tmp_path, path)
}

/// `.<name>.tmp` in the same directory, so the rename stays on one filesystem.
fn temp_path(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new("."));
    parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ))
}

#[cfg(unix)]
fn open_owner_only(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_owner_only(path: &Path) -> io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

/// Set mode `0600`. Some filesystems refuse; that is logged, not fatal.
#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        warn!(path = %path.display(), error = %e, "could not restrict secret file permissions");
    }
}

#[cfg(not(unix))]
fn restrict_permissions(path: &Path) {
    warn!(path = %path.display(), "owner-only permissions are not supported on this platform");
}

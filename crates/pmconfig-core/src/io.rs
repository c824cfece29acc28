use crate::error::{Result, WriteError, WriteStage};
use crate::paths;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// Prevents partial writes from corrupting config files.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    write_staged(path, data)?;
    Ok(())
}

fn write_staged(path: &Path, data: &[u8]) -> std::result::Result<(), WriteError> {
    let temp_err = |e: std::io::Error| WriteError::new(path, WriteStage::TempWrite, e);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(temp_err)?;
    }
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(temp_err)?;
    tmp.write_all(data).map_err(temp_err)?;
    tmp.as_file().sync_all().map_err(temp_err)?;
    tmp.persist(path)
        .map_err(|e| WriteError::new(path, WriteStage::Rename, e.error))?;
    Ok(())
}

/// Copy the current content of `path` to its `.bak` sibling.
///
/// The backup itself is written atomically, so a crash mid-backup never
/// leaves a truncated `.bak` behind.
pub fn write_backup(path: &Path) -> Result<PathBuf> {
    let backup = paths::backup_path(path);
    let data = std::fs::read(path).map_err(|e| WriteError::new(path, WriteStage::Backup, e))?;
    write_staged(&backup, &data).map_err(|e| WriteError {
        path: path.to_path_buf(),
        stage: WriteStage::Backup,
        original_preserved: true,
        source: e.source,
    })?;
    Ok(backup)
}

/// Create a directory and all parents, idempotent.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Write a file only if it does not already exist. Returns true if written.
pub fn write_if_missing(path: &Path, data: &[u8]) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    atomic_write(path, data)?;
    Ok(true)
}

/// Write `data` unless the file already holds exactly those bytes.
/// Returns true if the file was (re)written.
pub fn write_if_changed(path: &Path, data: &[u8]) -> Result<bool> {
    match std::fs::read(path) {
        Ok(existing) if existing == data => return Ok(false),
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    atomic_write(path, data)?;
    Ok(true)
}

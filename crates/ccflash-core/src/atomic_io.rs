use std::fs::{OpenOptions, Permissions};
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};

fn temp_suffix_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

/// Writes bytes using a temp file + rename so the firmware build never observes
/// a half-written settings document.
///
/// An existing destination keeps its identity: symlinks are followed so the
/// link survives, and the file's permissions are applied to the temp file
/// before any content lands in it.
pub fn write_bytes_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if path.as_os_str().is_empty() {
        bail!("destination path cannot be empty");
    }
    let target = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if target.is_dir() {
        bail!("destination path '{}' is a directory", path.display());
    }
    let existing_permissions = std::fs::metadata(&target)
        .ok()
        .map(|metadata| metadata.permissions());

    let parent_dir = target
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent_dir)
        .with_context(|| format!("failed to create {}", parent_dir.display()))?;

    let temp_name = format!(
        ".{}.tmp-{}-{}",
        target
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("settings"),
        std::process::id(),
        temp_suffix_ms()
    );
    let temp_path = parent_dir.join(temp_name);
    let written = write_temp_file(&temp_path, content, existing_permissions)
        .and_then(|()| {
            std::fs::rename(&temp_path, &target).with_context(|| {
                format!(
                    "failed to rename temporary file {} to {}",
                    temp_path.display(),
                    target.display()
                )
            })
        });
    if written.is_err() {
        let _ = std::fs::remove_file(&temp_path);
    }
    written
}

fn write_temp_file(
    temp_path: &Path,
    content: &[u8],
    permissions: Option<Permissions>,
) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(temp_path)
        .with_context(|| format!("failed to create temporary file {}", temp_path.display()))?;
    if let Some(permissions) = permissions {
        file.set_permissions(permissions).with_context(|| {
            format!(
                "failed to copy permissions onto temporary file {}",
                temp_path.display()
            )
        })?;
    }
    file.write_all(content)
        .with_context(|| format!("failed to write temporary file {}", temp_path.display()))?;
    Ok(())
}

/// Text convenience wrapper over [`write_bytes_atomic`].
pub fn write_text_atomic(path: &Path, content: &str) -> Result<()> {
    write_bytes_atomic(path, content.as_bytes())
}

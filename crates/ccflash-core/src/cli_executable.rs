//! Executable discovery on the host search path.
//!
//! The orchestrator resolves `npm` and the PlatformIO CLI up front so a missing
//! tool is reported with a remediation hint instead of a spawn failure deep
//! inside the run.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

fn is_executable_file(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

#[cfg(windows)]
fn candidate_names(name: &str) -> Vec<OsString> {
    if Path::new(name).extension().is_some() {
        return vec![OsString::from(name)];
    }
    let pathext = std::env::var("PATHEXT").unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".to_string());
    let mut names = vec![OsString::from(name)];
    names.extend(
        pathext
            .split(';')
            .map(str::trim)
            .filter(|ext| !ext.is_empty())
            .map(|ext| OsString::from(format!("{name}{}", ext.to_ascii_lowercase()))),
    );
    names
}

#[cfg(not(windows))]
fn candidate_names(name: &str) -> Vec<OsString> {
    vec![OsString::from(name)]
}

/// Resolves `executable` to a runnable file, the way a shell would.
///
/// Names containing a path separator are checked as-is; bare names are
/// searched for in each `PATH` entry in order.
pub fn resolve_executable(executable: &str) -> Option<PathBuf> {
    let trimmed = executable.trim();
    if trimmed.is_empty() {
        return None;
    }

    let candidate = Path::new(trimmed);
    if candidate.is_absolute() || trimmed.contains(std::path::MAIN_SEPARATOR) {
        return is_executable_file(candidate).then(|| candidate.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    let names = candidate_names(trimmed);
    std::env::split_paths(&path_var)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
        .find(|path| is_executable_file(path))
}

/// Resolves the first of `executables` found on `PATH`, in the given order.
pub fn resolve_first_executable(executables: &[&str]) -> Option<PathBuf> {
    executables
        .iter()
        .find_map(|executable| resolve_executable(executable))
}

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use ccflash_core::{write_bytes_atomic, write_text_atomic};
use serde_json::{Map, Value};

use crate::{SettingsPaths, SECRET_KEYS};

/// What the settings file looked like before secrets were merged into it.
#[derive(Debug, Clone, PartialEq, Eq)]
enum OriginalSettings {
    Missing,
    Captured(Vec<u8>),
    Unreadable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The captured original bytes were written back.
    Rewritten,
    /// No settings file existed before the merge; the merged file was removed.
    Removed,
    /// The original could not be read, so there was nothing to restore.
    Skipped,
}

/// Guard over a settings file that currently holds merged secrets.
///
/// Call [`SettingsOverlay::restore`] once the filesystem image has been
/// uploaded. Dropping the guard without restoring puts the original back on a
/// best-effort basis.
///
/// `Drop` only runs when the process unwinds or returns normally. A SIGINT or
/// SIGKILL while a child is running (Ctrl-C during a hung upload) terminates
/// the orchestrator without restoring, leaving the merged secrets on disk.
#[derive(Debug)]
pub struct SettingsOverlay {
    settings_path: PathBuf,
    original: OriginalSettings,
    applied_keys: Vec<&'static str>,
    restored: bool,
}

impl SettingsOverlay {
    /// Allow-listed keys the secrets document actually supplied.
    pub fn applied_keys(&self) -> &[&'static str] {
        &self.applied_keys
    }

    pub fn restore(mut self) -> Result<RestoreOutcome> {
        self.restored = true;
        restore_original(&self.settings_path, &self.original)
    }
}

impl Drop for SettingsOverlay {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        self.restored = true;
        if let Err(error) = restore_original(&self.settings_path, &self.original) {
            tracing::warn!(
                settings = %self.settings_path.display(),
                "failed to restore original settings: {error:#}"
            );
        }
    }
}

fn restore_original(settings_path: &Path, original: &OriginalSettings) -> Result<RestoreOutcome> {
    match original {
        OriginalSettings::Captured(bytes) => {
            write_bytes_atomic(settings_path, bytes).with_context(|| {
                format!(
                    "failed to restore original settings {}",
                    settings_path.display()
                )
            })?;
            Ok(RestoreOutcome::Rewritten)
        }
        OriginalSettings::Missing => match std::fs::remove_file(settings_path) {
            Ok(()) => Ok(RestoreOutcome::Removed),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(RestoreOutcome::Removed),
            Err(error) => Err(error).with_context(|| {
                format!(
                    "failed to remove merged settings {}",
                    settings_path.display()
                )
            }),
        },
        OriginalSettings::Unreadable => {
            tracing::warn!(
                settings = %settings_path.display(),
                "original settings could not be read; leaving merged settings in place"
            );
            Ok(RestoreOutcome::Skipped)
        }
    }
}

/// Parses a settings-style document into a JSON object.
///
/// Blank input is an empty object; any other non-object value is an error.
pub fn parse_settings_object(raw: &[u8]) -> Result<Map<String, Value>> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(raw).context("invalid JSON")? {
        Value::Object(object) => Ok(object),
        other => bail!("expected a JSON object, found {}", json_kind(&other)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn parse_or_warn(raw: &[u8], path: &Path) -> Map<String, Value> {
    parse_settings_object(raw).unwrap_or_else(|error| {
        tracing::warn!("failed to parse {}: {error:#}", path.display());
        Map::new()
    })
}

fn capture_settings(path: &Path) -> (OriginalSettings, Map<String, Value>) {
    match std::fs::read(path) {
        Ok(bytes) => {
            let object = parse_or_warn(&bytes, path);
            (OriginalSettings::Captured(bytes), object)
        }
        Err(error) if error.kind() == ErrorKind::NotFound => {
            tracing::warn!("failed to read base settings {}: {error}", path.display());
            (OriginalSettings::Missing, Map::new())
        }
        Err(error) => {
            tracing::warn!("failed to read base settings {}: {error}", path.display());
            (OriginalSettings::Unreadable, Map::new())
        }
    }
}

fn load_secrets(path: &Path) -> Map<String, Value> {
    match std::fs::read(path) {
        Ok(bytes) => parse_or_warn(&bytes, path),
        Err(error) => {
            tracing::warn!("failed to read secrets {}: {error}", path.display());
            Map::new()
        }
    }
}

/// Copies allow-listed keys from `secrets` into `settings`.
///
/// Returns the keys that were applied. Existing keys keep their position;
/// new ones are appended.
pub fn overlay_secret_keys(
    settings: &mut Map<String, Value>,
    secrets: &Map<String, Value>,
) -> Vec<&'static str> {
    let mut applied = Vec::new();
    for key in SECRET_KEYS {
        if let Some(value) = secrets.get(key) {
            settings.insert(key.to_string(), value.clone());
            applied.push(key);
        }
    }
    applied
}

/// Merges the secrets document into the settings document when one exists.
///
/// Returns `None` when there is no secrets file. Read and parse problems with
/// either document are logged and treated as empty objects; only the write of
/// the merged document is fatal.
pub fn merge_secrets_if_present(paths: &SettingsPaths) -> Result<Option<SettingsOverlay>> {
    if !paths.secrets.exists() {
        return Ok(None);
    }

    let (original, mut settings) = capture_settings(&paths.settings);
    let secrets = load_secrets(&paths.secrets);
    let applied_keys = overlay_secret_keys(&mut settings, &secrets);

    let mut rendered = serde_json::to_string_pretty(&Value::Object(settings))
        .context("failed to render merged settings")?;
    rendered.push('\n');

    // The guard exists before the write so a partial failure still restores.
    let overlay = SettingsOverlay {
        settings_path: paths.settings.clone(),
        original,
        applied_keys,
        restored: false,
    };
    write_text_atomic(&paths.settings, &rendered).with_context(|| {
        format!(
            "failed to write merged settings {}",
            paths.settings.display()
        )
    })?;
    tracing::debug!(
        settings = %paths.settings.display(),
        keys = ?overlay.applied_keys,
        "secrets merged into settings"
    );
    Ok(Some(overlay))
}

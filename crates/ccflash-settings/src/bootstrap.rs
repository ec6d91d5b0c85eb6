use anyhow::{Context, Result};

use crate::SettingsPaths;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The settings document was copied from the template.
    Created,
    /// A settings document already existed and was left alone.
    AlreadyPresent,
    /// Neither document exists; nothing to copy.
    TemplateMissing,
}

/// Copies the template over a missing settings document, byte-for-byte.
pub fn bootstrap_settings(paths: &SettingsPaths) -> Result<BootstrapOutcome> {
    if paths.settings.exists() {
        return Ok(BootstrapOutcome::AlreadyPresent);
    }
    if !paths.template.exists() {
        return Ok(BootstrapOutcome::TemplateMissing);
    }
    std::fs::copy(&paths.template, &paths.settings).with_context(|| {
        format!(
            "failed to copy settings template {} to {}",
            paths.template.display(),
            paths.settings.display()
        )
    })?;
    tracing::debug!(
        template = %paths.template.display(),
        settings = %paths.settings.display(),
        "settings document created from template"
    );
    Ok(BootstrapOutcome::Created)
}

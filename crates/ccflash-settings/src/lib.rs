//! Settings-document bookkeeping for the filesystem image.
//!
//! The committed `user_settings.json` carries blank credentials. Before the
//! filesystem image is uploaded, local secrets are overlaid onto it and the
//! original bytes are put back afterwards, so the working tree never keeps a
//! copy of the SSID, password or printer address.

pub mod bootstrap;
pub mod secrets_overlay;
pub mod settings_paths;

pub use bootstrap::{bootstrap_settings, BootstrapOutcome};
pub use secrets_overlay::{
    merge_secrets_if_present, overlay_secret_keys, parse_settings_object, RestoreOutcome,
    SettingsOverlay,
};
pub use settings_paths::{
    SettingsPaths, SECRET_KEYS, SETTINGS_FILE_NAME, SETTINGS_SECRETS_FILE_NAME,
    SETTINGS_TEMPLATE_FILE_NAME,
};

use std::path::{Path, PathBuf};

pub const SETTINGS_FILE_NAME: &str = "user_settings.json";
pub const SETTINGS_TEMPLATE_FILE_NAME: &str = "user_settings.template.json";
pub const SETTINGS_SECRETS_FILE_NAME: &str = "user_settings.secrets.json";

/// Settings keys a secrets document is allowed to overlay, in append order.
pub const SECRET_KEYS: [&str; 3] = ["ssid", "passwd", "elegooip"];

/// Locations of the three settings documents inside the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsPaths {
    pub settings: PathBuf,
    pub template: PathBuf,
    pub secrets: PathBuf,
}

impl SettingsPaths {
    pub fn from_data_dir(data_dir: &Path) -> Self {
        Self {
            settings: data_dir.join(SETTINGS_FILE_NAME),
            template: data_dir.join(SETTINGS_TEMPLATE_FILE_NAME),
            secrets: data_dir.join(SETTINGS_SECRETS_FILE_NAME),
        }
    }
}

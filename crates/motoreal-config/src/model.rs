use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ConfigError;

pub const DEFAULT_DEBOUNCE_SECS: u64 = 5;
pub const DEFAULT_DRIVE_FILE_NAME: &str = "motoristareal_backup.json";

/// Keys accepted by [`Config::set_value`].
pub const SETTABLE_KEYS: &[&str] = &[
    "currency",
    "locale",
    "color",
    "worker.url",
    "worker.token",
    "drive.token",
    "drive.file",
    "sync.debounce",
];

/// Stores user-configurable CLI preferences and sync credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub locale: String,
    pub currency: String,
    #[serde(default = "Config::default_ui_color_enabled")]
    pub ui_color_enabled: bool,
    /// Optional override for the collection directory. Defaults to `<home>/data`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_vehicle: Option<Uuid>,
    #[serde(default)]
    pub sync: SyncSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "pt-BR".into(),
            currency: "BRL".into(),
            ui_color_enabled: Self::default_ui_color_enabled(),
            data_dir: None,
            active_vehicle: None,
            sync: SyncSettings::default(),
        }
    }
}

impl Config {
    pub fn default_ui_color_enabled() -> bool {
        true
    }

    pub fn resolve_data_dir(&self, home: &Path) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| home.join("data"))
    }

    /// Applies a `config set <key> <value>` update.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "currency" => self.currency = non_empty(key, value)?.to_ascii_uppercase(),
            "locale" => self.locale = non_empty(key, value)?.to_string(),
            "color" => self.ui_color_enabled = parse_flag(value)?,
            "worker.url" => {
                self.sync.worker_mut().url = value.trim_end_matches('/').to_string();
            }
            "worker.token" => self.sync.worker_mut().token = value.to_string(),
            "drive.token" => self.sync.drive_mut().access_token = value.to_string(),
            "drive.file" => self.sync.drive_mut().file_name = non_empty(key, value)?.to_string(),
            "sync.debounce" => {
                self.sync.debounce_secs = value.parse().map_err(|_| {
                    ConfigError::Invalid(format!("sync.debounce expects whole seconds, got `{value}`"))
                })?;
            }
            other => {
                return Err(ConfigError::Invalid(format!(
                    "unknown key `{other}` (expected one of: {})",
                    SETTABLE_KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    #[serde(default = "SyncSettings::default_debounce_secs")]
    pub debounce_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker: Option<WorkerSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive: Option<DriveSettings>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            debounce_secs: DEFAULT_DEBOUNCE_SECS,
            worker: None,
            drive: None,
        }
    }
}

impl SyncSettings {
    pub fn default_debounce_secs() -> u64 {
        DEFAULT_DEBOUNCE_SECS
    }

    /// Worker settings, only when both url and token are present.
    pub fn configured_worker(&self) -> Option<&WorkerSettings> {
        self.worker.as_ref().filter(|worker| worker.is_configured())
    }

    /// Drive settings, only when an access token is present.
    pub fn configured_drive(&self) -> Option<&DriveSettings> {
        self.drive.as_ref().filter(|drive| drive.is_configured())
    }

    fn worker_mut(&mut self) -> &mut WorkerSettings {
        self.worker.get_or_insert_with(WorkerSettings::default)
    }

    fn drive_mut(&mut self) -> &mut DriveSettings {
        self.drive.get_or_insert_with(DriveSettings::default)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerSettings {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub token: String,
}

impl WorkerSettings {
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty() && !self.token.trim().is_empty()
    }

    /// Endpoint without a trailing slash.
    pub fn endpoint(&self) -> &str {
        self.url.trim().trim_end_matches('/')
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveSettings {
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "DriveSettings::default_file_name")]
    pub file_name: String,
}

impl Default for DriveSettings {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            file_name: Self::default_file_name(),
        }
    }
}

impl DriveSettings {
    pub fn default_file_name() -> String {
        DEFAULT_DRIVE_FILE_NAME.into()
    }

    pub fn is_configured(&self) -> bool {
        !self.access_token.trim().is_empty()
    }
}

fn non_empty<'a>(key: &str, value: &'a str) -> Result<&'a str, ConfigError> {
    if value.is_empty() {
        Err(ConfigError::Invalid(format!("{key} cannot be empty")))
    } else {
        Ok(value)
    }
}

fn parse_flag(value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(ConfigError::Invalid(format!(
            "expected on/off, got `{other}`"
        ))),
    }
}

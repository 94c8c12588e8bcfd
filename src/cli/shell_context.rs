use std::{path::PathBuf, sync::Arc};

use dialoguer::theme::ColorfulTheme;

use motoreal_config::{Config, ConfigManager};
use motoreal_core::{Clock, DataRepository};
use motoreal_storage_json::SnapshotBackups;

use super::registry::CommandRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub repository: DataRepository,
    pub backups: SnapshotBackups,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub home: PathBuf,
    pub clock: Arc<dyn Clock>,
    pub theme: ColorfulTheme,
    pub last_command: Option<String>,
    pub running: bool,
}


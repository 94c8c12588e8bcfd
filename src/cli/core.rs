//! Core CLI loop, dispatch, and shell context helpers.

use std::{io, path::PathBuf, sync::Arc, time::Duration};

use chrono::NaiveDate;
use dialoguer::theme::ColorfulTheme;
use strsim::levenshtein;
use thiserror::Error;
use uuid::Uuid;

use motoreal_cloud::backend_from_settings;
use motoreal_config::{default_home, ConfigError, ConfigManager};
use motoreal_core::{sync::SyncHandle, Clock, CoreError, DataRepository};
use motoreal_domain::Vehicle;
use motoreal_storage_json::{BackupInfo, JsonFileStore, SnapshotBackups, StoragePaths};

pub use crate::errors::CliError;

use super::commands;
use super::formatters::CliFormatters;
use super::io as cli_io;
use super::output::{self, OutputPreferences};
use super::registry::{CommandEntry, CommandRegistry};
pub use super::shell_context::{CliMode, ShellContext};
use super::system_clock::SystemClock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("No active vehicle. Use `vehicle add` first.")]
    NoActiveVehicle,
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl ShellContext {
    /// Opens the data home named by `DRIVER_LEDGER_HOME` (or `~/.driver_ledger`).
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::open(mode, default_home(), Arc::new(SystemClock))
    }

    pub fn open(mode: CliMode, home: PathBuf, clock: Arc<dyn Clock>) -> Result<Self, CliError> {
        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        let config_manager = ConfigManager::with_base_dir(home.clone())?;
        let config = config_manager.load()?;
        output::set_preferences(OutputPreferences {
            color_enabled: config.ui_color_enabled,
        });

        let paths = StoragePaths::under(&home);
        let store = JsonFileStore::new(config.resolve_data_dir(&home))?;
        let repository = DataRepository::open(Box::new(store))?;
        let backups = SnapshotBackups::new(paths.backup_root)?;

        let mut context = ShellContext {
            mode,
            registry,
            repository,
            backups,
            config_manager,
            config,
            home,
            clock,
            theme: ColorfulTheme::default(),
            last_command: None,
            running: true,
        };
        context.connect_sync();
        tracing::info!(home = %context.home.display(), ?mode, "shell ready");
        Ok(context)
    }

    /// (Re)attaches the cloud mirror described by the current sync settings.
    ///
    /// Any previous handle is dropped first, which flushes its pending upload.
    pub(crate) fn connect_sync(&mut self) {
        drop(self.repository.detach_sync());
        let backend = match backend_from_settings(&self.config.sync) {
            Ok(Some(backend)) => backend,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(error = %err, "cloud backend unavailable");
                return;
            }
        };
        let delay = Duration::from_secs(self.config.sync.debounce_secs);
        match SyncHandle::spawn(backend, delay) {
            Ok(handle) => self.repository.attach_sync(handle),
            Err(err) => tracing::warn!(error = %err, "failed to start sync worker"),
        }
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    #[cfg(test)]
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        crate::cli::shell::handle_line(self, line)
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let needle = input.to_ascii_lowercase();
        let best = self
            .registry
            .names()
            .map(|name| (levenshtein(name, &needle), name))
            .min_by_key(|(distance, _)| *distance);

        if let Some((distance, name)) = best {
            if distance <= 3 {
                cli_io::print_info(format!("Suggestion: `{}`?", name));
            }
        }
    }

    pub(crate) fn confirm_exit(&self) -> bool {
        if self.mode == CliMode::Script {
            return true;
        }
        cli_io::confirm_action(&self.theme, "Exit shell?", true).unwrap_or(true)
    }

    /// Asks before a destructive action; script mode needs the explicit `--yes` flag instead.
    pub(crate) fn confirm_destructive(&self, prompt: &str, assumed_yes: bool) -> Result<bool, CommandError> {
        if assumed_yes {
            return Ok(true);
        }
        match self.mode {
            CliMode::Script => Err(CommandError::InvalidArguments(
                "this command needs `--yes` in script mode".into(),
            )),
            CliMode::Interactive => cli_io::confirm_action(&self.theme, prompt, false),
        }
    }

    pub(crate) fn report_error(&self, err: CommandError) {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                cli_io::print_error(&message);
                cli_io::print_hint("Use `help <command>` for usage details.");
            }
            CommandError::NoActiveVehicle => {
                cli_io::print_error(CommandError::NoActiveVehicle);
                cli_io::print_hint(
                    "Try `vehicle add \"Onix 1.0\" ABC1D23 rented rent=550 cycle=weekly`.",
                );
            }
            other => {
                tracing::debug!(command = ?self.last_command, error = %other, "command failed");
                cli_io::print_error(other);
            }
        }
    }

    pub(crate) fn prompt(&self) -> String {
        match self.active_vehicle() {
            Some(vehicle) => format!("driver-ledger[{}]> ", vehicle.plate),
            None => "driver-ledger> ".to_string(),
        }
    }

    pub(crate) fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub(crate) fn formatters(&self) -> CliFormatters {
        CliFormatters::from_config(&self.config)
    }

    pub(crate) fn money(&self, amount: f64) -> String {
        self.formatters().money(amount)
    }

    /// The remembered vehicle when it is still active, else the first active vehicle.
    pub(crate) fn active_vehicle(&self) -> Option<&Vehicle> {
        let snapshot = self.repository.snapshot();
        self.config
            .active_vehicle
            .and_then(|id| snapshot.vehicle(id))
            .filter(|vehicle| vehicle.is_active())
            .or_else(|| snapshot.active_vehicles().next())
    }

    pub(crate) fn require_vehicle(&self) -> Result<&Vehicle, CommandError> {
        self.active_vehicle().ok_or(CommandError::NoActiveVehicle)
    }

    pub(crate) fn set_active_vehicle(&mut self, id: Option<Uuid>) -> CommandResult {
        if self.config.active_vehicle == id {
            return Ok(());
        }
        self.config.active_vehicle = id;
        self.persist_config()
    }

    pub(crate) fn persist_config(&self) -> CommandResult {
        self.config_manager.save(&self.config)?;
        Ok(())
    }

    /// Saves the current snapshot before it gets replaced.
    pub(crate) fn safety_backup(&self, note: &str) -> Result<BackupInfo, CommandError> {
        let info = self
            .backups
            .create(self.repository.snapshot(), Some(note))?;
        cli_io::print_info(format!("Backup `{}` saved before continuing.", info.id));
        Ok(info)
    }
}

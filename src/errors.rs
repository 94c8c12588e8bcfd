use thiserror::Error;

use motoreal_config::ConfigError;
use motoreal_core::CoreError;

/// Failures from the layers below the shell.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors that end the shell session.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    App(#[from] AppError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Line editor error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        CliError::App(AppError::Core(err))
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::App(AppError::Config(err))
    }
}

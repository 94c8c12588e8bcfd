use motoreal_config::model::SETTABLE_KEYS;
use motoreal_config::Config;

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::{self, section as output_section, OutputPreferences};
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "config",
        "Show or change preferences and cloud credentials",
        "config show\nconfig set <key> <value>",
        cmd_config,
    )]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] => show(context),
        [sub] if sub.eq_ignore_ascii_case("show") => show(context),
        [sub, key, value @ ..] if sub.eq_ignore_ascii_case("set") && !value.is_empty() => {
            set(context, key, &value.join(" "))
        }
        [sub, ..] if sub.eq_ignore_ascii_case("set") => Err(CommandError::InvalidArguments(
            format!("usage: config set <key> <value> (keys: {})", SETTABLE_KEYS.join(", ")),
        )),
        [other, ..] => Err(CommandError::InvalidArguments(format!(
            "unknown config subcommand `{}`",
            other
        ))),
    }
}

fn show(context: &mut ShellContext) -> CommandResult {
    let mut table = Table::new(vec![TableColumn::left("Key"), TableColumn::left("Value")]);
    for (key, value) in config_rows(&context.config) {
        table.add_row(vec![key.to_string(), value]);
    }
    output_section(format!("Config: {}", context.config_manager.config_path().display()));
    table.print();
    io::print_info(format!(
        "Data directory: {}",
        context.config.resolve_data_dir(&context.home).display()
    ));
    Ok(())
}

fn config_rows(config: &Config) -> Vec<(&'static str, String)> {
    let worker = config.sync.worker.as_ref();
    let drive = config.sync.drive.as_ref();
    vec![
        ("locale", config.locale.clone()),
        ("currency", config.currency.clone()),
        ("color", config.ui_color_enabled.to_string()),
        ("worker.url", worker.map(|w| w.url.clone()).unwrap_or_default()),
        ("worker.token", mask(worker.map(|w| w.token.as_str()))),
        ("drive.token", mask(drive.map(|d| d.access_token.as_str()))),
        ("drive.file", drive.map(|d| d.file_name.clone()).unwrap_or_default()),
        ("sync.debounce", format!("{}s", config.sync.debounce_secs)),
    ]
}

fn mask(secret: Option<&str>) -> String {
    match secret.map(str::trim) {
        Some(value) if !value.is_empty() => "********".to_string(),
        _ => String::new(),
    }
}

fn set(context: &mut ShellContext, key: &str, value: &str) -> CommandResult {
    let key = key.to_ascii_lowercase();
    context.config.set_value(&key, value)?;
    context.persist_config()?;

    if key == "color" {
        output::set_preferences(OutputPreferences {
            color_enabled: context.config.ui_color_enabled,
        });
    }
    if ["worker.", "drive.", "sync."]
        .iter()
        .any(|prefix| key.starts_with(prefix))
    {
        context.connect_sync();
    }
    io::print_success(format!("{key} updated."));
    Ok(())
}

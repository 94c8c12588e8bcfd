use std::fmt;
use std::sync::RwLock;

use colored::Colorize;
use once_cell::sync::Lazy;

/// Message categories used by the CLI output helpers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Hint,
    Success,
    Warning,
    Error,
    Section,
}

#[derive(Clone, Copy, Debug)]
pub struct OutputPreferences {
    pub color_enabled: bool,
}

impl Default for OutputPreferences {
    fn default() -> Self {
        Self {
            color_enabled: true,
        }
    }
}

static PREFERENCES: Lazy<RwLock<OutputPreferences>> =
    Lazy::new(|| RwLock::new(OutputPreferences::default()));

pub fn set_preferences(prefs: OutputPreferences) {
    if let Ok(mut guard) = PREFERENCES.write() {
        *guard = prefs;
    }
}

fn preferences() -> OutputPreferences {
    PREFERENCES
        .read()
        .map(|guard| *guard)
        .unwrap_or_default()
}

fn label(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::Info | MessageKind::Section => "INFO: [i]",
        MessageKind::Hint => "HINT: [?]",
        MessageKind::Success => "SUCCESS: [✓]",
        MessageKind::Warning => "WARNING: [!]",
        MessageKind::Error => "ERROR: [x]",
    }
}

pub(crate) fn format_message(
    kind: MessageKind,
    message: impl fmt::Display,
    prefs: &OutputPreferences,
) -> String {
    let text = message.to_string();
    let plain = match kind {
        MessageKind::Section => format!("=== {} ===", text.trim()),
        _ => format!("{} {text}", label(kind)),
    };

    if !prefs.color_enabled {
        return plain;
    }
    match kind {
        MessageKind::Success => plain.bright_green().to_string(),
        MessageKind::Warning => plain.bright_yellow().to_string(),
        MessageKind::Error => plain.bright_red().to_string(),
        MessageKind::Hint => plain.bright_cyan().to_string(),
        MessageKind::Section => plain.bold().to_string(),
        MessageKind::Info => plain,
    }
}

pub fn print(kind: MessageKind, message: impl fmt::Display) {
    let formatted = format_message(kind, message, &preferences());
    match kind {
        MessageKind::Section => println!("\n{formatted}"),
        _ => println!("{formatted}"),
    }
}

/// Prints a line verbatim, without a label. Used for table rows.
pub fn line(text: impl fmt::Display) {
    println!("{text}");
}

pub fn info(message: impl fmt::Display) {
    print(MessageKind::Info, message);
}

pub fn hint(message: impl fmt::Display) {
    print(MessageKind::Hint, message);
}

pub fn success(message: impl fmt::Display) {
    print(MessageKind::Success, message);
}

pub fn warning(message: impl fmt::Display) {
    print(MessageKind::Warning, message);
}

pub fn error(message: impl fmt::Display) {
    print(MessageKind::Error, message);
}

pub fn section(title: impl fmt::Display) {
    print(MessageKind::Section, title);
}

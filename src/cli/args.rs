//! Argument helpers shared by the command handlers.
//!
//! Commands take positional arguments followed by optional `key=value` pairs,
//! e.g. `vehicle add "Onix 1.0" ABC1D23 rented rent=550 cycle=weekly due=1`.

use std::str::FromStr;

use chrono::{Duration, NaiveDate};

use crate::cli::core::CommandError;

/// Parses a money amount. Accepts `1500`, `1500.50` and the Brazilian `1.500,50`.
pub fn parse_amount(raw: &str, field: &str) -> Result<f64, CommandError> {
    let trimmed = raw.trim().trim_start_matches("R$").trim();
    let normalized = if trimmed.contains(',') {
        trimmed.replace('.', "").replace(',', ".")
    } else {
        trimmed.to_string()
    };
    normalized
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| {
            CommandError::InvalidArguments(format!("{field} must be a number, got `{raw}`"))
        })
}

/// Parses `YYYY-MM-DD`, `DD/MM/YYYY`, or one of `today`, `hoje`, `yesterday`, `ontem`.
pub fn parse_date(raw: &str, today: NaiveDate) -> Result<NaiveDate, CommandError> {
    let value = raw.trim();
    match value.to_ascii_lowercase().as_str() {
        "today" | "hoje" => return Ok(today),
        "yesterday" | "ontem" => return Ok(today - Duration::days(1)),
        _ => {}
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%d/%m/%Y"))
        .map_err(|_| {
            CommandError::InvalidArguments(format!(
                "invalid date `{raw}`: use YYYY-MM-DD or DD/MM/YYYY"
            ))
        })
}

pub fn parse_enum<T: FromStr<Err = String>>(raw: &str) -> Result<T, CommandError> {
    raw.parse::<T>().map_err(CommandError::InvalidArguments)
}

/// Removes every `flag` from `args`, reporting whether it was present.
pub fn take_flag<'a>(args: &[&'a str], flag: &str) -> (bool, Vec<&'a str>) {
    let rest: Vec<&str> = args.iter().copied().filter(|arg| *arg != flag).collect();
    (rest.len() != args.len(), rest)
}

/// `key=value` options that follow a command's positional arguments.
#[derive(Debug, Default)]
pub struct Options {
    entries: Vec<(String, String)>,
}

impl Options {
    /// Splits `args` into positional arguments and options, preserving order.
    pub fn split<'a>(args: &[&'a str]) -> (Vec<&'a str>, Options) {
        let mut positional = Vec::new();
        let mut options = Options::default();
        for arg in args {
            match arg.split_once('=') {
                Some((key, value)) if is_option_key(key) => options
                    .entries
                    .push((key.to_ascii_lowercase(), value.to_string())),
                _ => positional.push(*arg),
            }
        }
        (positional, options)
    }

    /// Removes and returns the last value given for `key`.
    pub fn take(&mut self, key: &str) -> Option<String> {
        let mut found = None;
        self.entries.retain(|(name, value)| {
            if name == key {
                found = Some(value.clone());
                false
            } else {
                true
            }
        });
        found
    }

    pub fn amount(&mut self, key: &str) -> Result<Option<f64>, CommandError> {
        self.take(key)
            .map(|raw| parse_amount(&raw, key))
            .transpose()
    }

    pub fn required_amount(&mut self, key: &str) -> Result<f64, CommandError> {
        self.amount(key)?
            .ok_or_else(|| CommandError::InvalidArguments(format!("missing option `{key}=<amount>`")))
    }

    pub fn number(&mut self, key: &str) -> Result<Option<u32>, CommandError> {
        self.take(key)
            .map(|raw| {
                raw.trim().parse::<u32>().map_err(|_| {
                    CommandError::InvalidArguments(format!(
                        "{key} must be a whole number, got `{raw}`"
                    ))
                })
            })
            .transpose()
    }

    pub fn parsed<T: FromStr<Err = String>>(&mut self, key: &str) -> Result<Option<T>, CommandError> {
        self.take(key).map(|raw| parse_enum(&raw)).transpose()
    }

    pub fn date(&mut self, key: &str, today: NaiveDate) -> Result<Option<NaiveDate>, CommandError> {
        self.take(key)
            .map(|raw| parse_date(&raw, today))
            .transpose()
    }

    /// Fails when options remain that the command did not consume.
    pub fn finish(self) -> Result<(), CommandError> {
        if self.entries.is_empty() {
            return Ok(());
        }
        let unknown: Vec<String> = self
            .entries
            .into_iter()
            .map(|(key, _)| format!("`{key}`"))
            .collect();
        Err(CommandError::InvalidArguments(format!(
            "unknown option(s): {}",
            unknown.join(", ")
        )))
    }
}

fn is_option_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

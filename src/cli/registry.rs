use std::collections::HashMap;

use crate::cli::core::CommandResult;
use crate::cli::shell_context::ShellContext;

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

pub struct CommandEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandEntry {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
        }
    }
}

/// Commands in registration order, plus aliases that resolve to a registered name.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<&'static str, CommandEntry>,
    aliases: HashMap<&'static str, &'static str>,
    order: Vec<&'static str>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entry: CommandEntry) {
        let name = entry.name;
        if self.commands.insert(name, entry).is_none() {
            self.order.push(name);
        }
    }

    /// Ignored when `target` is not registered or `alias` shadows a command.
    pub fn register_alias(&mut self, alias: &'static str, target: &'static str) {
        if self.commands.contains_key(target) && !self.commands.contains_key(alias) {
            self.aliases.insert(alias, target);
        }
    }

    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        let name = self.aliases.get(name).copied().unwrap_or(name);
        self.commands.get(name)
    }

    pub fn list(&self) -> Vec<&CommandEntry> {
        self.order
            .iter()
            .filter_map(|name| self.commands.get(name))
            .collect()
    }

    /// Command names followed by aliases; used for completion and suggestions.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.order
            .iter()
            .copied()
            .chain(self.aliases.keys().copied())
    }

    pub fn handler(&self, name: &str) -> Option<CommandHandler> {
        self.get(name).map(|entry| entry.handler)
    }
}

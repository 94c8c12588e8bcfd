use crate::cli::args::take_flag;
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::registry::CommandEntry;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "reset",
        "Erase all local data (a backup is taken first)",
        "reset [--yes]",
        cmd_reset,
    )]
}

fn cmd_reset(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (assumed_yes, rest) = take_flag(args, "--yes");
    if !rest.is_empty() {
        return Err(CommandError::InvalidArguments("usage: reset [--yes]".into()));
    }
    if !context.confirm_destructive(
        "Erase every vehicle, transaction and custom category?",
        assumed_yes,
    )? {
        io::print_info("Reset cancelled.");
        return Ok(());
    }

    context.safety_backup("pre-reset")?;
    context.repository.clear_data()?;
    context.set_active_vehicle(None)?;
    io::print_success("Local data erased. Default categories and accounts were restored.");
    Ok(())
}

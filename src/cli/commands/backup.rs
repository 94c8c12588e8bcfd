use chrono::Local;

use crate::cli::args::take_flag;
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};

const USAGE: &str = "backup list
backup create [note]
backup restore <id|#> [--yes]";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "backup",
        "Create, list and restore full snapshot backups",
        USAGE,
        cmd_backup,
    )]
}

fn cmd_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((subcommand, rest)) = args.split_first() else {
        return list(context);
    };
    match subcommand.to_ascii_lowercase().as_str() {
        "list" => list(context),
        "create" => create(context, rest),
        "restore" => restore(context, rest),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown backup subcommand `{}`",
            other
        ))),
    }
}

fn list(context: &mut ShellContext) -> CommandResult {
    let backups = context.backups.list()?;
    if backups.is_empty() {
        io::print_info("No backups yet. Create one with `backup create [note]`.");
        return Ok(());
    }

    let mut table = Table::new(vec![
        TableColumn::right("#"),
        TableColumn::left("Id"),
        TableColumn::left("Created"),
        TableColumn::left("Note"),
        TableColumn::right("Size"),
    ]);
    for (index, backup) in backups.iter().enumerate() {
        table.add_row(vec![
            (index + 1).to_string(),
            backup.id.clone(),
            backup
                .created_at
                .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
            backup.note.clone().unwrap_or_default(),
            format_size(backup.size_bytes),
        ]);
    }
    output_section("Backups");
    table.print();
    Ok(())
}

fn create(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let note = args.join(" ");
    let note = Some(note.trim()).filter(|note| !note.is_empty());
    let info = context.backups.create(context.repository.snapshot(), note)?;
    io::print_success(format!("Backup `{}` created.", info.id));
    Ok(())
}

fn restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (assumed_yes, rest) = take_flag(args, "--yes");
    let [reference] = rest.as_slice() else {
        return Err(CommandError::InvalidArguments(
            "usage: backup restore <id|#> [--yes]".into(),
        ));
    };

    let backup = context.backups.find(reference)?;
    let snapshot = context.backups.load(&backup)?;
    let prompt = format!("Replace all local data with backup `{}`?", backup.id);
    if !context.confirm_destructive(&prompt, assumed_yes)? {
        io::print_info("Restore cancelled.");
        return Ok(());
    }

    context.safety_backup("pre-restore")?;
    context.repository.restore_snapshot(snapshot)?;
    for warning in context.repository.integrity_report() {
        io::print_warning(warning);
    }
    let snapshot = context.repository.snapshot();
    let keep = context.config.active_vehicle.filter(|id| {
        snapshot
            .vehicle(*id)
            .map_or(false, |vehicle| vehicle.is_active())
    });
    context.set_active_vehicle(keep)?;
    io::print_success(format!("Backup `{}` restored.", backup.id));
    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    }
}

use chrono::Local;

use motoreal_core::sync::SyncHandle;

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "sync",
        "Inspect or drive the cloud mirror",
        "sync status\nsync push\nsync pull",
        cmd_sync,
    )]
}

fn cmd_sync(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((subcommand, rest)) = args.split_first() else {
        return status(context);
    };
    if !rest.is_empty() {
        return Err(CommandError::InvalidArguments(format!(
            "sync {subcommand} takes no arguments"
        )));
    }
    match subcommand.to_ascii_lowercase().as_str() {
        "status" => status(context),
        "push" => push(context),
        "pull" => pull(context),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown sync subcommand `{}`",
            other
        ))),
    }
}

fn status(context: &mut ShellContext) -> CommandResult {
    let snapshot = context.repository.snapshot();
    let mut table = Table::new(vec![TableColumn::left("Sync"), TableColumn::left("Value")]);
    let backend = context
        .repository
        .sync()
        .map(|sync| sync.backend_name().to_string());
    table.add_row(vec![
        "Backend".to_string(),
        backend.unwrap_or_else(|| "not configured".to_string()),
    ]);
    table.add_row(vec![
        "Debounce".to_string(),
        format!("{}s", context.config.sync.debounce_secs),
    ]);
    table.add_row(vec![
        "Last local change".to_string(),
        snapshot
            .last_updated
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
    ]);
    if let Some(sync) = context.repository.sync() {
        let stats = sync.stats();
        table.add_row(vec!["Uploads".to_string(), stats.uploads.to_string()]);
        table.add_row(vec!["Failures".to_string(), stats.failures.to_string()]);
        table.add_row(vec![
            "Last upload".to_string(),
            stats
                .last_success
                .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "never".to_string()),
        ]);
        if let Some(error) = stats.last_error {
            table.add_row(vec!["Last error".to_string(), error]);
        }
    }

    output_section("Cloud sync");
    table.print();
    if context.repository.sync().is_none() {
        io::print_hint("Configure a mirror with `config set worker.url <url>` and `config set worker.token <token>`.");
    }
    Ok(())
}

fn push(context: &mut ShellContext) -> CommandResult {
    let sync = require_sync(context)?;
    sync.push_now(context.repository.snapshot())?;
    io::print_success(format!("Snapshot uploaded to {}.", sync.backend_name()));
    Ok(())
}

/// Replaces local data with the remote copy, keeping a backup of what was there.
fn pull(context: &mut ShellContext) -> CommandResult {
    let remote = require_sync(context)?.download()?;
    let Some(remote) = remote else {
        io::print_info("The cloud mirror is empty. Nothing to pull.");
        return Ok(());
    };
    context.safety_backup("pre-pull")?;
    context.repository.restore_snapshot(remote)?;
    // The restored data came from the mirror; uploading it straight back is pointless.
    if let Some(sync) = context.repository.sync() {
        sync.cancel();
    }
    for warning in context.repository.integrity_report() {
        io::print_warning(warning);
    }
    let snapshot = context.repository.snapshot();
    io::print_success(format!(
        "Pulled {} vehicle(s) and {} transaction(s).",
        snapshot.vehicles.len(),
        snapshot.transactions.len()
    ));
    let keep = context.config.active_vehicle.filter(|id| {
        snapshot
            .vehicle(*id)
            .map_or(false, |vehicle| vehicle.is_active())
    });
    context.set_active_vehicle(keep)
}

fn require_sync(context: &ShellContext) -> Result<&SyncHandle, CommandError> {
    context.repository.sync().ok_or_else(|| {
        CommandError::Message(
            "Cloud sync is not configured. Use `config set worker.url <url>` first.".into(),
        )
    })
}

use motoreal_core::{BillKind, BillProjector, UpcomingBill};

use crate::cli::args::Options;
use crate::cli::commands::transaction::resolve_account;
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::formatters::CliFormatters;
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "bills",
        "Show upcoming rent, financing and insurance bills, or pay one",
        "bills list\nbills pay <rent|financing|insurance> [account=..|none] [date=..]",
        cmd_bills,
    )]
}

fn cmd_bills(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((subcommand, rest)) = args.split_first() else {
        return list(context);
    };
    match subcommand.to_ascii_lowercase().as_str() {
        "list" => list(context),
        "pay" => pay(context, rest),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown bills subcommand `{}`",
            other
        ))),
    }
}

fn list(context: &mut ShellContext) -> CommandResult {
    let vehicle = context.require_vehicle()?;
    let bills = BillProjector::upcoming_bills(
        vehicle,
        &context.repository.snapshot().transactions,
        context.today(),
    );
    if bills.is_empty() {
        io::print_info(format!("No recurring bills for {}.", vehicle.plate));
        return Ok(());
    }

    output_section(format!("Bills: {}", vehicle.plate));
    bills_table(&bills, &context.formatters()).print();
    for bill in bills.iter().filter(|bill| bill.status.is_overdue()) {
        io::print_warning(format!("{} is {}.", bill.kind, bill.status));
    }
    Ok(())
}

pub(crate) fn bills_table(bills: &[UpcomingBill], formatters: &CliFormatters) -> Table {
    let mut table = Table::new(vec![
        TableColumn::left("Bill"),
        TableColumn::right("Amount"),
        TableColumn::left("Due"),
        TableColumn::left("Status"),
    ]);
    for bill in bills {
        table.add_row(vec![
            bill.kind.to_string(),
            formatters.money(bill.amount),
            formatters.date(bill.due_date),
            bill.status.to_string(),
        ]);
    }
    table
}

fn pay(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (positional, mut options) = Options::split(args);
    let [kind] = positional.as_slice() else {
        return Err(CommandError::InvalidArguments(
            "usage: bills pay <rent|financing|insurance> [account=..] [date=..]".into(),
        ));
    };
    let kind = BillKind::parse(kind).ok_or_else(|| {
        CommandError::InvalidArguments(format!(
            "unknown bill `{kind}`: expected rent, financing or insurance"
        ))
    })?;
    let today = context.today();
    let date = options.date("date", today)?.unwrap_or(today);
    let account = options.take("account");
    options.finish()?;

    let vehicle_id = context.require_vehicle()?.id;
    let account_id = resolve_account(context, account.as_deref())?;
    let id = context
        .repository
        .pay_bill(vehicle_id, kind, account_id, date)?;

    let snapshot = context.repository.snapshot();
    if let Some(txn) = snapshot.transaction(id) {
        io::print_success(format!(
            "Paid {} ({}).",
            context.money(txn.amount),
            txn.description.as_deref().unwrap_or(kind.label())
        ));
    }
    let next = snapshot
        .vehicle(vehicle_id)
        .and_then(|vehicle| BillProjector::bill(vehicle, kind, &snapshot.transactions, today));
    if let Some(next) = next {
        io::print_info(format!(
            "Next {} due {} ({}).",
            kind.label().to_lowercase(),
            context.formatters().date(next.due_date),
            next.status
        ));
    }
    Ok(())
}

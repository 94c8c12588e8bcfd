use motoreal_core::ReportService;
use motoreal_domain::{Account, AccountType};

use crate::cli::args::{parse_amount, parse_enum};
use crate::cli::commands::transaction::short_id;
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};

const USAGE: &str = "account list
account add <name> <checking|savings|cash> [opening balance]
account statement <id|name>";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "account",
        "List accounts, add one, or show an account statement",
        USAGE,
        cmd_account,
    )]
}

fn cmd_account(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((subcommand, rest)) = args.split_first() else {
        return list(context);
    };
    match subcommand.to_ascii_lowercase().as_str() {
        "list" => list(context),
        "add" => add(context, rest),
        "statement" | "show" => statement(context, rest),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown account subcommand `{}`",
            other
        ))),
    }
}

fn list(context: &mut ShellContext) -> CommandResult {
    let formatters = context.formatters();
    let accounts = context.repository.accounts();

    let mut table = Table::new(vec![
        TableColumn::left("Name"),
        TableColumn::left("Type"),
        TableColumn::right("Balance"),
        TableColumn::left("Default"),
        TableColumn::left("Id"),
    ]);
    for account in accounts {
        table.add_row(vec![
            account.name.clone(),
            account.kind.to_string(),
            formatters.money(account.balance),
            if account.is_default { "yes" } else { "" }.to_string(),
            account.id.clone(),
        ]);
    }

    output_section("Accounts");
    table.print();
    io::print_info(format!(
        "Consolidated balance: {}",
        formatters.money(ReportService::consolidated_balance(accounts))
    ));
    Ok(())
}

fn add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (name, kind, balance) = match args {
        [name, kind] => (name, kind, None),
        [name, kind, balance] => (name, kind, Some(balance)),
        _ => {
            return Err(CommandError::InvalidArguments(
                "usage: account add <name> <checking|savings|cash> [opening balance]".into(),
            ))
        }
    };
    let kind: AccountType = parse_enum(kind)?;
    let balance = match balance {
        Some(raw) => parse_amount(raw, "balance")?,
        None => 0.0,
    };

    let id = context
        .repository
        .add_account(Account::new(*name, kind, balance))?;
    io::print_success(format!(
        "Account {} added with {} ({}).",
        name,
        context.money(balance),
        id
    ));
    Ok(())
}

fn statement(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [reference] = args else {
        return Err(CommandError::InvalidArguments(
            "usage: account statement <id|name>".into(),
        ));
    };
    let formatters = context.formatters();
    let account = context.repository.find_account(reference)?;
    let snapshot = context.repository.snapshot();
    let rows = ReportService::account_statement(&snapshot.transactions, &account.id);

    output_section(format!(
        "{}: {}",
        account.name,
        formatters.money(account.balance)
    ));
    if rows.is_empty() {
        io::print_info("No transactions linked to this account.");
        return Ok(());
    }

    let mut table = Table::new(vec![
        TableColumn::left("Id"),
        TableColumn::left("Date"),
        TableColumn::left("Category"),
        TableColumn::right("Amount"),
        TableColumn::left("Vehicle"),
    ]);
    for txn in rows {
        let signed = if txn.is_income() { txn.amount } else { -txn.amount };
        let plate = snapshot
            .vehicle(txn.vehicle_id)
            .map(|vehicle| vehicle.plate.as_str())
            .unwrap_or("-");
        table.add_row(vec![
            short_id(&txn.id.to_string()).to_string(),
            formatters.date(txn.date),
            snapshot.category_label(&txn.category).to_string(),
            formatters.money(signed),
            plate.to_string(),
        ]);
    }
    table.print();
    Ok(())
}

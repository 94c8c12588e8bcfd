use motoreal_domain::{category::ids, FuelType, Transaction, TransactionType};

use crate::cli::args::{parse_amount, parse_enum, Options};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};

const DEFAULT_LIST_LIMIT: usize = 20;
const SHORT_ID_LEN: usize = 8;

const USAGE: &str = "tx add <income|expense> <category> <amount> [date=..] [account=..|none] [desc=..] [fuel=.. price=..]
tx list [limit]
tx remove <id>
tx link <id> <account>";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "tx",
        "Record and review income and expenses of the active vehicle",
        USAGE,
        cmd_tx,
    )]
}

fn cmd_tx(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((subcommand, rest)) = args.split_first() else {
        return list(context, &[]);
    };
    match subcommand.to_ascii_lowercase().as_str() {
        "add" => add(context, rest),
        "list" => list(context, rest),
        "remove" | "rm" => remove(context, rest),
        "link" => link(context, rest),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown tx subcommand `{}`",
            other
        ))),
    }
}

fn add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (positional, mut options) = Options::split(args);
    let [kind, category, amount] = positional.as_slice() else {
        return Err(CommandError::InvalidArguments(
            "usage: tx add <income|expense> <category> <amount> [key=value..]".into(),
        ));
    };
    let kind: TransactionType = parse_enum(kind)?;
    let amount = parse_amount(amount, "amount")?;
    let today = context.today();
    let date = options.date("date", today)?.unwrap_or(today);
    let account = options.take("account");
    let description = options.take("desc");
    let fuel = options.parsed::<FuelType>("fuel")?;
    let unit_price = options.amount("price")?;
    options.finish()?;

    let vehicle = context.require_vehicle()?;
    let vehicle_id = vehicle.id;
    let category = context.repository.resolve_category(category)?;
    let visible = context
        .repository
        .visible_categories(Some(kind), Some(vehicle))
        .iter()
        .any(|item| item.id == category.id);
    if !visible {
        return Err(CommandError::InvalidArguments(format!(
            "category {} is not available for {} {} transactions",
            category.label,
            vehicle.ownership_type().to_string().to_lowercase(),
            kind.to_string().to_lowercase()
        )));
    }
    let category_id = category.id.clone();
    let account_id = resolve_account(context, account.as_deref())?;

    let mut transaction = Transaction::new(vehicle_id, kind, category_id.as_str(), amount, date);
    if let Some(text) = description {
        transaction = transaction.with_description(text);
    }
    match (fuel, unit_price) {
        (Some(fuel), price) if category_id == ids::FUEL => {
            transaction = transaction.with_fuel(fuel, price.unwrap_or(0.0));
        }
        (None, None) => {}
        _ => {
            return Err(CommandError::InvalidArguments(
                "fuel=<type> [price=..] only applies to fuel expenses".into(),
            ))
        }
    }
    transaction.account_id = account_id;

    let id = context.repository.add_transaction(transaction)?;
    let snapshot = context.repository.snapshot();
    io::print_success(format!(
        "Recorded {} {} in {} ({}).",
        kind.to_string().to_lowercase(),
        context.money(amount),
        snapshot.category_label(&category_id),
        short_id(&id.to_string())
    ));
    if let Some(fuel) = snapshot.transaction(id).and_then(|txn| txn.fuel.as_ref()) {
        if let Some(volume) = fuel.volume {
            io::print_info(format!("  {volume:.2} {} of {}", fuel.fuel_type.unit(), fuel.fuel_type));
        }
    }
    Ok(())
}

fn list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let limit = match args.first() {
        Some(raw) => raw.parse::<usize>().map_err(|_| {
            CommandError::InvalidArguments(format!("limit must be a whole number, got `{raw}`"))
        })?,
        None => DEFAULT_LIST_LIMIT,
    };
    let vehicle = context.require_vehicle()?;
    let formatters = context.formatters();
    let snapshot = context.repository.snapshot();
    let rows = context.repository.transactions_for_vehicle(vehicle.id);
    if rows.is_empty() {
        io::print_info(format!("No transactions for {} yet.", vehicle.plate));
        return Ok(());
    }

    let mut table = Table::new(vec![
        TableColumn::left("Id"),
        TableColumn::left("Date"),
        TableColumn::left("Type"),
        TableColumn::left("Category"),
        TableColumn::right("Amount"),
        TableColumn::left("Account"),
        TableColumn::left("Description"),
    ]);
    for txn in rows.iter().take(limit) {
        let account = txn
            .account_id
            .as_deref()
            .map(|id| snapshot.account(id).map_or(id, |account| account.name.as_str()))
            .unwrap_or("-");
        table.add_row(vec![
            short_id(&txn.id.to_string()).to_string(),
            formatters.date(txn.date),
            txn.kind.to_string(),
            snapshot.category_label(&txn.category).to_string(),
            formatters.money(txn.amount),
            account.to_string(),
            txn.description.clone().unwrap_or_default(),
        ]);
    }

    output_section(format!("Transactions: {}", vehicle.plate));
    table.print();
    if rows.len() > limit {
        io::print_info(format!("Showing {limit} of {}. Use `tx list <limit>` for more.", rows.len()));
    }
    Ok(())
}

fn remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [reference] = args else {
        return Err(CommandError::InvalidArguments("usage: tx remove <id>".into()));
    };
    let id = context.repository.resolve_transaction(reference)?;
    let removed = context.repository.delete_transaction(id)?;
    io::print_success(format!(
        "Removed {} {} from {}.",
        removed.kind.to_string().to_lowercase(),
        context.money(removed.amount),
        context.formatters().date(removed.date)
    ));
    Ok(())
}

fn link(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [reference, account] = args else {
        return Err(CommandError::InvalidArguments(
            "usage: tx link <id> <account>".into(),
        ));
    };
    let id = context.repository.resolve_transaction(reference)?;
    let account = context.repository.find_account(account)?;
    let (account_id, account_name) = (account.id.clone(), account.name.clone());
    context.repository.link_transaction_account(id, &account_id)?;
    io::print_success(format!("Transaction linked to {account_name}."));
    Ok(())
}

/// `account=none` records without an account; no option picks the default account.
pub(crate) fn resolve_account(
    context: &ShellContext,
    reference: Option<&str>,
) -> Result<Option<String>, CommandError> {
    match reference {
        Some(value) if value.eq_ignore_ascii_case("none") => Ok(None),
        Some(value) => Ok(Some(context.repository.find_account(value)?.id.clone())),
        None => Ok(context
            .repository
            .snapshot()
            .default_account()
            .map(|account| account.id.clone())),
    }
}

pub(crate) fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}

use motoreal_domain::{CategoryItem, CategoryType, TransactionType};

use crate::cli::args::parse_enum;
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};

const DEFAULT_COLOR: &str = "#94a3b8";

const USAGE: &str = "category list [income|expense]
category add <label> <income|expense|both> [#rrggbb]
category remove <id|label>";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "category",
        "List the categories available to the active vehicle, or manage custom ones",
        USAGE,
        cmd_category,
    )]
}

fn cmd_category(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((subcommand, rest)) = args.split_first() else {
        return list(context, &[]);
    };
    match subcommand.to_ascii_lowercase().as_str() {
        "list" => list(context, rest),
        "add" => add(context, rest),
        "remove" | "rm" => remove(context, rest),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown category subcommand `{}`",
            other
        ))),
    }
}

fn list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let kind = match args {
        [] => None,
        [raw] => Some(parse_enum::<TransactionType>(raw)?),
        _ => {
            return Err(CommandError::InvalidArguments(
                "usage: category list [income|expense]".into(),
            ))
        }
    };
    let vehicle = context.active_vehicle();
    let categories = context.repository.visible_categories(kind, vehicle);

    let mut table = Table::new(vec![
        TableColumn::left("Label"),
        TableColumn::left("Type"),
        TableColumn::left("Color"),
        TableColumn::left("Id"),
    ]);
    for category in categories {
        let label = if category.is_system {
            category.label.clone()
        } else {
            format!("{} (custom)", category.label)
        };
        table.add_row(vec![
            label,
            category.kind.to_string(),
            category.color.clone(),
            category.id.clone(),
        ]);
    }
    output_section("Categories");
    table.print();
    Ok(())
}

fn add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (label, kind, color) = match args {
        [label, kind] => (label, kind, DEFAULT_COLOR),
        [label, kind, color] => (label, kind, *color),
        _ => {
            return Err(CommandError::InvalidArguments(
                "usage: category add <label> <income|expense|both> [#rrggbb]".into(),
            ))
        }
    };
    let kind: CategoryType = parse_enum(kind)?;
    context
        .repository
        .add_category(CategoryItem::custom(*label, kind, color))?;
    io::print_success(format!("Category {label} added."));
    Ok(())
}

fn remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [reference] = args else {
        return Err(CommandError::InvalidArguments(
            "usage: category remove <id|label>".into(),
        ));
    };
    let id = context.repository.resolve_category(reference)?.id.clone();
    let removed = context.repository.delete_category(&id)?;
    io::print_success(format!("Category {} removed.", removed.label));
    Ok(())
}

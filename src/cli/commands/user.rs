use crate::cli::args::parse_amount;
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::registry::CommandEntry;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "onboard",
            "Save your profile and optional monthly goal",
            "onboard <name> <email> [goal]",
            cmd_onboard,
        ),
        CommandEntry::new(
            "goal",
            "Show or change the monthly net-profit goal",
            "goal [show|set <amount>|clear]",
            cmd_goal,
        ),
    ]
}

fn cmd_onboard(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [name, email, rest @ ..] = args else {
        return Err(CommandError::InvalidArguments(
            "usage: onboard <name> <email> [goal]".into(),
        ));
    };
    let goal = match rest {
        [] => None,
        [goal] => Some(parse_amount(goal, "goal")?),
        _ => {
            return Err(CommandError::InvalidArguments(
                "usage: onboard <name> <email> [goal]".into(),
            ))
        }
    };

    context.repository.save_user(name, email, goal)?;
    io::print_success(format!("Welcome, {}!", name.trim()));
    if goal.is_none() {
        io::print_hint("Set a monthly goal with `goal set <amount>`.");
    }
    Ok(())
}

fn cmd_goal(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first().copied().unwrap_or("show") {
        "show" => {
            match context.repository.user().and_then(|user| user.goal()) {
                Some(goal) => io::print_info(format!("Monthly goal: {}", context.money(goal))),
                None => io::print_info("No monthly goal set."),
            }
            Ok(())
        }
        "set" => {
            let raw = args.get(1).ok_or_else(|| {
                CommandError::InvalidArguments("usage: goal set <amount>".into())
            })?;
            let goal = parse_amount(raw, "goal")?;
            context.repository.set_monthly_goal(Some(goal))?;
            io::print_success(format!("Monthly goal set to {}.", context.money(goal)));
            Ok(())
        }
        "clear" => {
            context.repository.set_monthly_goal(None)?;
            io::print_success("Monthly goal cleared.");
            Ok(())
        }
        other => Err(CommandError::InvalidArguments(format!(
            "unknown goal subcommand `{}`",
            other
        ))),
    }
}

use serde::Serialize;

use motoreal_core::{
    daily_rent, BillProjector, FinancingProgress, GoalProgress, MonthlyFinancials,
    ProfitCalculator, ReportService, UpcomingBill, DEFAULT_REPORT_DAYS,
};
use motoreal_domain::Transaction;

use crate::cli::args::take_flag;
use crate::cli::commands::bills::bills_table;
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::formatters::{percent, CliFormatters};
use crate::cli::io;
use crate::cli::output::{self, section as output_section};
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};

const DASHBOARD_BILLS: usize = 3;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "dashboard",
            "Month-to-date profit, goal pace and upcoming bills",
            "dashboard [--json]",
            cmd_dashboard,
        ),
        CommandEntry::new(
            "report",
            "Daily performance and income split by platform",
            "report [days]",
            cmd_report,
        ),
    ]
}

/// Everything the dashboard shows, also emitted as JSON by `dashboard --json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardSummary<'a> {
    plate: &'a str,
    model: &'a str,
    month: MonthlyFinancials,
    daily_rent: Option<f64>,
    goal: Option<GoalProgress>,
    bills: Vec<UpcomingBill>,
    financing: Option<FinancingProgress>,
    consolidated_balance: f64,
}

fn cmd_dashboard(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (as_json, rest) = take_flag(args, "--json");
    if !rest.is_empty() {
        return Err(CommandError::InvalidArguments("usage: dashboard [--json]".into()));
    }
    let today = context.today();
    let formatters = context.formatters();
    let snapshot = context.repository.snapshot();
    let vehicle = context.require_vehicle()?;

    let month = ProfitCalculator::monthly(Some(vehicle), &snapshot.transactions, today);
    let goal = snapshot
        .user
        .as_ref()
        .and_then(|user| user.monthly_goal)
        .map(|goal| ProfitCalculator::goal_progress(&month, Some(goal)));
    let summary = DashboardSummary {
        plate: &vehicle.plate,
        model: &vehicle.model,
        daily_rent: daily_rent(vehicle, month.days_in_month),
        goal,
        bills: BillProjector::upcoming_bills(vehicle, &snapshot.transactions, today),
        financing: ReportService::financing_progress(vehicle),
        consolidated_balance: ReportService::consolidated_balance(&snapshot.accounts),
        month,
    };

    if as_json {
        output::line(serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    render(&summary, &formatters);
    Ok(())
}

fn render(summary: &DashboardSummary<'_>, formatters: &CliFormatters) {
    let month = &summary.month;
    output_section(format!(
        "{} {} · day {}/{}",
        summary.model, summary.plate, month.current_day, month.days_in_month
    ));

    let mut table = Table::new(vec![TableColumn::left("Month"), TableColumn::right("Amount")]);
    for (label, amount) in [
        ("Income", month.income),
        ("Variable costs", month.variable_costs),
        ("Fixed costs provisioned", month.provisioned_fixed_costs),
        ("Maintenance reserve", month.maintenance_reserve),
        ("Real profit", month.real_profit),
    ] {
        table.add_row(vec![label.to_string(), formatters.money(amount)]);
    }
    table.print();

    if month.total_monthly_fixed > 0.0 {
        io::print_info(format!(
            "Fixed costs this month: {} ({} provisioned).",
            formatters.money(month.total_monthly_fixed),
            percent(month.provision_progress())
        ));
    }
    if let Some(per_day) = summary.daily_rent {
        io::print_info(format!("Rent costs {} per day.", formatters.money(per_day)));
    }

    match &summary.goal {
        None => io::print_hint("Set a monthly goal with `goal set <amount>` to see your daily target."),
        Some(pace) if pace.goal_met => io::print_success(format!(
            "Goal of {} reached ({}).",
            formatters.money(pace.goal),
            percent(pace.progress)
        )),
        Some(pace) => {
            io::print_info(format!(
                "Goal {}: {} done, {} to go over {} day(s).",
                formatters.money(pace.goal),
                percent(pace.progress),
                formatters.money(pace.remaining),
                pace.remaining_days
            ));
            io::print_info(format!(
                "Needed per day: {} net, about {} gross at a {} margin.",
                formatters.money(pace.daily_net_needed),
                formatters.money(pace.daily_gross_needed),
                percent(pace.estimated_margin * 100.0)
            ));
        }
    }

    if !summary.bills.is_empty() {
        output_section("Upcoming bills");
        let shown = &summary.bills[..summary.bills.len().min(DASHBOARD_BILLS)];
        bills_table(shown, formatters).print();
        for bill in summary.bills.iter().filter(|bill| bill.status.is_overdue()) {
            io::print_warning(format!("{} is {}.", bill.kind, bill.status));
        }
    }

    if let Some(progress) = &summary.financing {
        io::print_info(format!(
            "Financing: {}/{} installments paid ({}), {} left.",
            progress.paid,
            progress.total,
            percent(progress.percent),
            formatters.money(progress.remaining_amount)
        ));
    }

    io::print_info(format!(
        "Balance across accounts: {}.",
        formatters.money(summary.consolidated_balance)
    ));
}

fn cmd_report(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let days = match args {
        [] => DEFAULT_REPORT_DAYS,
        [raw] => match raw.parse::<u32>() {
            Ok(days) if days > 0 => days,
            _ => {
                return Err(CommandError::InvalidArguments(format!(
                    "days must be a positive whole number, got `{raw}`"
                )))
            }
        },
        _ => return Err(CommandError::InvalidArguments("usage: report [days]".into())),
    };
    let today = context.today();
    let formatters = context.formatters();
    let snapshot = context.repository.snapshot();
    let vehicle = context.require_vehicle()?;
    let transactions: Vec<Transaction> = context
        .repository
        .transactions_for_vehicle(vehicle.id)
        .into_iter()
        .cloned()
        .collect();

    output_section(format!("Last {days} day(s): {}", vehicle.plate));
    let mut daily = Table::new(vec![
        TableColumn::left("Date"),
        TableColumn::right("Income"),
        TableColumn::right("Expense"),
        TableColumn::right("Net"),
    ]);
    for row in ReportService::daily_performance(&transactions, today, days) {
        daily.add_row(vec![
            formatters.date(row.date),
            formatters.money(row.income),
            formatters.money(row.expense),
            formatters.money(row.net()),
        ]);
    }
    daily.print();

    let shares = ReportService::platform_split(snapshot, &transactions, today);
    if shares.is_empty() {
        io::print_info("No income recorded this month.");
        return Ok(());
    }
    let total: f64 = shares.iter().map(|share| share.amount).sum();
    output_section("Income by platform this month");
    let mut split = Table::new(vec![
        TableColumn::left("Platform"),
        TableColumn::right("Amount"),
        TableColumn::right("Share"),
    ]);
    for share in &shares {
        split.add_row(vec![
            share.label.clone(),
            formatters.money(share.amount),
            percent(share.amount / total * 100.0),
        ]);
    }
    split.print();
    Ok(())
}

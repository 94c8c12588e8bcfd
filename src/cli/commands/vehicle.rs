use chrono::Datelike;

use motoreal_core::{total_monthly_fixed, ReportService};
use motoreal_domain::{
    days_in_month, BillingCycle, FinancingTerms, InsurancePlan, Ownership, OwnershipType,
    RentTerms, Vehicle,
};

use crate::cli::args::{parse_amount, parse_enum, Options};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::formatters::percent;
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};

const USAGE: &str = "vehicle add <model> <plate> <owned|financed|rented> [key=value..]
vehicle list [--all]
vehicle show [plate]
vehicle use <plate>
vehicle edit <plate> [key=value..]
vehicle archive <plate>
vehicle paid <plate>
options: value= (owned) | installment= months= paid= due= (financed)
         rent= cycle=weekly|monthly due= (rented) | insurance= insurance_due=";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "vehicle",
        "Manage vehicles and their recurring costs",
        USAGE,
        cmd_vehicle,
    )]
}

fn cmd_vehicle(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((subcommand, rest)) = args.split_first() else {
        return list(context, &[]);
    };
    match subcommand.to_ascii_lowercase().as_str() {
        "add" => add(context, rest),
        "list" => list(context, rest),
        "show" => show(context, rest),
        "use" => use_vehicle(context, rest),
        "edit" => edit(context, rest),
        "archive" => archive(context, rest),
        "paid" => paid(context, rest),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown vehicle subcommand `{}`",
            other
        ))),
    }
}

fn add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (positional, mut options) = Options::split(args);
    let [model, plate, kind] = positional.as_slice() else {
        return Err(CommandError::InvalidArguments(
            "usage: vehicle add <model> <plate> <owned|financed|rented> [key=value..]".into(),
        ));
    };
    let kind: OwnershipType = parse_enum(kind)?;
    let ownership = build_ownership(kind, &mut options)?;
    let insurance = insurance_from(&mut options)?;
    options.finish()?;

    let mut vehicle = Vehicle::new(model.trim(), *plate, ownership);
    vehicle.insurance = insurance;
    let id = context.repository.add_vehicle(vehicle)?;

    let keeps_current = context
        .config
        .active_vehicle
        .and_then(|current| context.repository.snapshot().vehicle(current))
        .is_some_and(Vehicle::is_active);
    if !keeps_current {
        context.set_active_vehicle(Some(id))?;
    }
    if let Some(vehicle) = context.repository.snapshot().vehicle(id) {
        io::print_success(format!(
            "Vehicle {} added ({}).",
            vehicle.plate,
            vehicle.ownership_type()
        ));
    }
    Ok(())
}

fn list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let include_archived = args.contains(&"--all");
    let today = context.today();
    let month_days = days_in_month(today.year(), today.month());
    let active_id = context.active_vehicle().map(|vehicle| vehicle.id);
    let snapshot = context.repository.snapshot();

    let mut table = Table::new(vec![
        TableColumn::left(""),
        TableColumn::left("Plate"),
        TableColumn::left("Model"),
        TableColumn::left("Ownership"),
        TableColumn::right("Fixed/month"),
        TableColumn::left("Status"),
    ]);
    for vehicle in snapshot
        .vehicles
        .iter()
        .filter(|vehicle| include_archived || vehicle.is_active())
    {
        table.add_row(vec![
            if Some(vehicle.id) == active_id { "*" } else { "" }.to_string(),
            vehicle.plate.clone(),
            vehicle.model.clone(),
            vehicle.ownership_type().to_string(),
            context.money(total_monthly_fixed(vehicle, month_days)),
            if vehicle.is_archived { "archived" } else { "active" }.to_string(),
        ]);
    }

    if table.is_empty() {
        io::print_info("No vehicles yet. Add one with `vehicle add`.");
        return Ok(());
    }
    output_section("Vehicles");
    table.print();
    Ok(())
}

fn show(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let vehicle = match args.first() {
        Some(plate) => context.repository.vehicle_by_plate(plate)?,
        None => context.require_vehicle()?,
    };
    let money = |amount: f64| context.money(amount);

    output_section(format!("{} ({})", vehicle.model, vehicle.plate));
    io::print_info(format!("  Ownership : {}", vehicle.ownership_type()));
    match &vehicle.ownership {
        Ownership::Owned { vehicle_value } => {
            if let Some(value) = vehicle_value {
                io::print_info(format!("  Value     : {}", money(*value)));
            }
        }
        Ownership::Rented(rent) => {
            io::print_info(format!(
                "  Rent      : {} {} (due {})",
                money(rent.amount),
                rent.frequency.to_string().to_lowercase(),
                due_label(rent.due_day, rent.frequency)
            ));
        }
        Ownership::Financed(terms) => {
            io::print_info(format!(
                "  Financing : {} per month (due day {})",
                money(terms.installment),
                terms.due_day
            ));
            if let Some(progress) = ReportService::financing_progress(vehicle) {
                io::print_info(format!(
                    "  Paid      : {}/{} ({}), {} remaining",
                    progress.paid,
                    progress.total,
                    percent(progress.percent),
                    money(progress.remaining_amount)
                ));
            }
        }
    }
    if let Some(insurance) = vehicle.insurance() {
        io::print_info(format!(
            "  Insurance : {} per month (due day {})",
            money(insurance.installment_value),
            insurance.due_day
        ));
    }
    if vehicle.is_archived {
        io::print_warning("This vehicle is archived.");
    }
    Ok(())
}

fn use_vehicle(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let plate = single_plate(args, "vehicle use <plate>")?;
    let vehicle = context.repository.vehicle_by_plate(plate)?;
    if vehicle.is_archived {
        return Err(CommandError::Message(format!(
            "vehicle {} is archived",
            vehicle.plate
        )));
    }
    let (id, plate) = (vehicle.id, vehicle.plate.clone());
    context.set_active_vehicle(Some(id))?;
    io::print_success(format!("Active vehicle is now {plate}."));
    Ok(())
}

fn edit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (positional, mut options) = Options::split(args);
    let [plate] = positional.as_slice() else {
        return Err(CommandError::InvalidArguments(
            "usage: vehicle edit <plate> [key=value..]".into(),
        ));
    };
    let mut vehicle = context.repository.vehicle_by_plate(plate)?.clone();

    if let Some(model) = options.take("model") {
        vehicle.model = model;
    }
    if let Some(new_plate) = options.take("plate") {
        vehicle.plate = new_plate;
    }
    match options.parsed::<OwnershipType>("type")? {
        Some(kind) => vehicle.ownership = build_ownership(kind, &mut options)?,
        None => patch_ownership(&mut vehicle.ownership, &mut options)?,
    }
    let insurance = options.take("insurance");
    match insurance.as_deref() {
        Some(value) if value.eq_ignore_ascii_case("none") => {
            vehicle.insurance = None;
            options.take("insurance_due");
        }
        _ => patch_insurance(&mut vehicle, insurance.as_deref(), &mut options)?,
    }
    options.finish()?;

    let id = vehicle.id;
    context.repository.update_vehicle(vehicle)?;
    if let Some(vehicle) = context.repository.snapshot().vehicle(id) {
        io::print_success(format!("Vehicle {} updated.", vehicle.plate));
    }
    Ok(())
}

fn archive(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let plate = single_plate(args, "vehicle archive <plate>")?;
    let vehicle = context.repository.vehicle_by_plate(plate)?;
    let (id, plate) = (vehicle.id, vehicle.plate.clone());
    context.repository.archive_vehicle(id)?;
    if context.config.active_vehicle == Some(id) {
        context.set_active_vehicle(None)?;
    }
    io::print_success(format!("Vehicle {plate} archived. Its history is kept."));
    Ok(())
}

fn paid(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let plate = single_plate(args, "vehicle paid <plate>")?;
    let id = context.repository.vehicle_by_plate(plate)?.id;
    let paid = context.repository.mark_installment_paid(id)?;
    let total = context
        .repository
        .snapshot()
        .vehicle(id)
        .and_then(Vehicle::financing)
        .map(|terms| terms.total_months)
        .unwrap_or(0);
    if total > 0 {
        io::print_success(format!("Installment {paid}/{total} marked as paid."));
    } else {
        io::print_success(format!("Installment {paid} marked as paid."));
    }
    io::print_hint("Use `bills pay financing` to also record the expense.");
    Ok(())
}

fn single_plate<'a>(args: &[&'a str], usage: &str) -> Result<&'a str, CommandError> {
    match args {
        [plate] => Ok(*plate),
        _ => Err(CommandError::InvalidArguments(format!("usage: {usage}"))),
    }
}

fn build_ownership(kind: OwnershipType, options: &mut Options) -> Result<Ownership, CommandError> {
    Ok(match kind {
        OwnershipType::Owned => Ownership::owned(options.amount("value")?),
        OwnershipType::Financed => {
            let installment = options.required_amount("installment")?;
            let mut terms = FinancingTerms::new(
                installment,
                options.number("due")?,
                options.number("months")?.unwrap_or(0),
            );
            if let Some(paid) = options.number("paid")? {
                terms.paid_months = paid;
            }
            Ownership::Financed(terms)
        }
        OwnershipType::Rented => {
            let amount = options.required_amount("rent")?;
            let cycle = options.parsed::<BillingCycle>("cycle")?.unwrap_or_default();
            Ownership::Rented(RentTerms::new(amount, cycle, options.number("due")?))
        }
    })
}

/// Applies option overrides to the existing mode's fields.
fn patch_ownership(ownership: &mut Ownership, options: &mut Options) -> Result<(), CommandError> {
    match ownership {
        Ownership::Owned { vehicle_value } => {
            if let Some(value) = options.amount("value")? {
                *vehicle_value = Some(value);
            }
        }
        Ownership::Financed(terms) => {
            if let Some(installment) = options.amount("installment")? {
                terms.installment = installment;
            }
            if let Some(due) = options.number("due")? {
                terms.due_day = due;
            }
            if let Some(months) = options.number("months")? {
                terms.total_months = months;
            }
            if let Some(paid) = options.number("paid")? {
                terms.paid_months = paid;
            }
        }
        Ownership::Rented(rent) => {
            if let Some(amount) = options.amount("rent")? {
                rent.amount = amount;
            }
            if let Some(cycle) = options.parsed::<BillingCycle>("cycle")? {
                rent.frequency = cycle;
            }
            if let Some(due) = options.number("due")? {
                rent.due_day = due;
            }
        }
    }
    Ok(())
}

fn insurance_from(options: &mut Options) -> Result<Option<InsurancePlan>, CommandError> {
    let due = options.number("insurance_due")?;
    Ok(options
        .amount("insurance")?
        .map(|value| InsurancePlan::new(value, due)))
}

fn patch_insurance(
    vehicle: &mut Vehicle,
    raw_value: Option<&str>,
    options: &mut Options,
) -> Result<(), CommandError> {
    let value = raw_value
        .map(|raw| parse_amount(raw, "insurance"))
        .transpose()?;
    let due = options.number("insurance_due")?;
    match (vehicle.insurance.as_mut(), value) {
        (Some(plan), value) => {
            if let Some(value) = value {
                plan.installment_value = value;
            }
            if let Some(due) = due {
                plan.due_day = due;
            }
        }
        (None, Some(value)) => vehicle.insurance = Some(InsurancePlan::new(value, due)),
        (None, None) if due.is_some() => {
            return Err(CommandError::InvalidArguments(
                "insurance_due needs insurance=<amount> on a vehicle without insurance".into(),
            ))
        }
        (None, None) => {}
    }
    Ok(())
}

fn due_label(day: u32, cycle: BillingCycle) -> String {
    match cycle {
        BillingCycle::Monthly => format!("day {day}"),
        BillingCycle::Weekly => {
            let name = match day {
                1 => "Monday",
                2 => "Tuesday",
                3 => "Wednesday",
                4 => "Thursday",
                5 => "Friday",
                6 => "Saturday",
                _ => "Sunday",
            };
            format!("every {name}")
        }
    }
}

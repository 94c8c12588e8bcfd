//! Boundary checks applied before data reaches the repository or the calculators.

use once_cell::sync::Lazy;
use regex::Regex;

use motoreal_domain::{BillingCycle, Vehicle};

use crate::CoreError;

pub const PLATE_LENGTH: usize = 7;

static OLD_PLATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3}[0-9]{4}$").expect("old plate pattern"));
static MERCOSUL_PLATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3}[0-9][A-Z][0-9]{2}$").expect("mercosul plate pattern"));

/// Uppercases, strips everything but ASCII letters and digits, and truncates to plate length.
pub fn normalize_plate(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .take(PLATE_LENGTH)
        .collect()
}

/// Accepts the old Brazilian format (`ABC1234`) and the Mercosul format (`ABC1D23`).
pub fn is_valid_plate(plate: &str) -> bool {
    plate.len() == PLATE_LENGTH && (OLD_PLATE.is_match(plate) || MERCOSUL_PLATE.is_match(plate))
}

/// Normalizes and validates a plate, returning the canonical form.
pub fn validate_plate(raw: &str) -> Result<String, CoreError> {
    let plate = normalize_plate(raw);
    if is_valid_plate(&plate) {
        Ok(plate)
    } else {
        Err(CoreError::Validation(format!(
            "invalid plate `{}`: expected ABC1234 or ABC1D23",
            raw.trim()
        )))
    }
}

pub fn ensure_positive_amount(amount: f64, field: &str) -> Result<(), CoreError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{field} must be greater than zero"
        )))
    }
}

pub fn ensure_non_empty(value: &str, field: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        Err(CoreError::Validation(format!("{field} cannot be empty")))
    } else {
        Ok(())
    }
}

/// Day of month (1..=31) for monthly bills, weekday (1..=7) for weekly ones.
pub fn ensure_due_day(day: u32, cycle: BillingCycle, field: &str) -> Result<(), CoreError> {
    let max = match cycle {
        BillingCycle::Monthly => 31,
        BillingCycle::Weekly => 7,
    };
    if (1..=max).contains(&day) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{field} must be between 1 and {max}"
        )))
    }
}

/// Checks the cost fields a vehicle carries for its ownership mode.
pub fn validate_vehicle(vehicle: &Vehicle) -> Result<(), CoreError> {
    ensure_non_empty(&vehicle.model, "model")?;
    if let Some(rent) = vehicle.rent() {
        ensure_positive_amount(rent.amount, "rent amount")?;
        ensure_due_day(rent.due_day, rent.frequency, "rent due day")?;
    }
    if let Some(financing) = vehicle.financing() {
        ensure_positive_amount(financing.installment, "financing installment")?;
        ensure_due_day(financing.due_day, BillingCycle::Monthly, "financing due day")?;
    }
    if let Some(insurance) = vehicle.insurance() {
        ensure_positive_amount(insurance.installment_value, "insurance installment")?;
        ensure_due_day(insurance.due_day, BillingCycle::Monthly, "insurance due day")?;
    }
    Ok(())
}

//! Shared traits, cadence enums and calendar helpers.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Exposes a stable identifier for entities keyed by UUID.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

/// Provides read-only access to an entity's display name.
pub trait NamedEntity {
    fn name(&self) -> &str;
}

/// Converts an entity into a user-facing display label.
pub trait Displayable {
    fn display_label(&self) -> String;
}

/// Billing cadence for recurring vehicle costs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingCycle {
    Weekly,
    #[default]
    Monthly,
}

impl BillingCycle {
    /// Nominal length in days used for day-based proration.
    pub fn period_days(self) -> Option<u32> {
        match self {
            BillingCycle::Weekly => Some(7),
            BillingCycle::Monthly => None,
        }
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BillingCycle::Weekly => "Weekly",
            BillingCycle::Monthly => "Monthly",
        };
        f.write_str(label)
    }
}

impl FromStr for BillingCycle {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "weekly" | "week" | "semanal" => Ok(BillingCycle::Weekly),
            "monthly" | "month" | "mensal" => Ok(BillingCycle::Monthly),
            other => Err(format!("unknown billing cycle `{other}`")),
        }
    }
}

/// Number of days in the given month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

/// Builds a date in the given month, clamping `day` to the month's last day.
pub fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let day = day.clamp(1, days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Shifts `date` by `months`, clamping the day to the target month's length.
pub fn shift_month(date: NaiveDate, months: i32) -> NaiveDate {
    month_anchor(date, months, date.day())
}

/// Returns the month `offset` months away from `date`, with `day` clamped to its length.
pub fn month_anchor(date: NaiveDate, offset: i32, day: u32) -> NaiveDate {
    let index = date.year() * 12 + date.month0() as i32 + offset;
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    clamped_date(year, month, day).unwrap_or(date)
}

/// True when both dates fall in the same calendar month.
pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// Most recent date on or before `from` that falls on `weekday` (1 = Monday, 7 = Sunday).
pub fn last_weekday_on_or_before(from: NaiveDate, weekday: u32) -> NaiveDate {
    let target = weekday.clamp(1, 7) as i64;
    let current = from.weekday().number_from_monday() as i64;
    let delta = (current - target).rem_euclid(7);
    from - Duration::days(delta)
}

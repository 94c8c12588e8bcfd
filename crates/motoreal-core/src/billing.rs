//! Bill projection: works out the next unpaid due date of each recurring vehicle cost.
//!
//! A period counts as paid when an EXPENSE in the bill's category falls inside a
//! tolerance window around the candidate due date. The window is a heuristic: it is
//! asymmetric for monthly bills and can overlap adjacent periods, so two payments in
//! the same category close together may settle one period or two.

use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use motoreal_domain::{
    category::ids, last_weekday_on_or_before, month_anchor, BillingCycle, Transaction, Vehicle,
};

/// Days before a monthly candidate that still count as paying it.
pub const MONTHLY_WINDOW_BEFORE: i64 = 20;
/// Days after a monthly candidate that still count as paying it.
pub const MONTHLY_WINDOW_AFTER: i64 = 15;
pub const WEEKLY_WINDOW: i64 = 3;
/// Weekly projection starts this many weeks back so missed payments surface as overdue.
pub const WEEKLY_LOOKBACK_WEEKS: i64 = 3;

const MAX_MONTHLY_STEPS: i32 = 12;
const MAX_WEEKLY_STEPS: i64 = 52;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BillKind {
    Rent,
    Financing,
    Insurance,
}

impl BillKind {
    pub fn category_id(self) -> &'static str {
        match self {
            BillKind::Rent => ids::RENT,
            BillKind::Financing => ids::FINANCING,
            BillKind::Insurance => ids::INSURANCE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BillKind::Rent => "Aluguel",
            BillKind::Financing => "Financiamento",
            BillKind::Insurance => "Seguro",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rent" | "aluguel" => Some(BillKind::Rent),
            "financing" | "financiamento" => Some(BillKind::Financing),
            "insurance" | "seguro" => Some(BillKind::Insurance),
            _ => None,
        }
    }
}

impl fmt::Display for BillKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a due date sits relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DueStatus {
    Overdue(u32),
    DueToday,
    DueIn(u32),
}

impl DueStatus {
    pub fn from_days(days: i64) -> Self {
        match days {
            d if d < 0 => DueStatus::Overdue(d.unsigned_abs() as u32),
            0 => DueStatus::DueToday,
            d => DueStatus::DueIn(d as u32),
        }
    }

    pub fn is_overdue(self) -> bool {
        matches!(self, DueStatus::Overdue(_))
    }
}

impl fmt::Display for DueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DueStatus::Overdue(1) => f.write_str("overdue by 1 day"),
            DueStatus::Overdue(days) => write!(f, "overdue by {days} days"),
            DueStatus::DueToday => f.write_str("due today"),
            DueStatus::DueIn(1) => f.write_str("due in 1 day"),
            DueStatus::DueIn(days) => write!(f, "due in {days} days"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpcomingBill {
    pub kind: BillKind,
    pub amount: f64,
    pub due_date: NaiveDate,
    /// Signed day difference between the due date and today.
    pub days: i64,
    pub status: DueStatus,
}

/// Next unpaid due date for a recurring cost.
///
/// `base_due_day` is a day of month for monthly bills and a weekday (1 = Monday) for
/// weekly ones. Only EXPENSE transactions in `category` are considered.
pub fn next_due_date(
    category: &str,
    base_due_day: u32,
    frequency: BillingCycle,
    history: &[Transaction],
    today: NaiveDate,
) -> NaiveDate {
    let paid_within = |start: NaiveDate, end: NaiveDate| {
        history.iter().any(|txn| {
            txn.is_expense() && txn.category == category && txn.date >= start && txn.date <= end
        })
    };

    match frequency {
        BillingCycle::Monthly => {
            for step in 0..MAX_MONTHLY_STEPS {
                let candidate = month_anchor(today, step, base_due_day);
                let start = candidate - Duration::days(MONTHLY_WINDOW_BEFORE);
                let end = candidate + Duration::days(MONTHLY_WINDOW_AFTER);
                if !paid_within(start, end) {
                    return candidate;
                }
            }
            month_anchor(today, MAX_MONTHLY_STEPS, base_due_day)
        }
        BillingCycle::Weekly => {
            let first = last_weekday_on_or_before(today, base_due_day)
                - Duration::weeks(WEEKLY_LOOKBACK_WEEKS);
            for step in 0..MAX_WEEKLY_STEPS {
                let candidate = first + Duration::weeks(step);
                let start = candidate - Duration::days(WEEKLY_WINDOW);
                let end = candidate + Duration::days(WEEKLY_WINDOW);
                if !paid_within(start, end) {
                    return candidate;
                }
            }
            first + Duration::weeks(MAX_WEEKLY_STEPS)
        }
    }
}

pub struct BillProjector;

impl BillProjector {
    /// Signed day difference and status of `due` relative to `today`.
    pub fn status(due: NaiveDate, today: NaiveDate) -> (i64, DueStatus) {
        let days = (due - today).num_days();
        (days, DueStatus::from_days(days))
    }

    /// Projects a single bill for the vehicle, if the vehicle carries that cost.
    pub fn bill(
        vehicle: &Vehicle,
        kind: BillKind,
        transactions: &[Transaction],
        today: NaiveDate,
    ) -> Option<UpcomingBill> {
        let (amount, due_day, cycle) = match kind {
            BillKind::Rent => vehicle
                .rent()
                .map(|rent| (rent.amount, rent.due_day, rent.frequency))?,
            BillKind::Financing => vehicle
                .financing()
                .map(|fin| (fin.installment, fin.due_day, BillingCycle::Monthly))?,
            BillKind::Insurance => vehicle
                .insurance()
                .map(|ins| (ins.installment_value, ins.due_day, BillingCycle::Monthly))?,
        };
        if amount <= 0.0 {
            return None;
        }

        let history: Vec<Transaction> = transactions
            .iter()
            .filter(|txn| txn.vehicle_id == vehicle.id)
            .cloned()
            .collect();
        let due_date = next_due_date(kind.category_id(), due_day, cycle, &history, today);
        let (days, status) = Self::status(due_date, today);
        Some(UpcomingBill {
            kind,
            amount,
            due_date,
            days,
            status,
        })
    }

    /// All bills for the vehicle, most urgent first.
    pub fn upcoming_bills(
        vehicle: &Vehicle,
        transactions: &[Transaction],
        today: NaiveDate,
    ) -> Vec<UpcomingBill> {
        let mut bills: Vec<UpcomingBill> = [BillKind::Rent, BillKind::Financing, BillKind::Insurance]
            .into_iter()
            .filter_map(|kind| Self::bill(vehicle, kind, transactions, today))
            .collect();
        bills.sort_by_key(|bill| bill.days);
        bills
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motoreal_domain::{
        FinancingTerms, InsurancePlan, Ownership, RentTerms, TransactionType,
    };
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expense(vehicle_id: Uuid, category: &str, on: NaiveDate) -> Transaction {
        Transaction::new(vehicle_id, TransactionType::Expense, category, 100.0, on)
    }

    #[test]
    fn monthly_bill_without_payment_is_due_this_month() {
        let today = date(2025, 3, 5);
        let due = next_due_date(ids::FINANCING, 10, BillingCycle::Monthly, &[], today);
        assert_eq!(due, date(2025, 3, 10));
    }

    #[test]
    fn payment_inside_window_rolls_to_next_month() {
        let vehicle_id = Uuid::new_v4();
        let today = date(2025, 3, 5);
        let history = vec![expense(vehicle_id, ids::FINANCING, date(2025, 3, 8))];

        let due = next_due_date(ids::FINANCING, 10, BillingCycle::Monthly, &history, today);
        assert_eq!(due, date(2025, 4, 10));
    }

    #[test]
    fn two_payments_close_together_settle_two_periods() {
        let vehicle_id = Uuid::new_v4();
        let today = date(2025, 3, 5);
        let history = vec![
            expense(vehicle_id, ids::FINANCING, date(2025, 3, 8)),
            expense(vehicle_id, ids::FINANCING, date(2025, 3, 22)),
        ];

        let due = next_due_date(ids::FINANCING, 10, BillingCycle::Monthly, &history, today);
        assert_eq!(due, date(2025, 5, 10));
    }

    #[test]
    fn income_and_other_categories_do_not_count_as_payment() {
        let vehicle_id = Uuid::new_v4();
        let today = date(2025, 3, 5);
        let history = vec![
            Transaction::new(
                vehicle_id,
                TransactionType::Income,
                ids::FINANCING,
                900.0,
                date(2025, 3, 8),
            ),
            expense(vehicle_id, ids::FUEL, date(2025, 3, 9)),
        ];

        let due = next_due_date(ids::FINANCING, 10, BillingCycle::Monthly, &history, today);
        assert_eq!(due, date(2025, 3, 10));
    }

    #[test]
    fn unpaid_past_due_date_is_overdue() {
        let today = date(2025, 3, 20);
        let due = next_due_date(ids::RENT, 5, BillingCycle::Monthly, &[], today);
        let (days, status) = BillProjector::status(due, today);

        assert_eq!(due, date(2025, 3, 5));
        assert_eq!(days, -15);
        assert_eq!(status, DueStatus::Overdue(15));
        assert_eq!(status.to_string(), "overdue by 15 days");
    }

    #[test]
    fn due_day_is_clamped_to_short_months() {
        let today = date(2025, 2, 3);
        let due = next_due_date(ids::RENT, 31, BillingCycle::Monthly, &[], today);
        assert_eq!(due, date(2025, 2, 28));
    }

    #[test]
    fn monthly_projection_stops_after_twelve_periods() {
        let vehicle_id = Uuid::new_v4();
        let today = date(2025, 1, 5);
        let history: Vec<Transaction> = (0..14)
            .map(|offset| expense(vehicle_id, ids::INSURANCE, month_anchor(today, offset, 10)))
            .collect();

        let due = next_due_date(ids::INSURANCE, 10, BillingCycle::Monthly, &history, today);
        assert_eq!(due, date(2026, 1, 10));
    }

    #[test]
    fn weekly_projection_surfaces_missed_weeks() {
        // 2025-03-12 is a Wednesday; rent is due on Mondays.
        let today = date(2025, 3, 12);
        let due = next_due_date(ids::RENT, 1, BillingCycle::Weekly, &[], today);
        assert_eq!(due, date(2025, 2, 17));
    }

    #[test]
    fn weekly_projection_skips_paid_weeks() {
        let vehicle_id = Uuid::new_v4();
        let today = date(2025, 3, 12);
        let history: Vec<Transaction> = [date(2025, 2, 17), date(2025, 2, 25), date(2025, 3, 3), date(2025, 3, 9)]
            .into_iter()
            .map(|on| expense(vehicle_id, ids::RENT, on))
            .collect();

        let due = next_due_date(ids::RENT, 1, BillingCycle::Weekly, &history, today);
        assert_eq!(due, date(2025, 3, 17));
        assert_eq!(BillProjector::status(due, today).1, DueStatus::DueIn(5));
    }

    #[test]
    fn upcoming_bills_only_include_costs_of_the_vehicle_mode() {
        let today = date(2025, 3, 5);
        let rented = Vehicle::new(
            "Onix",
            "ABC1D23",
            Ownership::Rented(RentTerms::new(1000.0, BillingCycle::Monthly, Some(5))),
        )
        .with_insurance(InsurancePlan::new(150.0, Some(20)));

        let bills = BillProjector::upcoming_bills(&rented, &[], today);
        let kinds: Vec<_> = bills.iter().map(|bill| bill.kind).collect();

        assert_eq!(kinds, vec![BillKind::Rent, BillKind::Insurance]);
        assert_eq!(bills[0].status, DueStatus::DueToday);
        assert_eq!(bills[1].days, 15);
    }

    #[test]
    fn payments_of_other_vehicles_are_ignored() {
        let today = date(2025, 3, 5);
        let financed = Vehicle::new(
            "HB20",
            "XYZ9876",
            Ownership::Financed(FinancingTerms::new(900.0, Some(10), 48)),
        );
        let other = expense(Uuid::new_v4(), ids::FINANCING, date(2025, 3, 8));

        let bills = BillProjector::upcoming_bills(&financed, &[other], today);
        assert_eq!(bills.len(), 1);
        assert_eq!(bills[0].due_date, date(2025, 3, 10));
    }

    #[test]
    fn bills_sort_most_overdue_first() {
        let today = date(2025, 3, 25);
        let financed = Vehicle::new(
            "HB20",
            "XYZ9876",
            Ownership::Financed(FinancingTerms::new(900.0, Some(20), 48)),
        )
        .with_insurance(InsurancePlan::new(150.0, Some(2)));

        let bills = BillProjector::upcoming_bills(&financed, &[], today);
        assert_eq!(bills[0].kind, BillKind::Insurance);
        assert_eq!(bills[0].days, -23);
        assert_eq!(bills[1].kind, BillKind::Financing);
        assert_eq!(bills[1].days, -5);
    }
}

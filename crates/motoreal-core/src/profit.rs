//! Month-to-date profit estimate and goal back-solving.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use motoreal_domain::{
    category::is_fixed_cost, days_in_month, same_month, BillingCycle, Transaction, Vehicle,
};

/// Share of gross income held back for upkeep.
pub const MAINTENANCE_RESERVE_RATE: f64 = 0.10;
/// Margin assumed when the month's own figures give no plausible ratio.
pub const DEFAULT_MARGIN: f64 = 0.60;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyFinancials {
    pub income: f64,
    pub variable_costs: f64,
    pub total_monthly_fixed: f64,
    pub provisioned_fixed_costs: f64,
    pub maintenance_reserve: f64,
    pub real_profit: f64,
    pub days_in_month: u32,
    pub current_day: u32,
}

impl MonthlyFinancials {
    fn empty(today: NaiveDate) -> Self {
        Self {
            income: 0.0,
            variable_costs: 0.0,
            total_monthly_fixed: 0.0,
            provisioned_fixed_costs: 0.0,
            maintenance_reserve: 0.0,
            real_profit: 0.0,
            days_in_month: days_in_month(today.year(), today.month()),
            current_day: today.day(),
        }
    }

    pub fn total_costs(&self) -> f64 {
        self.variable_costs + self.provisioned_fixed_costs + self.maintenance_reserve
    }

    /// Fraction of the month's fixed costs provisioned so far, in percent.
    pub fn provision_progress(&self) -> f64 {
        if self.total_monthly_fixed <= 0.0 {
            return 0.0;
        }
        (self.provisioned_fixed_costs / self.total_monthly_fixed * 100.0).clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    pub goal: f64,
    pub remaining: f64,
    pub remaining_days: u32,
    pub daily_net_needed: f64,
    pub estimated_margin: f64,
    pub daily_gross_needed: f64,
    pub progress: f64,
    pub goal_met: bool,
}

impl GoalProgress {
    fn zero() -> Self {
        Self {
            goal: 0.0,
            remaining: 0.0,
            remaining_days: 0,
            daily_net_needed: 0.0,
            estimated_margin: 0.0,
            daily_gross_needed: 0.0,
            progress: 0.0,
            goal_met: false,
        }
    }
}

/// Monthly cost of a vehicle's recurring obligations for the given month length.
pub fn total_monthly_fixed(vehicle: &Vehicle, days_in_month: u32) -> f64 {
    let rent = vehicle
        .rent()
        .map(|rent| match rent.frequency.period_days() {
            Some(cycle_days) => rent.amount / cycle_days as f64 * days_in_month as f64,
            None => rent.amount,
        })
        .unwrap_or(0.0);
    let financing = vehicle.financing().map(|fin| fin.installment).unwrap_or(0.0);
    let insurance = vehicle
        .insurance()
        .map(|ins| ins.installment_value)
        .unwrap_or(0.0);
    rent + financing + insurance
}

pub struct ProfitCalculator;

impl ProfitCalculator {
    /// Figures for the month containing `today`. Transactions outside that month,
    /// or belonging to other vehicles, are ignored.
    pub fn monthly(
        vehicle: Option<&Vehicle>,
        transactions: &[Transaction],
        today: NaiveDate,
    ) -> MonthlyFinancials {
        let Some(vehicle) = vehicle else {
            return MonthlyFinancials::empty(today);
        };

        let mut result = MonthlyFinancials::empty(today);
        for txn in transactions
            .iter()
            .filter(|txn| txn.vehicle_id == vehicle.id && same_month(txn.date, today))
        {
            if txn.is_income() {
                result.income += txn.amount;
            } else if !is_fixed_cost(&txn.category) {
                result.variable_costs += txn.amount;
            }
        }

        result.total_monthly_fixed = total_monthly_fixed(vehicle, result.days_in_month);
        result.provisioned_fixed_costs = result.total_monthly_fixed / result.days_in_month as f64
            * result.current_day as f64;
        result.maintenance_reserve = result.income * MAINTENANCE_RESERVE_RATE;
        result.real_profit = result.income
            - result.variable_costs
            - result.provisioned_fixed_costs
            - result.maintenance_reserve;
        result
    }

    /// Back-solves what the rest of the month needs to reach `goal`.
    pub fn goal_progress(financials: &MonthlyFinancials, goal: Option<f64>) -> GoalProgress {
        let goal = match goal {
            Some(goal) if goal > 0.0 => goal,
            _ => return GoalProgress::zero(),
        };

        let remaining = goal - financials.real_profit;
        let remaining_days = financials
            .days_in_month
            .saturating_sub(financials.current_day)
            + 1;
        let daily_net_needed = if remaining > 0.0 {
            remaining / remaining_days as f64
        } else {
            0.0
        };
        let estimated_margin = Self::estimated_margin(financials);
        let daily_gross_needed = if estimated_margin > 0.0 {
            daily_net_needed / estimated_margin
        } else {
            0.0
        };
        let progress = (financials.real_profit / goal * 100.0).clamp(0.0, 100.0);

        GoalProgress {
            goal,
            remaining,
            remaining_days,
            daily_net_needed,
            estimated_margin,
            daily_gross_needed,
            progress,
            goal_met: financials.real_profit >= goal,
        }
    }

    /// Net-to-gross ratio of the month so far, or [`DEFAULT_MARGIN`] when implausible.
    pub fn estimated_margin(financials: &MonthlyFinancials) -> f64 {
        if financials.income <= 0.0 {
            return DEFAULT_MARGIN;
        }
        let margin = financials.real_profit / financials.income;
        if margin.is_finite() && margin > 0.0 && margin <= 1.0 {
            margin
        } else {
            DEFAULT_MARGIN
        }
    }
}

/// Weekly rent provisioned per day, for display next to the monthly figure.
pub fn daily_rent(vehicle: &Vehicle, days_in_month: u32) -> Option<f64> {
    let rent = vehicle.rent()?;
    Some(match rent.frequency {
        BillingCycle::Weekly => rent.amount / 7.0,
        BillingCycle::Monthly => rent.amount / days_in_month.max(1) as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use motoreal_domain::{
        category::ids, FinancingTerms, InsurancePlan, Ownership, RentTerms, TransactionType,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rented(amount: f64, frequency: BillingCycle) -> Vehicle {
        Vehicle::new(
            "Onix",
            "ABC1D23",
            Ownership::Rented(RentTerms::new(amount, frequency, None)),
        )
    }

    fn owned() -> Vehicle {
        Vehicle::new("Argo", "QWE1234", Ownership::owned(None))
    }

    #[test]
    fn rent_is_provisioned_by_elapsed_days() {
        let vehicle = rented(1000.0, BillingCycle::Monthly);
        let result = ProfitCalculator::monthly(Some(&vehicle), &[], date(2025, 4, 15));

        assert_eq!(result.days_in_month, 30);
        assert_eq!(result.total_monthly_fixed, 1000.0);
        assert!((result.provisioned_fixed_costs - 500.0).abs() < 1e-9);
        assert!((result.real_profit + 500.0).abs() < 1e-9);
    }

    #[test]
    fn provision_is_monotonic_and_complete_on_last_day() {
        let vehicle = Vehicle::new(
            "HB20",
            "XYZ9876",
            Ownership::Financed(FinancingTerms::new(930.0, None, 48)),
        )
        .with_insurance(InsurancePlan::new(155.0, None));

        let mut previous = 0.0;
        for day in 1..=31 {
            let result = ProfitCalculator::monthly(Some(&vehicle), &[], date(2025, 1, day));
            assert!(result.provisioned_fixed_costs >= previous);
            previous = result.provisioned_fixed_costs;
        }
        assert!((previous - 1085.0).abs() < 1e-9);
    }

    #[test]
    fn weekly_rent_uses_seven_day_cycle() {
        let vehicle = rented(700.0, BillingCycle::Weekly);
        let result = ProfitCalculator::monthly(Some(&vehicle), &[], date(2025, 4, 10));

        assert!((result.total_monthly_fixed - 3000.0).abs() < 1e-9);
        assert!((result.provisioned_fixed_costs - 1000.0).abs() < 1e-9);
        assert_eq!(daily_rent(&vehicle, 30), Some(100.0));
    }

    #[test]
    fn income_reserve_and_profit() {
        let vehicle = owned();
        let today = date(2025, 5, 20);
        let txns = vec![Transaction::new(
            vehicle.id,
            TransactionType::Income,
            ids::UBER,
            1000.0,
            date(2025, 5, 3),
        )];

        let result = ProfitCalculator::monthly(Some(&vehicle), &txns, today);
        assert_eq!(result.maintenance_reserve, 100.0);
        assert_eq!(result.real_profit, 900.0);
    }

    #[test]
    fn fixed_cost_payments_are_not_variable_costs() {
        let vehicle = rented(1000.0, BillingCycle::Monthly);
        let today = date(2025, 4, 30);
        let txns = vec![
            Transaction::new(vehicle.id, TransactionType::Expense, ids::RENT, 1000.0, date(2025, 4, 5)),
            Transaction::new(vehicle.id, TransactionType::Expense, ids::FUEL, 300.0, date(2025, 4, 6)),
            Transaction::new(vehicle.id, TransactionType::Expense, ids::OTHER, 50.0, date(2025, 4, 7)),
            Transaction::new(vehicle.id, TransactionType::Expense, ids::FUEL, 80.0, date(2025, 3, 30)),
        ];

        let result = ProfitCalculator::monthly(Some(&vehicle), &txns, today);
        assert_eq!(result.variable_costs, 350.0);
        assert!((result.provisioned_fixed_costs - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn absent_vehicle_yields_zeros() {
        let result = ProfitCalculator::monthly(None, &[], date(2025, 2, 10));
        assert_eq!(result.income, 0.0);
        assert_eq!(result.real_profit, 0.0);
        assert_eq!(result.days_in_month, 28);
    }

    #[test]
    fn zero_goal_yields_zero_metrics() {
        let vehicle = owned();
        let financials = ProfitCalculator::monthly(Some(&vehicle), &[], date(2025, 5, 20));
        let goal = ProfitCalculator::goal_progress(&financials, Some(0.0));

        assert_eq!(goal.daily_gross_needed, 0.0);
        assert_eq!(goal.progress, 0.0);
        assert!(!goal.goal_met);
    }

    #[test]
    fn met_goal_reports_full_progress() {
        let vehicle = owned();
        let txns = vec![Transaction::new(
            vehicle.id,
            TransactionType::Income,
            ids::NINETY_NINE,
            5000.0,
            date(2025, 5, 2),
        )];
        let financials = ProfitCalculator::monthly(Some(&vehicle), &txns, date(2025, 5, 20));
        let goal = ProfitCalculator::goal_progress(&financials, Some(3000.0));

        assert!(goal.goal_met);
        assert_eq!(goal.progress, 100.0);
        assert_eq!(goal.daily_net_needed, 0.0);
        assert_eq!(goal.daily_gross_needed, 0.0);
    }

    #[test]
    fn daily_gross_target_divides_by_margin() {
        let vehicle = owned();
        let txns = vec![Transaction::new(
            vehicle.id,
            TransactionType::Income,
            ids::UBER,
            1000.0,
            date(2025, 4, 1),
        )];
        // Day 21 of a 30-day month leaves 10 days including today.
        let financials = ProfitCalculator::monthly(Some(&vehicle), &txns, date(2025, 4, 21));
        let goal = ProfitCalculator::goal_progress(&financials, Some(1900.0));

        assert_eq!(goal.remaining_days, 10);
        assert!((goal.remaining - 1000.0).abs() < 1e-9);
        assert!((goal.daily_net_needed - 100.0).abs() < 1e-9);
        assert!((goal.estimated_margin - 0.9).abs() < 1e-9);
        assert!((goal.daily_gross_needed - 100.0 / 0.9).abs() < 1e-9);
        assert!((goal.progress - 900.0 / 1900.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn implausible_margin_defaults_to_sixty_percent() {
        let vehicle = rented(3000.0, BillingCycle::Monthly);
        let txns = vec![Transaction::new(
            vehicle.id,
            TransactionType::Income,
            ids::UBER,
            100.0,
            date(2025, 4, 1),
        )];
        let financials = ProfitCalculator::monthly(Some(&vehicle), &txns, date(2025, 4, 20));
        assert!(financials.real_profit < 0.0);

        let goal = ProfitCalculator::goal_progress(&financials, Some(2000.0));
        assert_eq!(goal.estimated_margin, DEFAULT_MARGIN);
        assert_eq!(goal.progress, 0.0);
        assert!(goal.daily_gross_needed > goal.daily_net_needed);
    }
}

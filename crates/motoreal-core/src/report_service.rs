use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use motoreal_domain::{same_month, Account, Snapshot, Transaction, TransactionType, Vehicle};

pub const DEFAULT_REPORT_DAYS: u32 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPerformance {
    pub date: NaiveDate,
    pub income: f64,
    pub expense: f64,
}

impl DailyPerformance {
    pub fn net(&self) -> f64 {
        self.income - self.expense
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformShare {
    pub category_id: String,
    pub label: String,
    pub color: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancingProgress {
    pub paid: u32,
    pub total: u32,
    pub remaining_installments: u32,
    pub remaining_amount: f64,
    pub percent: f64,
}

pub struct ReportService;

impl ReportService {
    /// Per-day totals for the `days` days ending today, oldest first.
    pub fn daily_performance(
        transactions: &[Transaction],
        today: NaiveDate,
        days: u32,
    ) -> Vec<DailyPerformance> {
        let days = days.max(1) as i64;
        (0..days)
            .rev()
            .map(|offset| {
                let date = today - Duration::days(offset);
                let mut row = DailyPerformance {
                    date,
                    income: 0.0,
                    expense: 0.0,
                };
                for txn in transactions.iter().filter(|txn| txn.date == date) {
                    match txn.kind {
                        TransactionType::Income => row.income += txn.amount,
                        TransactionType::Expense => row.expense += txn.amount,
                    }
                }
                row
            })
            .collect()
    }

    /// This month's income grouped by category, largest first.
    pub fn platform_split(
        snapshot: &Snapshot,
        transactions: &[Transaction],
        today: NaiveDate,
    ) -> Vec<PlatformShare> {
        let mut totals: HashMap<&str, f64> = HashMap::new();
        for txn in transactions
            .iter()
            .filter(|txn| txn.is_income() && same_month(txn.date, today))
        {
            *totals.entry(txn.category.as_str()).or_default() += txn.amount;
        }

        let mut shares: Vec<PlatformShare> = totals
            .into_iter()
            .filter(|(_, amount)| *amount > 0.0)
            .map(|(id, amount)| {
                let category = snapshot.category(id);
                PlatformShare {
                    category_id: id.to_string(),
                    label: category
                        .map(|c| c.label.clone())
                        .unwrap_or_else(|| id.to_string()),
                    color: category
                        .map(|c| c.color.clone())
                        .unwrap_or_else(|| "#64748b".into()),
                    amount,
                }
            })
            .collect();
        shares.sort_by(|a, b| {
            b.amount
                .total_cmp(&a.amount)
                .then_with(|| a.category_id.cmp(&b.category_id))
        });
        shares
    }

    pub fn consolidated_balance(accounts: &[Account]) -> f64 {
        accounts.iter().map(|account| account.balance).sum()
    }

    /// Transactions linked to `account_id`, newest first.
    pub fn account_statement<'a>(
        transactions: &'a [Transaction],
        account_id: &str,
    ) -> Vec<&'a Transaction> {
        let mut rows: Vec<&Transaction> = transactions
            .iter()
            .filter(|txn| txn.account_id.as_deref() == Some(account_id))
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        rows
    }

    pub fn financing_progress(vehicle: &Vehicle) -> Option<FinancingProgress> {
        let terms = vehicle.financing()?;
        let percent = if terms.total_months > 0 {
            (terms.paid_months as f64 / terms.total_months as f64 * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        Some(FinancingProgress {
            paid: terms.paid_months,
            total: terms.total_months,
            remaining_installments: terms.remaining_installments(),
            remaining_amount: terms.remaining_amount(),
            percent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motoreal_domain::{category::ids, CategoryItem, CategoryType, FinancingTerms, Ownership};
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn daily_performance_covers_window_oldest_first() {
        let vehicle_id = Uuid::new_v4();
        let today = date(2025, 6, 10);
        let txns = vec![
            Transaction::new(vehicle_id, TransactionType::Income, ids::UBER, 200.0, today),
            Transaction::new(vehicle_id, TransactionType::Expense, ids::FUEL, 80.0, today),
            Transaction::new(vehicle_id, TransactionType::Income, ids::UBER, 50.0, date(2025, 6, 4)),
            Transaction::new(vehicle_id, TransactionType::Income, ids::UBER, 999.0, date(2025, 6, 3)),
        ];

        let rows = ReportService::daily_performance(&txns, today, 7);
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[0].date, date(2025, 6, 4));
        assert_eq!(rows[0].income, 50.0);
        assert_eq!(rows[6].net(), 120.0);
        assert!(rows.iter().all(|row| row.income < 999.0));
    }

    #[test]
    fn platform_split_groups_income_by_category() {
        let mut snapshot = Snapshot::seeded();
        let custom = CategoryItem::custom("iFood", CategoryType::Income, "#ff0000");
        let custom_id = custom.id.clone();
        snapshot.categories.push(custom);

        let vehicle_id = Uuid::new_v4();
        let today = date(2025, 6, 20);
        let txns = vec![
            Transaction::new(vehicle_id, TransactionType::Income, ids::UBER, 300.0, date(2025, 6, 1)),
            Transaction::new(vehicle_id, TransactionType::Income, ids::UBER, 200.0, date(2025, 6, 2)),
            Transaction::new(vehicle_id, TransactionType::Income, ids::NINETY_NINE, 150.0, date(2025, 6, 2)),
            Transaction::new(vehicle_id, TransactionType::Income, &custom_id, 400.0, date(2025, 6, 3)),
            Transaction::new(vehicle_id, TransactionType::Income, ids::NINETY_NINE, 700.0, date(2025, 5, 30)),
            Transaction::new(vehicle_id, TransactionType::Expense, ids::FUEL, 90.0, date(2025, 6, 3)),
        ];

        let shares = ReportService::platform_split(&snapshot, &txns, today);
        let summary: Vec<(&str, f64)> = shares
            .iter()
            .map(|share| (share.label.as_str(), share.amount))
            .collect();
        assert_eq!(summary, vec![("Uber", 500.0), ("iFood", 400.0), ("99", 150.0)]);
    }

    #[test]
    fn statement_lists_linked_transactions_newest_first() {
        let vehicle_id = Uuid::new_v4();
        let txns = vec![
            Transaction::new(vehicle_id, TransactionType::Income, ids::UBER, 10.0, date(2025, 1, 1))
                .with_account("acc_prof"),
            Transaction::new(vehicle_id, TransactionType::Income, ids::UBER, 20.0, date(2025, 1, 5))
                .with_account("acc_prof"),
            Transaction::new(vehicle_id, TransactionType::Income, ids::UBER, 30.0, date(2025, 1, 3)),
        ];

        let rows = ReportService::account_statement(&txns, "acc_prof");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].amount, 20.0);
    }

    #[test]
    fn financing_progress_reports_remaining_amount() {
        let mut terms = FinancingTerms::new(1000.0, None, 10);
        terms.paid_months = 4;
        let vehicle = Vehicle::new("HB20", "XYZ9876", Ownership::Financed(terms));

        let progress = ReportService::financing_progress(&vehicle).unwrap();
        assert_eq!(progress.remaining_installments, 6);
        assert_eq!(progress.remaining_amount, 6000.0);
        assert_eq!(progress.percent, 40.0);
    }
}

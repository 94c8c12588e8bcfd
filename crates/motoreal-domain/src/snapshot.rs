//! The full data set, as kept in memory and mirrored to the cloud.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    account::{default_accounts, Account},
    category::{default_categories, CategoryItem},
    transaction::Transaction,
    user::User,
    vehicle::Vehicle,
};

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub vehicles: Vec<Vehicle>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub categories: Vec<CategoryItem>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
    #[serde(default = "Snapshot::schema_version_default")]
    pub schema_version: u8,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::seeded()
    }
}

impl Snapshot {
    /// An empty data set with the built-in categories and default accounts.
    pub fn seeded() -> Self {
        Self {
            user: None,
            vehicles: Vec::new(),
            transactions: Vec::new(),
            categories: default_categories(),
            accounts: default_accounts(),
            last_updated: Utc::now(),
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    pub fn vehicle(&self, id: Uuid) -> Option<&Vehicle> {
        self.vehicles.iter().find(|vehicle| vehicle.id == id)
    }

    pub fn vehicle_mut(&mut self, id: Uuid) -> Option<&mut Vehicle> {
        self.vehicles.iter_mut().find(|vehicle| vehicle.id == id)
    }

    pub fn vehicle_by_plate(&self, plate: &str) -> Option<&Vehicle> {
        self.vehicles
            .iter()
            .find(|vehicle| vehicle.plate.eq_ignore_ascii_case(plate))
    }

    pub fn active_vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.iter().filter(|vehicle| vehicle.is_active())
    }

    pub fn transaction(&self, id: Uuid) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| txn.id == id)
    }

    pub fn vehicle_transactions(&self, vehicle_id: Uuid) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .iter()
            .filter(move |txn| txn.vehicle_id == vehicle_id)
    }

    pub fn account(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id == id)
    }

    pub fn account_mut(&mut self, id: &str) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|account| account.id == id)
    }

    pub fn default_account(&self) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|account| account.is_default)
            .or_else(|| self.accounts.first())
    }

    pub fn category(&self, id: &str) -> Option<&CategoryItem> {
        self.categories.iter().find(|category| category.id == id)
    }

    pub fn category_label<'a>(&'a self, id: &'a str) -> &'a str {
        self.category(id)
            .map(|category| category.label.as_str())
            .unwrap_or(id)
    }

    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_snapshot_has_defaults() {
        let snapshot = Snapshot::seeded();
        assert!(snapshot.user.is_none());
        assert_eq!(snapshot.categories.len(), 8);
        assert_eq!(snapshot.default_account().map(|a| a.id.as_str()), Some("acc_prof"));
    }

    #[test]
    fn partial_snapshot_json_fills_missing_collections() {
        let raw = r#"{"user":null,"vehicles":[],"last_updated":"2025-02-01T10:00:00Z"}"#;
        let snapshot: Snapshot = serde_json::from_str(raw).unwrap();

        assert!(snapshot.transactions.is_empty());
        assert!(snapshot.accounts.is_empty());
        assert_eq!(snapshot.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(snapshot.category_label("UBER"), "UBER");
    }
}

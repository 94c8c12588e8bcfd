//! Income and expense entries recorded against a vehicle.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    /// Sign applied to an account balance when a transaction of this type is recorded.
    pub fn balance_sign(self) -> f64 {
        match self {
            TransactionType::Income => 1.0,
            TransactionType::Expense => -1.0,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionType::Income => "Income",
            TransactionType::Expense => "Expense",
        };
        f.write_str(label)
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "income" | "in" | "receita" => Ok(TransactionType::Income),
            "expense" | "out" | "despesa" => Ok(TransactionType::Expense),
            other => Err(format!("unknown transaction type `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FuelType {
    Gasoline,
    Ethanol,
    Gnv,
    Electric,
}

impl FuelType {
    pub fn unit(self) -> &'static str {
        match self {
            FuelType::Gasoline | FuelType::Ethanol => "L",
            FuelType::Gnv => "m³",
            FuelType::Electric => "kWh",
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FuelType::Gasoline => "Gasoline",
            FuelType::Ethanol => "Ethanol",
            FuelType::Gnv => "GNV",
            FuelType::Electric => "Electric",
        };
        f.write_str(label)
    }
}

impl FromStr for FuelType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gasoline" | "gasolina" => Ok(FuelType::Gasoline),
            "ethanol" | "etanol" | "alcool" => Ok(FuelType::Ethanol),
            "gnv" | "cng" => Ok(FuelType::Gnv),
            "electric" | "eletrico" | "ev" => Ok(FuelType::Electric),
            other => Err(format!("unknown fuel type `{other}`")),
        }
    }
}

/// Fuel purchase details attached to a FUEL expense.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FuelDetails {
    pub fuel_type: FuelType,
    pub unit_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl FuelDetails {
    /// Derives the purchased volume from the paid amount when a unit price is known.
    pub fn new(fuel_type: FuelType, unit_price: f64, amount: f64) -> Self {
        let volume = (unit_price > 0.0).then(|| amount / unit_price);
        Self {
            fuel_type,
            unit_price,
            volume,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category: String,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub fuel: Option<FuelDetails>,
}

impl Transaction {
    pub fn new(
        vehicle_id: Uuid,
        kind: TransactionType,
        category: impl Into<String>,
        amount: f64,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            vehicle_id,
            account_id: None,
            kind,
            category: category.into(),
            amount,
            date,
            description: None,
            fuel: None,
        }
    }

    pub fn with_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let text = description.into();
        self.description = (!text.trim().is_empty()).then_some(text);
        self
    }

    pub fn with_fuel(mut self, fuel_type: FuelType, unit_price: f64) -> Self {
        self.fuel = Some(FuelDetails::new(fuel_type, unit_price, self.amount));
        self
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }

    /// Amount as it affects an account balance.
    pub fn signed_amount(&self) -> f64 {
        self.kind.balance_sign() * self.amount
    }
}

impl Identifiable for Transaction {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fuel_volume_derives_from_unit_price() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 2).unwrap();
        let txn = Transaction::new(Uuid::new_v4(), TransactionType::Expense, "FUEL", 250.0, date)
            .with_fuel(FuelType::Gasoline, 5.0);

        let fuel = txn.fuel.as_ref().unwrap();
        assert_eq!(fuel.volume, Some(50.0));
        assert_eq!(fuel.fuel_type.unit(), "L");
    }

    #[test]
    fn zero_unit_price_leaves_volume_empty() {
        let details = FuelDetails::new(FuelType::Gnv, 0.0, 80.0);
        assert_eq!(details.volume, None);
    }

    #[test]
    fn serializes_type_field_in_wire_format() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 2).unwrap();
        let txn = Transaction::new(Uuid::new_v4(), TransactionType::Income, "UBER", 120.0, date)
            .with_account("acc_prof")
            .with_description("  ");
        let value = serde_json::to_value(&txn).unwrap();

        assert_eq!(value["type"], "INCOME");
        assert_eq!(value["accountId"], "acc_prof");
        assert_eq!(value["date"], "2025-05-02");
        assert!(value.get("description").is_none());
        assert_eq!(txn.signed_amount(), 120.0);
    }

    #[test]
    fn fuel_details_sit_at_the_top_level() {
        let raw = serde_json::json!({
            "id": "0d6c3b8e-51a4-4c9e-9a43-3f0a3b6f2c11",
            "vehicleId": "7a8f1f8e-8a51-4c43-9d2b-2c1b0f3f1a10",
            "type": "EXPENSE",
            "category": "FUEL",
            "amount": 200,
            "date": "2025-05-02",
            "fuelType": "GASOLINE",
            "unitPrice": 5,
            "volume": 40
        });
        let txn: Transaction = serde_json::from_value(raw).unwrap();
        let fuel = txn.fuel.as_ref().unwrap();
        assert_eq!(fuel.fuel_type, FuelType::Gasoline);
        assert_eq!(fuel.volume, Some(40.0));

        let value = serde_json::to_value(&txn).unwrap();
        assert_eq!(value["fuelType"], "GASOLINE");
        assert_eq!(value["unitPrice"], 5.0);
        assert!(value.get("fuel").is_none());
    }

    #[test]
    fn plain_expense_has_no_fuel_details() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 2).unwrap();
        let txn = Transaction::new(Uuid::new_v4(), TransactionType::Expense, "WASH", 30.0, date);
        let value = serde_json::to_value(&txn).unwrap();
        assert!(value.get("fuelType").is_none());

        let parsed: Transaction = serde_json::from_value(value).unwrap();
        assert!(parsed.fuel.is_none());
    }
}

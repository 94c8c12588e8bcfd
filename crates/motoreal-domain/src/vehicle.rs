//! Vehicles and the recurring costs attached to how they are held.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

pub const DEFAULT_RENT_DUE_DAY: u32 = 5;
pub const DEFAULT_FINANCING_DUE_DAY: u32 = 10;
pub const DEFAULT_INSURANCE_DUE_DAY: u32 = 10;

/// A vehicle driven for rideshare or delivery work.
///
/// Mode-specific cost fields live inside [`Ownership`], so a vehicle only ever
/// carries the fields that apply to how it is held.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: Uuid,
    pub model: String,
    pub plate: String,
    #[serde(flatten)]
    pub ownership: Ownership,
    #[serde(flatten)]
    pub insurance: Option<InsurancePlan>,
    #[serde(default)]
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn new(model: impl Into<String>, plate: impl Into<String>, ownership: Ownership) -> Self {
        Self {
            id: Uuid::new_v4(),
            model: model.into(),
            plate: plate.into(),
            ownership,
            insurance: None,
            is_archived: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_insurance(mut self, insurance: InsurancePlan) -> Self {
        self.insurance = Some(insurance);
        self
    }

    pub fn ownership_type(&self) -> OwnershipType {
        self.ownership.kind()
    }

    pub fn is_active(&self) -> bool {
        !self.is_archived
    }

    pub fn rent(&self) -> Option<&RentTerms> {
        match &self.ownership {
            Ownership::Rented(terms) => Some(terms),
            _ => None,
        }
    }

    pub fn financing(&self) -> Option<&FinancingTerms> {
        match &self.ownership {
            Ownership::Financed(terms) => Some(terms),
            _ => None,
        }
    }

    pub fn financing_mut(&mut self) -> Option<&mut FinancingTerms> {
        match &mut self.ownership {
            Ownership::Financed(terms) => Some(terms),
            _ => None,
        }
    }

    pub fn insurance(&self) -> Option<&InsurancePlan> {
        self.insurance.as_ref()
    }
}

impl Identifiable for Vehicle {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Vehicle {
    fn name(&self) -> &str {
        &self.model
    }
}

impl Displayable for Vehicle {
    fn display_label(&self) -> String {
        if self.is_archived {
            format!("{} ({}) [archived]", self.model, self.plate)
        } else {
            format!("{} ({})", self.model, self.plate)
        }
    }
}

/// Flat classification of [`Ownership`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OwnershipType {
    Owned,
    Financed,
    Rented,
}

impl fmt::Display for OwnershipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OwnershipType::Owned => "Owned",
            OwnershipType::Financed => "Financed",
            OwnershipType::Rented => "Rented",
        };
        f.write_str(label)
    }
}

impl FromStr for OwnershipType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "owned" | "own" | "proprio" => Ok(OwnershipType::Owned),
            "financed" | "financing" | "financiado" => Ok(OwnershipType::Financed),
            "rented" | "rent" | "alugado" => Ok(OwnershipType::Rented),
            other => Err(format!("unknown ownership type `{other}`")),
        }
    }
}

/// How a vehicle is held, with the recurring-cost fields of that mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "ownershipType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Ownership {
    Owned {
        #[serde(
            rename = "vehicleValue",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        vehicle_value: Option<f64>,
    },
    Financed(FinancingTerms),
    Rented(RentTerms),
}

impl Ownership {
    pub fn owned(vehicle_value: Option<f64>) -> Self {
        Ownership::Owned { vehicle_value }
    }

    pub fn kind(&self) -> OwnershipType {
        match self {
            Ownership::Owned { .. } => OwnershipType::Owned,
            Ownership::Financed(_) => OwnershipType::Financed,
            Ownership::Rented(_) => OwnershipType::Rented,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RentTerms {
    #[serde(rename = "rentAmount")]
    pub amount: f64,
    #[serde(rename = "rentFrequency", default)]
    pub frequency: BillingCycle,
    /// Day of month for monthly rent, or weekday (1 = Monday) for weekly rent.
    #[serde(rename = "rentDueDay", default = "default_rent_due_day")]
    pub due_day: u32,
}

impl RentTerms {
    pub fn new(amount: f64, frequency: BillingCycle, due_day: Option<u32>) -> Self {
        Self {
            amount,
            frequency,
            due_day: due_day.unwrap_or(DEFAULT_RENT_DUE_DAY),
        }
    }

    pub fn payment_label(&self) -> &'static str {
        match self.frequency {
            BillingCycle::Weekly => "Aluguel Semanal",
            BillingCycle::Monthly => "Aluguel Mensal",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancingTerms {
    #[serde(rename = "financingInstallment")]
    pub installment: f64,
    #[serde(rename = "financingDueDay", default = "default_financing_due_day")]
    pub due_day: u32,
    #[serde(rename = "financingTotalMonths", default)]
    pub total_months: u32,
    #[serde(rename = "financingPaidMonths", default)]
    pub paid_months: u32,
}

impl FinancingTerms {
    pub fn new(installment: f64, due_day: Option<u32>, total_months: u32) -> Self {
        Self {
            installment,
            due_day: due_day.unwrap_or(DEFAULT_FINANCING_DUE_DAY),
            total_months,
            paid_months: 0,
        }
    }

    pub fn remaining_installments(&self) -> u32 {
        self.total_months.saturating_sub(self.paid_months)
    }

    pub fn remaining_amount(&self) -> f64 {
        self.installment * self.remaining_installments() as f64
    }

    pub fn is_settled(&self) -> bool {
        self.total_months > 0 && self.paid_months >= self.total_months
    }

    /// Records one more paid installment, never exceeding the contract length.
    pub fn mark_paid(&mut self) {
        if self.total_months == 0 || self.paid_months < self.total_months {
            self.paid_months += 1;
        }
    }

    pub fn next_installment_label(&self) -> String {
        if self.total_months > 0 {
            format!("Parcela {}/{}", self.paid_months + 1, self.total_months)
        } else {
            format!("Parcela {}/?", self.paid_months + 1)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InsurancePlan {
    #[serde(rename = "insuranceInstallmentValue")]
    pub installment_value: f64,
    #[serde(rename = "insuranceDueDay", default = "default_insurance_due_day")]
    pub due_day: u32,
    #[serde(
        rename = "insuranceTotalInstallments",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub total_installments: Option<u32>,
    #[serde(
        rename = "insuranceRenewalDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub renewal_date: Option<NaiveDate>,
}

impl InsurancePlan {
    pub fn new(installment_value: f64, due_day: Option<u32>) -> Self {
        Self {
            installment_value,
            due_day: due_day.unwrap_or(DEFAULT_INSURANCE_DUE_DAY),
            total_installments: None,
            renewal_date: None,
        }
    }
}

fn default_rent_due_day() -> u32 {
    DEFAULT_RENT_DUE_DAY
}

fn default_financing_due_day() -> u32 {
    DEFAULT_FINANCING_DUE_DAY
}

fn default_insurance_due_day() -> u32 {
    DEFAULT_INSURANCE_DUE_DAY
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn rented_vehicle_serializes_only_rent_fields() {
        let vehicle = Vehicle::new(
            "Onix",
            "ABC1D23",
            Ownership::Rented(RentTerms::new(450.0, BillingCycle::Weekly, Some(1))),
        );
        let value = serde_json::to_value(&vehicle).unwrap();

        assert_eq!(value["ownershipType"], "RENTED");
        assert_eq!(value["rentAmount"], 450.0);
        assert_eq!(value["rentFrequency"], "WEEKLY");
        assert!(value.get("financingInstallment").is_none());
        assert!(value.get("vehicleValue").is_none());
        assert!(value.get("insurance").is_none());
    }

    #[test]
    fn financed_vehicle_round_trips_through_json() {
        let vehicle = Vehicle::new(
            "HB20",
            "XYZ9876",
            Ownership::Financed(FinancingTerms::new(900.0, None, 48)),
        )
        .with_insurance(InsurancePlan::new(180.0, Some(20)));

        let text = serde_json::to_string(&vehicle).unwrap();
        let parsed: Vehicle = serde_json::from_str(&text).unwrap();

        assert_eq!(parsed, vehicle);
        assert_eq!(parsed.financing().map(|f| f.due_day), Some(10));
        assert!(parsed.rent().is_none());
    }

    #[test]
    fn insurance_fields_sit_beside_the_ownership_fields() {
        let raw = json!({
            "id": "7a8f1f8e-8a51-4c43-9d2b-2c1b0f3f1a10",
            "model": "HB20",
            "plate": "XYZ9876",
            "ownershipType": "FINANCED",
            "financingInstallment": 900,
            "financingTotalMonths": 48,
            "insuranceInstallmentValue": 150,
            "insuranceDueDay": 20,
            "createdAt": "2025-01-02T10:00:00Z"
        });
        let vehicle: Vehicle = serde_json::from_value(raw).unwrap();
        let insurance = vehicle.insurance().unwrap();
        assert_eq!(insurance.installment_value, 150.0);
        assert_eq!(insurance.due_day, 20);

        let value = serde_json::to_value(&vehicle).unwrap();
        assert_eq!(value["insuranceInstallmentValue"], 150.0);
        assert_eq!(value["insuranceDueDay"], 20);
        assert!(value.get("insurance").is_none());
    }

    #[test]
    fn open_ended_financing_label_has_unknown_total() {
        let mut terms = FinancingTerms::new(500.0, None, 0);
        assert_eq!(terms.next_installment_label(), "Parcela 1/?");
        terms.mark_paid();
        assert_eq!(terms.next_installment_label(), "Parcela 2/?");

        let bounded = FinancingTerms::new(500.0, None, 36);
        assert_eq!(bounded.next_installment_label(), "Parcela 1/36");
    }

    #[test]
    fn missing_due_days_fall_back_to_defaults() {
        let raw = json!({
            "id": Uuid::new_v4(),
            "model": "Kwid",
            "plate": "AAA1111",
            "ownershipType": "RENTED",
            "rentAmount": 1200.0,
            "createdAt": "2025-01-01T00:00:00Z"
        });
        let vehicle: Vehicle = serde_json::from_value(raw).unwrap();
        let rent = vehicle.rent().unwrap();

        assert_eq!(rent.due_day, DEFAULT_RENT_DUE_DAY);
        assert_eq!(rent.frequency, BillingCycle::Monthly);
        assert!(!vehicle.is_archived);
    }

    #[test]
    fn financing_progress_is_capped() {
        let mut terms = FinancingTerms::new(500.0, Some(5), 2);
        assert_eq!(terms.next_installment_label(), "Parcela 1/2");
        terms.mark_paid();
        terms.mark_paid();
        terms.mark_paid();

        assert_eq!(terms.paid_months, 2);
        assert!(terms.is_settled());
        assert_eq!(terms.remaining_amount(), 0.0);
    }

    #[test]
    fn owned_vehicle_keeps_optional_value() {
        let vehicle = Vehicle::new("Argo", "QWE1234", Ownership::owned(Some(65000.0)));
        let value: Value = serde_json::to_value(&vehicle).unwrap();

        assert_eq!(value["ownershipType"], "OWNED");
        assert_eq!(value["vehicleValue"], 65000.0);
        assert_eq!(vehicle.display_label(), "Argo (QWE1234)");
    }
}

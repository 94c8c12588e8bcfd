//! Transaction categories, including the protected system set.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;
use crate::transaction::TransactionType;

/// Identifiers of the built-in categories.
pub mod ids {
    pub const UBER: &str = "UBER";
    pub const NINETY_NINE: &str = "99";
    pub const FUEL: &str = "FUEL";
    pub const MAINTENANCE: &str = "MAINTENANCE";
    pub const INSURANCE: &str = "INSURANCE";
    pub const RENT: &str = "RENT";
    pub const FINANCING: &str = "FINANCING";
    pub const OTHER: &str = "OTHER";
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryType {
    Income,
    Expense,
    Both,
}

impl CategoryType {
    pub fn accepts(self, kind: TransactionType) -> bool {
        matches!(
            (self, kind),
            (CategoryType::Both, _)
                | (CategoryType::Income, TransactionType::Income)
                | (CategoryType::Expense, TransactionType::Expense)
        )
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CategoryType::Income => "Income",
            CategoryType::Expense => "Expense",
            CategoryType::Both => "Both",
        };
        f.write_str(label)
    }
}

impl FromStr for CategoryType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(CategoryType::Income),
            "expense" => Ok(CategoryType::Expense),
            "both" => Ok(CategoryType::Both),
            other => Err(format!("unknown category type `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryItem {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: CategoryType,
    pub color: String,
    #[serde(default)]
    pub is_system: bool,
}

impl CategoryItem {
    pub fn custom(label: impl Into<String>, kind: CategoryType, color: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            label: label.into(),
            kind,
            color: color.into(),
            is_system: false,
        }
    }

    fn system(id: &str, label: &str, kind: CategoryType, color: &str) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            color: color.into(),
            is_system: true,
        }
    }

    pub fn accepts(&self, kind: TransactionType) -> bool {
        self.kind.accepts(kind)
    }
}

impl NamedEntity for CategoryItem {
    fn name(&self) -> &str {
        &self.label
    }
}

/// Fixed vehicle costs are provisioned across the month rather than counted as variable spend.
pub fn is_fixed_cost(category_id: &str) -> bool {
    matches!(category_id, ids::RENT | ids::FINANCING | ids::INSURANCE)
}

pub fn default_categories() -> Vec<CategoryItem> {
    vec![
        CategoryItem::system(ids::UBER, "Uber", CategoryType::Income, "#10b981"),
        CategoryItem::system(ids::NINETY_NINE, "99", CategoryType::Income, "#f59e0b"),
        CategoryItem::system(ids::FUEL, "Combustível", CategoryType::Expense, "#ef4444"),
        CategoryItem::system(ids::MAINTENANCE, "Manutenção", CategoryType::Expense, "#6366f1"),
        CategoryItem::system(ids::INSURANCE, "Seguro", CategoryType::Expense, "#8b5cf6"),
        CategoryItem::system(ids::RENT, "Aluguel", CategoryType::Expense, "#ec4899"),
        CategoryItem::system(ids::FINANCING, "Parcela", CategoryType::Expense, "#14b8a6"),
        CategoryItem::system(ids::OTHER, "Outros", CategoryType::Both, "#94a3b8"),
    ]
}

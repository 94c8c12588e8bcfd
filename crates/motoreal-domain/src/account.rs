//! Balance buckets that transactions credit and debit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;
use crate::transaction::TransactionType;

pub const PROFESSIONAL_ACCOUNT_ID: &str = "acc_prof";
pub const PERSONAL_ACCOUNT_ID: &str = "acc_pers";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Checking,
    Savings,
    Cash,
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AccountType::Checking => "Checking",
            AccountType::Savings => "Savings",
            AccountType::Cash => "Cash",
        };
        f.write_str(label)
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "checking" | "corrente" => Ok(AccountType::Checking),
            "savings" | "poupanca" => Ok(AccountType::Savings),
            "cash" | "dinheiro" => Ok(AccountType::Cash),
            other => Err(format!("unknown account type `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AccountType,
    pub balance: f64,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "default_account_color")]
    pub color: String,
}

impl Account {
    pub fn new(name: impl Into<String>, kind: AccountType, balance: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            kind,
            balance,
            is_default: false,
            color: default_account_color(),
        }
    }

    /// Credits income and debits expenses.
    pub fn apply(&mut self, kind: TransactionType, amount: f64) {
        self.balance += kind.balance_sign() * amount;
    }

    /// Undoes a previous [`Account::apply`].
    pub fn revert(&mut self, kind: TransactionType, amount: f64) {
        self.balance -= kind.balance_sign() * amount;
    }
}

impl NamedEntity for Account {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Displayable for Account {
    fn display_label(&self) -> String {
        if self.is_default {
            format!("{} ({}, default)", self.name, self.kind)
        } else {
            format!("{} ({})", self.name, self.kind)
        }
    }
}

/// Accounts seeded on first use.
pub fn default_accounts() -> Vec<Account> {
    vec![
        Account {
            id: PROFESSIONAL_ACCOUNT_ID.into(),
            name: "Conta Profissional".into(),
            kind: AccountType::Checking,
            balance: 0.0,
            is_default: true,
            color: "#3b82f6".into(),
        },
        Account {
            id: PERSONAL_ACCOUNT_ID.into(),
            name: "Conta Pessoal".into(),
            kind: AccountType::Checking,
            balance: 0.0,
            is_default: false,
            color: "#10b981".into(),
        },
    ]
}

fn default_account_color() -> String {
    "#64748b".into()
}

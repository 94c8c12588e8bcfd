use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub onboarding_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_goal: Option<f64>,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            onboarding_completed: false,
            monthly_goal: None,
        }
    }

    /// Monthly goal, treating non-positive values as unset.
    pub fn goal(&self) -> Option<f64> {
        self.monthly_goal.filter(|goal| *goal > 0.0)
    }
}

impl Identifiable for User {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for User {
    fn name(&self) -> &str {
        &self.name
    }
}

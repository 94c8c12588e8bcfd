use motoreal_domain::{Snapshot, User};

use crate::validation::{ensure_non_empty, ensure_positive_amount};
use crate::CoreError;

pub struct UserService;

impl UserService {
    /// Saves the profile and marks onboarding as complete.
    ///
    /// Re-onboarding keeps the existing user id.
    pub fn onboard(
        snapshot: &mut Snapshot,
        name: &str,
        email: &str,
        goal: Option<f64>,
    ) -> Result<(), CoreError> {
        ensure_non_empty(name, "name")?;
        let email = email.trim();
        if !email.contains('@') {
            return Err(CoreError::Validation(format!(
                "`{email}` is not a valid email address"
            )));
        }
        if let Some(goal) = goal {
            ensure_positive_amount(goal, "monthly goal")?;
        }

        let mut user = User::new(name.trim(), email);
        if let Some(existing) = snapshot.user.as_ref() {
            user.id = existing.id;
        }
        user.onboarding_completed = true;
        user.monthly_goal = goal;
        snapshot.user = Some(user);
        Ok(())
    }

    /// Sets or clears the monthly net-profit goal.
    pub fn set_goal(snapshot: &mut Snapshot, goal: Option<f64>) -> Result<(), CoreError> {
        if let Some(goal) = goal {
            ensure_positive_amount(goal, "monthly goal")?;
        }
        let user = snapshot.user.as_mut().ok_or_else(|| {
            CoreError::InvalidOperation("complete onboarding before setting a goal".into())
        })?;
        user.monthly_goal = goal;
        Ok(())
    }
}

use motoreal_domain::{Account, Snapshot};

use crate::validation::ensure_non_empty;
use crate::CoreError;

pub struct AccountService;

impl AccountService {
    pub fn add(snapshot: &mut Snapshot, account: Account) -> Result<String, CoreError> {
        ensure_non_empty(&account.name, "account name")?;
        if !account.balance.is_finite() {
            return Err(CoreError::Validation(
                "account balance must be a finite number".into(),
            ));
        }
        if snapshot.account(&account.id).is_some() {
            return Err(CoreError::Validation(format!(
                "account id {} already exists",
                account.id
            )));
        }
        let id = account.id.clone();
        snapshot.accounts.push(account);
        Ok(id)
    }

    /// Finds an account by exact id or case-insensitive name.
    pub fn find<'a>(snapshot: &'a Snapshot, reference: &str) -> Result<&'a Account, CoreError> {
        let needle = reference.trim();
        snapshot
            .account(needle)
            .or_else(|| {
                snapshot
                    .accounts
                    .iter()
                    .find(|account| account.name.eq_ignore_ascii_case(needle))
            })
            .ok_or_else(|| CoreError::AccountNotFound(needle.to_string()))
    }
}

use chrono::NaiveDate;
use uuid::Uuid;

use motoreal_domain::{Snapshot, Transaction, TransactionType};

use crate::billing::BillKind;
use crate::validation::ensure_positive_amount;
use crate::vehicle_service::VehicleService;
use crate::CoreError;

pub struct TransactionService;

impl TransactionService {
    /// Records a transaction and credits or debits its linked account.
    pub fn add(snapshot: &mut Snapshot, transaction: Transaction) -> Result<Uuid, CoreError> {
        ensure_positive_amount(transaction.amount, "amount")?;
        if snapshot.vehicle(transaction.vehicle_id).is_none() {
            return Err(CoreError::VehicleNotFound(
                transaction.vehicle_id.to_string(),
            ));
        }
        let category = snapshot
            .category(&transaction.category)
            .ok_or_else(|| CoreError::CategoryNotFound(transaction.category.clone()))?;
        if !category.accepts(transaction.kind) {
            return Err(CoreError::Validation(format!(
                "category {} does not accept {} transactions",
                category.label,
                transaction.kind.to_string().to_lowercase()
            )));
        }
        if let Some(account_id) = transaction.account_id.as_deref() {
            let account = snapshot
                .account_mut(account_id)
                .ok_or_else(|| CoreError::AccountNotFound(account_id.to_string()))?;
            account.apply(transaction.kind, transaction.amount);
        }

        let id = transaction.id;
        snapshot.transactions.push(transaction);
        Ok(id)
    }

    /// Deletes a transaction and reverses its effect on the linked account.
    pub fn remove(snapshot: &mut Snapshot, id: Uuid) -> Result<Transaction, CoreError> {
        let index = snapshot
            .transactions
            .iter()
            .position(|txn| txn.id == id)
            .ok_or(CoreError::TransactionNotFound(id))?;
        let removed = snapshot.transactions.remove(index);
        if let Some(account_id) = removed.account_id.as_deref() {
            match snapshot.account_mut(account_id) {
                Some(account) => account.revert(removed.kind, removed.amount),
                None => tracing::warn!(
                    transaction = %removed.id,
                    account = account_id,
                    "removed transaction referenced a missing account"
                ),
            }
        }
        Ok(removed)
    }

    /// Links an account to a transaction recorded without one, applying its balance effect.
    pub fn link_account(
        snapshot: &mut Snapshot,
        id: Uuid,
        account_id: &str,
    ) -> Result<(), CoreError> {
        let (kind, amount) = {
            let txn = snapshot
                .transaction(id)
                .ok_or(CoreError::TransactionNotFound(id))?;
            if let Some(existing) = txn.account_id.as_deref() {
                return Err(CoreError::InvalidOperation(format!(
                    "transaction is already linked to account {existing}"
                )));
            }
            (txn.kind, txn.amount)
        };
        let account = snapshot
            .account_mut(account_id)
            .ok_or_else(|| CoreError::AccountNotFound(account_id.to_string()))?;
        account.apply(kind, amount);
        if let Some(txn) = snapshot.transactions.iter_mut().find(|txn| txn.id == id) {
            txn.account_id = Some(account_id.to_string());
        }
        Ok(())
    }

    /// Transactions of one vehicle, newest first.
    pub fn for_vehicle(snapshot: &Snapshot, vehicle_id: Uuid) -> Vec<&Transaction> {
        let mut rows: Vec<&Transaction> = snapshot.vehicle_transactions(vehicle_id).collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        rows
    }

    /// Resolves a full id or unique id prefix.
    pub fn resolve_id(snapshot: &Snapshot, reference: &str) -> Result<Uuid, CoreError> {
        let needle = reference.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return Err(CoreError::Validation("transaction id cannot be empty".into()));
        }
        let matches: Vec<Uuid> = snapshot
            .transactions
            .iter()
            .map(|txn| txn.id)
            .filter(|id| id.to_string().starts_with(&needle))
            .collect();
        match matches.as_slice() {
            [id] => Ok(*id),
            [] => Err(CoreError::Validation(format!(
                "no transaction matches `{reference}`"
            ))),
            _ => Err(CoreError::Validation(format!(
                "`{reference}` matches {} transactions; use more characters",
                matches.len()
            ))),
        }
    }

    /// Records the payment of a recurring vehicle cost.
    ///
    /// Financing payments also advance the vehicle's paid-installment counter.
    pub fn pay_bill(
        snapshot: &mut Snapshot,
        vehicle_id: Uuid,
        kind: BillKind,
        account_id: Option<String>,
        date: NaiveDate,
    ) -> Result<Uuid, CoreError> {
        let vehicle = snapshot
            .vehicle(vehicle_id)
            .ok_or_else(|| CoreError::VehicleNotFound(vehicle_id.to_string()))?;
        let missing = || {
            CoreError::InvalidOperation(format!(
                "vehicle {} has no {} to pay",
                vehicle.plate,
                kind.label().to_lowercase()
            ))
        };
        let (amount, description) = match kind {
            BillKind::Rent => vehicle
                .rent()
                .map(|rent| (rent.amount, rent.payment_label().to_string()))
                .ok_or_else(missing)?,
            BillKind::Financing => vehicle
                .financing()
                .map(|fin| (fin.installment, fin.next_installment_label()))
                .ok_or_else(missing)?,
            BillKind::Insurance => vehicle
                .insurance()
                .map(|ins| (ins.installment_value, "Parcela Seguro".to_string()))
                .ok_or_else(missing)?,
        };

        let mut transaction = Transaction::new(
            vehicle_id,
            TransactionType::Expense,
            kind.category_id(),
            amount,
            date,
        )
        .with_description(description);
        transaction.account_id = account_id;

        let id = Self::add(snapshot, transaction)?;
        if kind == BillKind::Financing {
            VehicleService::mark_installment_paid(snapshot, vehicle_id)?;
        }
        Ok(id)
    }
}

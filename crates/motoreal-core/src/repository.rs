use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use motoreal_domain::{
    default_accounts, default_categories, Account, CategoryItem, OwnershipType, Snapshot,
    Transaction, TransactionType, User, Vehicle,
};

use crate::{
    account_service::AccountService,
    billing::BillKind,
    category_service::CategoryService,
    storage::{snapshot_warnings, KeyValueStore, StoreKey},
    sync::SyncHandle,
    transaction_service::TransactionService,
    user_service::UserService,
    vehicle_service::VehicleService,
    CoreError,
};

/// Facade owning the canonical snapshot, its local store and the optional cloud mirror.
///
/// Every mutation persists the collections it touched, bumps `last_updated` and
/// schedules a debounced upload.
pub struct DataRepository {
    snapshot: Snapshot,
    store: Box<dyn KeyValueStore>,
    sync: Option<SyncHandle>,
}

impl DataRepository {
    /// Loads every collection from `store`, seeding defaults for missing keys.
    pub fn open(store: Box<dyn KeyValueStore>) -> Result<Self, CoreError> {
        let user: Option<Option<User>> = load_key(store.as_ref(), StoreKey::User)?;
        let vehicles: Option<Vec<Vehicle>> = load_key(store.as_ref(), StoreKey::Vehicles)?;
        let transactions: Option<Vec<Transaction>> =
            load_key(store.as_ref(), StoreKey::Transactions)?;
        let categories: Option<Vec<CategoryItem>> =
            load_key(store.as_ref(), StoreKey::Categories)?;
        let accounts: Option<Vec<Account>> = load_key(store.as_ref(), StoreKey::Accounts)?;

        let mut seeded = Vec::new();
        if categories.is_none() {
            seeded.push(StoreKey::Categories);
        }
        if accounts.is_none() {
            seeded.push(StoreKey::Accounts);
        }
        let snapshot = Snapshot {
            user: user.flatten(),
            vehicles: vehicles.unwrap_or_default(),
            transactions: transactions.unwrap_or_default(),
            categories: categories.unwrap_or_else(default_categories),
            accounts: accounts.unwrap_or_else(default_accounts),
            ..Snapshot::default()
        };

        let repository = Self {
            snapshot,
            store,
            sync: None,
        };
        repository.persist(&seeded)?;

        for warning in repository.integrity_report() {
            tracing::warn!(%warning, "snapshot integrity");
        }
        tracing::info!(
            vehicles = repository.snapshot.vehicles.len(),
            transactions = repository.snapshot.transactions.len(),
            "repository loaded"
        );
        Ok(repository)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn attach_sync(&mut self, handle: SyncHandle) {
        self.sync = Some(handle);
    }

    /// Detaches the sync worker, flushing anything pending.
    pub fn detach_sync(&mut self) -> Option<SyncHandle> {
        let handle = self.sync.take();
        if let Some(handle) = handle.as_ref() {
            handle.flush();
        }
        handle
    }

    pub fn sync(&self) -> Option<&SyncHandle> {
        self.sync.as_ref()
    }

    // user

    pub fn user(&self) -> Option<&User> {
        self.snapshot.user.as_ref()
    }

    pub fn save_user(&mut self, name: &str, email: &str, goal: Option<f64>) -> Result<(), CoreError> {
        UserService::onboard(&mut self.snapshot, name, email, goal)?;
        self.commit(&[StoreKey::User])
    }

    pub fn set_monthly_goal(&mut self, goal: Option<f64>) -> Result<(), CoreError> {
        UserService::set_goal(&mut self.snapshot, goal)?;
        self.commit(&[StoreKey::User])
    }

    // vehicles

    pub fn add_vehicle(&mut self, vehicle: Vehicle) -> Result<Uuid, CoreError> {
        let id = VehicleService::add(&mut self.snapshot, vehicle)?;
        self.commit(&[StoreKey::Vehicles])?;
        Ok(id)
    }

    pub fn update_vehicle(&mut self, vehicle: Vehicle) -> Result<(), CoreError> {
        VehicleService::update(&mut self.snapshot, vehicle)?;
        self.commit(&[StoreKey::Vehicles])
    }

    pub fn archive_vehicle(&mut self, id: Uuid) -> Result<(), CoreError> {
        VehicleService::archive(&mut self.snapshot, id)?;
        self.commit(&[StoreKey::Vehicles])
    }

    pub fn active_vehicles(&self) -> Vec<&Vehicle> {
        self.snapshot.active_vehicles().collect()
    }

    pub fn vehicle_by_plate(&self, plate: &str) -> Result<&Vehicle, CoreError> {
        VehicleService::find_by_plate(&self.snapshot, plate)
    }

    pub fn mark_installment_paid(&mut self, id: Uuid) -> Result<u32, CoreError> {
        let paid = VehicleService::mark_installment_paid(&mut self.snapshot, id)?;
        self.commit(&[StoreKey::Vehicles])?;
        Ok(paid)
    }

    // transactions

    pub fn add_transaction(&mut self, transaction: Transaction) -> Result<Uuid, CoreError> {
        let touches_account = transaction.account_id.is_some();
        let id = TransactionService::add(&mut self.snapshot, transaction)?;
        self.commit(transaction_keys(touches_account))?;
        Ok(id)
    }

    pub fn delete_transaction(&mut self, id: Uuid) -> Result<Transaction, CoreError> {
        let removed = TransactionService::remove(&mut self.snapshot, id)?;
        self.commit(transaction_keys(removed.account_id.is_some()))?;
        Ok(removed)
    }

    pub fn link_transaction_account(&mut self, id: Uuid, account_id: &str) -> Result<(), CoreError> {
        TransactionService::link_account(&mut self.snapshot, id, account_id)?;
        self.commit(transaction_keys(true))
    }

    pub fn transactions_for_vehicle(&self, vehicle_id: Uuid) -> Vec<&Transaction> {
        TransactionService::for_vehicle(&self.snapshot, vehicle_id)
    }

    pub fn resolve_transaction(&self, reference: &str) -> Result<Uuid, CoreError> {
        TransactionService::resolve_id(&self.snapshot, reference)
    }

    pub fn pay_bill(
        &mut self,
        vehicle_id: Uuid,
        kind: BillKind,
        account_id: Option<String>,
        date: NaiveDate,
    ) -> Result<Uuid, CoreError> {
        let touches_account = account_id.is_some();
        let id = TransactionService::pay_bill(&mut self.snapshot, vehicle_id, kind, account_id, date)?;
        let mut keys = transaction_keys(touches_account).to_vec();
        if kind == BillKind::Financing {
            keys.push(StoreKey::Vehicles);
        }
        self.commit(&keys)?;
        Ok(id)
    }

    // accounts

    pub fn accounts(&self) -> &[Account] {
        &self.snapshot.accounts
    }

    pub fn add_account(&mut self, account: Account) -> Result<String, CoreError> {
        let id = AccountService::add(&mut self.snapshot, account)?;
        self.commit(&[StoreKey::Accounts])?;
        Ok(id)
    }

    pub fn find_account(&self, reference: &str) -> Result<&Account, CoreError> {
        AccountService::find(&self.snapshot, reference)
    }

    // categories

    pub fn add_category(&mut self, category: CategoryItem) -> Result<String, CoreError> {
        let id = CategoryService::add(&mut self.snapshot, category)?;
        self.commit(&[StoreKey::Categories])?;
        Ok(id)
    }

    pub fn delete_category(&mut self, id: &str) -> Result<CategoryItem, CoreError> {
        let removed = CategoryService::remove(&mut self.snapshot, id)?;
        self.commit(&[StoreKey::Categories])?;
        Ok(removed)
    }

    pub fn visible_categories(
        &self,
        kind: Option<TransactionType>,
        vehicle: Option<&Vehicle>,
    ) -> Vec<&CategoryItem> {
        let ownership: Option<OwnershipType> = vehicle.map(Vehicle::ownership_type);
        CategoryService::visible(&self.snapshot, kind, ownership)
    }

    pub fn resolve_category(&self, input: &str) -> Result<&CategoryItem, CoreError> {
        CategoryService::resolve(&self.snapshot, input)
    }

    // data

    /// Resets every collection to its defaults. Pending uploads are dropped, not mirrored.
    pub fn clear_data(&mut self) -> Result<(), CoreError> {
        if let Some(sync) = self.sync.as_ref() {
            sync.cancel();
        }
        self.store.clear()?;
        self.snapshot = Snapshot::seeded();
        self.persist(&StoreKey::ALL)?;
        tracing::info!("local data cleared");
        Ok(())
    }

    /// Replaces all local collections with `snapshot`.
    pub fn restore_snapshot(&mut self, snapshot: Snapshot) -> Result<(), CoreError> {
        let mut snapshot = snapshot;
        if snapshot.categories.is_empty() {
            snapshot.categories = default_categories();
        }
        if snapshot.accounts.is_empty() {
            snapshot.accounts = default_accounts();
        }
        self.snapshot = snapshot;
        self.commit(&StoreKey::ALL)?;
        for warning in self.integrity_report() {
            tracing::warn!(%warning, "restored snapshot integrity");
        }
        Ok(())
    }

    pub fn integrity_report(&self) -> Vec<String> {
        snapshot_warnings(&self.snapshot)
    }

    fn commit(&mut self, keys: &[StoreKey]) -> Result<(), CoreError> {
        self.snapshot.touch();
        self.persist(keys)?;
        if let Some(sync) = self.sync.as_ref() {
            sync.schedule(self.snapshot.clone());
        }
        Ok(())
    }

    fn persist(&self, keys: &[StoreKey]) -> Result<(), CoreError> {
        for key in keys {
            let json = match key {
                StoreKey::User => to_json(&self.snapshot.user),
                StoreKey::Vehicles => to_json(&self.snapshot.vehicles),
                StoreKey::Transactions => to_json(&self.snapshot.transactions),
                StoreKey::Categories => to_json(&self.snapshot.categories),
                StoreKey::Accounts => to_json(&self.snapshot.accounts),
            }
            .map_err(|err| CoreError::Serde(format!("{key}: {err}")))?;
            self.store.write(*key, &json)?;
        }
        Ok(())
    }
}

fn transaction_keys(touches_account: bool) -> &'static [StoreKey] {
    if touches_account {
        &[StoreKey::Transactions, StoreKey::Accounts]
    } else {
        &[StoreKey::Transactions]
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

fn load_key<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: StoreKey,
) -> Result<Option<T>, CoreError> {
    match store.read(key)? {
        Some(json) => serde_json::from_str(&json)
            .map(Some)
            .map_err(|err| CoreError::Serde(format!("{key}: {err}"))),
        None => Ok(None),
    }
}

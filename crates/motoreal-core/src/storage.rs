use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::{Arc, RwLock},
};

use motoreal_domain::Snapshot;

use crate::CoreError;

/// Fixed keys under which each collection is stored as a whole JSON blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    User,
    Vehicles,
    Transactions,
    Categories,
    Accounts,
}

impl StoreKey {
    pub const ALL: [StoreKey; 5] = [
        StoreKey::User,
        StoreKey::Vehicles,
        StoreKey::Transactions,
        StoreKey::Categories,
        StoreKey::Accounts,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StoreKey::User => "user",
            StoreKey::Vehicles => "vehicles",
            StoreKey::Transactions => "transactions",
            StoreKey::Categories => "categories",
            StoreKey::Accounts => "accounts",
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Abstraction over the local persistent key-value store.
pub trait KeyValueStore: Send + Sync {
    fn read(&self, key: StoreKey) -> Result<Option<String>, CoreError>;
    fn write(&self, key: StoreKey, json: &str) -> Result<(), CoreError>;
    fn remove(&self, key: StoreKey) -> Result<(), CoreError>;

    fn clear(&self) -> Result<(), CoreError> {
        for key in StoreKey::ALL {
            self.remove(key)?;
        }
        Ok(())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn read(&self, key: StoreKey) -> Result<Option<String>, CoreError> {
        (**self).read(key)
    }

    fn write(&self, key: StoreKey, json: &str) -> Result<(), CoreError> {
        (**self).write(key, json)
    }

    fn remove(&self, key: StoreKey) -> Result<(), CoreError> {
        (**self).remove(key)
    }

    fn clear(&self) -> Result<(), CoreError> {
        (**self).clear()
    }
}

/// Volatile store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<StoreKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: StoreKey) -> Result<Option<String>, CoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| CoreError::Storage("memory store lock poisoned".into()))?;
        Ok(entries.get(&key).cloned())
    }

    fn write(&self, key: StoreKey, json: &str) -> Result<(), CoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| CoreError::Storage("memory store lock poisoned".into()))?;
        entries.insert(key, json.to_string());
        Ok(())
    }

    fn remove(&self, key: StoreKey) -> Result<(), CoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| CoreError::Storage("memory store lock poisoned".into()))?;
        entries.remove(&key);
        Ok(())
    }
}

/// Detects dangling references within a snapshot.
pub fn snapshot_warnings(snapshot: &Snapshot) -> Vec<String> {
    let vehicle_ids: HashSet<_> = snapshot.vehicles.iter().map(|v| v.id).collect();
    let account_ids: HashSet<_> = snapshot.accounts.iter().map(|a| a.id.as_str()).collect();
    let category_ids: HashSet<_> = snapshot.categories.iter().map(|c| c.id.as_str()).collect();
    let mut warnings = Vec::new();

    for txn in &snapshot.transactions {
        if !vehicle_ids.contains(&txn.vehicle_id) {
            warnings.push(format!(
                "transaction {} references unknown vehicle {}",
                txn.id, txn.vehicle_id
            ));
        }
        if let Some(account) = txn.account_id.as_deref() {
            if !account_ids.contains(account) {
                warnings.push(format!(
                    "transaction {} references unknown account {}",
                    txn.id, account
                ));
            }
        }
        if !category_ids.contains(txn.category.as_str()) {
            warnings.push(format!(
                "transaction {} references missing category {}",
                txn.id, txn.category
            ));
        }
    }
    warnings
}

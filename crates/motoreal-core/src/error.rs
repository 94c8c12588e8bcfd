use std::io;

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Vehicle not found: {0}")]
    VehicleNotFound(String),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(Uuid),
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Category not found: {0}")]
    CategoryNotFound(String),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Sync failed: {0}")]
    Sync(String),
}

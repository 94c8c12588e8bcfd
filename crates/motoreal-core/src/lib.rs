//! motoreal-core
//!
//! Business logic and services for the driver ledger.
//! Depends on motoreal-domain. No CLI, no terminal I/O, no direct file or network access:
//! persistence goes through [`storage::KeyValueStore`] and cloud mirroring through
//! [`sync::CloudBackend`].

pub mod account_service;
pub mod billing;
pub mod category_service;
pub mod error;
pub mod profit;
pub mod report_service;
pub mod repository;
pub mod storage;
pub mod sync;
pub mod time;
pub mod transaction_service;
pub mod user_service;
pub mod validation;
pub mod vehicle_service;

pub use account_service::*;
pub use billing::*;
pub use category_service::*;
pub use error::CoreError;
pub use profit::*;
pub use report_service::*;
pub use repository::DataRepository;
pub use time::Clock;
pub use transaction_service::*;
pub use user_service::*;
pub use vehicle_service::*;

#[cfg(test)]
mod tests;

//! motoreal-domain
//!
//! Pure domain models (Vehicle, Transaction, Account, CategoryItem, User, Snapshot).
//! No I/O, no CLI, no storage. Only data types, core enums and date helpers.

pub mod account;
pub mod category;
pub mod common;
pub mod snapshot;
pub mod transaction;
pub mod user;
pub mod vehicle;

pub use account::*;
pub use category::*;
pub use common::*;
pub use snapshot::*;
pub use transaction::*;
pub use user::*;
pub use vehicle::*;

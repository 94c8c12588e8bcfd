pub mod account;
pub mod backup;
pub mod bills;
pub mod category;
pub mod config;
pub mod dashboard;
pub mod reset;
pub mod sync;
pub mod system;
pub mod transaction;
pub mod user;
pub mod vehicle;

use crate::cli::registry::CommandRegistry;

pub fn register_all(registry: &mut CommandRegistry) {
    let groups = [
        system::definitions(),
        user::definitions(),
        vehicle::definitions(),
        transaction::definitions(),
        bills::definitions(),
        dashboard::definitions(),
        account::definitions(),
        category::definitions(),
        sync::definitions(),
        backup::definitions(),
        config::definitions(),
        reset::definitions(),
    ];
    for entry in groups.into_iter().flatten() {
        registry.register(entry);
    }

    registry.register_alias("transaction", "tx");
    registry.register_alias("quit", "exit");
    registry.register_alias("dash", "dashboard");
}

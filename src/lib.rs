#![doc(test(attr(deny(warnings))))]

//! Driver Ledger tracks what a rideshare driver earns and spends per vehicle,
//! projects the next due date of recurring vehicle bills, and estimates the real
//! monthly profit against a personal goal. The library hosts the interactive
//! shell; domain logic lives in the `motoreal-*` crates.

pub mod cli;
pub mod errors;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!(
            version = utils::build_info::CLI_VERSION,
            "driver ledger tracing initialized"
        );
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}

//! motoreal-cloud
//!
//! HTTP implementations of [`motoreal_core::sync::CloudBackend`]: a generic key-value
//! worker endpoint and a cloud-drive appData file. Both exchange the full snapshot
//! as one JSON document.

pub mod drive;
pub mod worker;

use std::{sync::Arc, time::Duration};

use motoreal_config::SyncSettings;
use motoreal_core::{sync::CloudBackend, CoreError};
use motoreal_domain::Snapshot;

pub use drive::DriveBackend;
pub use worker::WorkerBackend;

const UA: &str = concat!("driver_ledger/", env!("CARGO_PKG_VERSION"));
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub fn http_client() -> Result<reqwest::blocking::Client, CoreError> {
    reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(UA)
        .build()
        .map_err(sync_error)
}

/// Picks the worker backend when configured, else the drive backend, else none.
pub fn backend_from_settings(
    settings: &SyncSettings,
) -> Result<Option<Arc<dyn CloudBackend>>, CoreError> {
    if let Some(worker) = settings.configured_worker() {
        let backend = WorkerBackend::new(worker.endpoint(), &worker.token)?;
        return Ok(Some(Arc::new(backend)));
    }
    if let Some(drive) = settings.configured_drive() {
        let backend = DriveBackend::new(&drive.access_token, &drive.file_name)?;
        return Ok(Some(Arc::new(backend)));
    }
    Ok(None)
}

/// An empty body or JSON `null` means nothing has been stored yet.
pub fn parse_download_body(body: &str) -> Result<Option<Snapshot>, CoreError> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|err| CoreError::Serde(format!("remote snapshot: {err}")))
}

pub(crate) fn sync_error(err: reqwest::Error) -> CoreError {
    CoreError::Sync(err.to_string())
}

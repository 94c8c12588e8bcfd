use motoreal_core::{sync::CloudBackend, CoreError};
use motoreal_domain::Snapshot;

use crate::{http_client, parse_download_body, sync_error};

pub const AUTH_HEADER: &str = "X-Auth-Token";

/// Key-value endpoint storing the snapshot under the caller's token.
pub struct WorkerBackend {
    client: reqwest::blocking::Client,
    url: String,
    token: String,
}

impl WorkerBackend {
    pub fn new(url: &str, token: &str) -> Result<Self, CoreError> {
        Ok(Self {
            client: http_client()?,
            url: url.trim().trim_end_matches('/').to_string(),
            token: token.trim().to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl CloudBackend for WorkerBackend {
    fn name(&self) -> &str {
        "worker"
    }

    fn upload(&self, snapshot: &Snapshot) -> Result<(), CoreError> {
        self.client
            .post(&self.url)
            .header(AUTH_HEADER, &self.token)
            .json(snapshot)
            .send()
            .and_then(|resp| resp.error_for_status())
            .map_err(sync_error)?;
        Ok(())
    }

    fn download(&self) -> Result<Option<Snapshot>, CoreError> {
        let body = self
            .client
            .get(&self.url)
            .header(AUTH_HEADER, &self.token)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.text())
            .map_err(sync_error)?;
        parse_download_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped() {
        let backend = WorkerBackend::new(" https://kv.example.workers.dev/ ", "t").unwrap();
        assert_eq!(backend.url(), "https://kv.example.workers.dev");
    }
}

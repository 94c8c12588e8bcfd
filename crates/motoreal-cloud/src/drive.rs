use serde::{Deserialize, Serialize};

use motoreal_core::{sync::CloudBackend, CoreError};
use motoreal_domain::Snapshot;

use crate::{http_client, parse_download_body, sync_error};

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com";
const APP_DATA_FOLDER: &str = "appDataFolder";
const BOUNDARY: &str = "-------314159265358979323846";

/// Snapshot stored as a single file in the drive's hidden app-data folder.
pub struct DriveBackend {
    client: reqwest::blocking::Client,
    access_token: String,
    file_name: String,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileMetadata<'a> {
    name: &'a str,
    mime_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parents: Option<[&'static str; 1]>,
}

impl DriveBackend {
    pub fn new(access_token: &str, file_name: &str) -> Result<Self, CoreError> {
        Self::with_api_base(access_token, file_name, DEFAULT_API_BASE)
    }

    pub fn with_api_base(
        access_token: &str,
        file_name: &str,
        api_base: &str,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            client: http_client()?,
            access_token: access_token.trim().to_string(),
            file_name: file_name.trim().to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    fn find_file_id(&self) -> Result<Option<String>, CoreError> {
        let list: FileList = self
            .client
            .get(format!("{}/drive/v3/files", self.api_base))
            .bearer_auth(&self.access_token)
            .query(&find_query(&self.file_name))
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json())
            .map_err(sync_error)?;
        Ok(list.files.into_iter().next().map(|file| file.id))
    }
}

impl CloudBackend for DriveBackend {
    fn name(&self) -> &str {
        "drive"
    }

    fn upload(&self, snapshot: &Snapshot) -> Result<(), CoreError> {
        let existing = self.find_file_id()?;
        let content =
            serde_json::to_string(snapshot).map_err(|err| CoreError::Serde(err.to_string()))?;
        let body = multipart_body(&self.file_name, existing.is_none(), &content)?;

        let request = match existing.as_deref() {
            Some(id) => self.client.patch(format!(
                "{}/upload/drive/v3/files/{id}?uploadType=multipart",
                self.api_base
            )),
            None => self.client.post(format!(
                "{}/upload/drive/v3/files?uploadType=multipart",
                self.api_base
            )),
        };
        request
            .bearer_auth(&self.access_token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary=\"{BOUNDARY}\""),
            )
            .body(body)
            .send()
            .and_then(|resp| resp.error_for_status())
            .map_err(sync_error)?;
        Ok(())
    }

    fn download(&self) -> Result<Option<Snapshot>, CoreError> {
        let Some(id) = self.find_file_id()? else {
            return Ok(None);
        };
        let body = self
            .client
            .get(format!("{}/drive/v3/files/{id}", self.api_base))
            .bearer_auth(&self.access_token)
            .query(&[("alt", "media")])
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.text())
            .map_err(sync_error)?;
        parse_download_body(&body)
    }
}

/// Query parameters locating the backup file in the app-data folder.
fn find_query(file_name: &str) -> [(&'static str, String); 4] {
    [
        ("spaces", APP_DATA_FOLDER.to_string()),
        (
            "q",
            format!("name='{file_name}' and '{APP_DATA_FOLDER}' in parents and trashed=false"),
        ),
        ("fields", "files(id,name)".to_string()),
        ("pageSize", "1".to_string()),
    ]
}

/// `multipart/related` body: JSON metadata part followed by the JSON content part.
fn multipart_body(file_name: &str, create: bool, content: &str) -> Result<String, CoreError> {
    let metadata = FileMetadata {
        name: file_name,
        mime_type: "application/json",
        parents: create.then_some([APP_DATA_FOLDER]),
    };
    let metadata =
        serde_json::to_string(&metadata).map_err(|err| CoreError::Serde(err.to_string()))?;
    let delimiter = format!("\r\n--{BOUNDARY}\r\n");
    let close = format!("\r\n--{BOUNDARY}--");
    Ok(format!(
        "{delimiter}Content-Type: application/json\r\n\r\n{metadata}{delimiter}Content-Type: application/json\r\n\r\n{content}{close}"
    ))
}

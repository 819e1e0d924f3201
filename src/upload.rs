//! Google Drive upload of run outputs.
//!
//! Uploads use the Drive v3 REST API with an OAuth bearer access token:
//! a media upload creates the file, then a metadata PATCH names it and moves
//! it into the target folder. Shared drives are supported.
//!
//! Upload failures never abort a run; they come back as a failed
//! [`UploadResult`].

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration as StdDuration;
use thiserror::Error;
use tokio::fs;
use tracing::{error, info, instrument};

use crate::utils::truncate_for_log;

const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";

/// Outcome of one upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    pub success: bool,
    pub file_id: Option<String>,
    pub folder_id: String,
    pub error: Option<String>,
}

impl UploadResult {
    pub fn uploaded(file_id: String, folder_id: &str) -> Self {
        Self {
            success: true,
            file_id: Some(file_id),
            folder_id: folder_id.to_string(),
            error: None,
        }
    }

    pub fn failed(folder_id: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            file_id: None,
            folder_id: folder_id.to_string(),
            error: Some(error.into()),
        }
    }
}

/// Somewhere run outputs can be uploaded.
#[async_trait]
pub trait DriveUploader: Send + Sync {
    async fn upload(&self, path: &Path) -> UploadResult;
}

#[derive(Debug, Error)]
enum DriveError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("cannot read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Drive request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Drive returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected Drive response: {0}")]
    Decode(String),
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Serialize)]
struct DriveMetadata<'a> {
    name: &'a str,
}

/// Uploads into one Drive folder.
#[derive(Debug, Clone)]
pub struct GoogleDriveUploader {
    client: Client,
    folder_id: String,
    access_token: String,
}

impl GoogleDriveUploader {
    pub fn new(folder_id: &str, access_token: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(StdDuration::from_secs(60)).build()?;
        Ok(Self {
            client,
            folder_id: folder_id.to_string(),
            access_token: access_token.to_string(),
        })
    }

    async fn try_upload(&self, path: &Path) -> Result<String, DriveError> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            return Err(DriveError::NotFound(path.display().to_string()));
        }
        let bytes = fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let resp = self
            .client
            .post(UPLOAD_URL)
            .query(&[("uploadType", "media"), ("supportsAllDrives", "true")])
            .bearer_auth(&self.access_token)
            .header(CONTENT_TYPE, mime_type(path))
            .body(bytes)
            .send()
            .await?;
        let created: DriveFile = decode(resp).await?;

        let resp = self
            .client
            .patch(format!("{FILES_URL}/{}", created.id))
            .query(&[
                ("addParents", self.folder_id.as_str()),
                ("supportsAllDrives", "true"),
            ])
            .bearer_auth(&self.access_token)
            .json(&DriveMetadata { name: &name })
            .send()
            .await?;
        let updated: DriveFile = decode(resp).await?;
        Ok(updated.id)
    }
}

async fn decode(resp: reqwest::Response) -> Result<DriveFile, DriveError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(DriveError::Status {
            status: status.as_u16(),
            body: truncate_for_log(&body, 300),
        });
    }
    serde_json::from_str(&body).map_err(|e| DriveError::Decode(e.to_string()))
}

#[async_trait]
impl DriveUploader for GoogleDriveUploader {
    #[instrument(level = "info", skip_all, fields(path = %path.display(), folder_id = %self.folder_id))]
    async fn upload(&self, path: &Path) -> UploadResult {
        match self.try_upload(path).await {
            Ok(file_id) => {
                info!(%file_id, "Uploaded to Drive");
                UploadResult::uploaded(file_id, &self.folder_id)
            }
            Err(e) => {
                error!(error = %e, "Drive upload failed");
                UploadResult::failed(&self.folder_id, e.to_string())
            }
        }
    }
}

/// `text/csv` for CSV files, JSON for run logs, octet-stream otherwise.
pub fn mime_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type() {
        assert_eq!(mime_type(Path::new("out/content_candidates.csv")), "text/csv");
        assert_eq!(mime_type(Path::new("out/A.CSV")), "text/csv");
        assert_eq!(mime_type(Path::new("run_log.json")), "application/json");
        assert_eq!(mime_type(Path::new("notes")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_missing_file_fails_without_network() {
        let uploader = GoogleDriveUploader::new("folder123", "token").unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let result = uploader.upload(&tmp.path().join("missing.csv")).await;
        assert!(!result.success);
        assert_eq!(result.file_id, None);
        assert_eq!(result.folder_id, "folder123");
        assert!(result.error.unwrap().contains("file not found"));
    }

    #[test]
    fn test_drive_file_decodes() {
        let file: DriveFile =
            serde_json::from_str(r#"{"kind":"drive#file","id":"abc123","name":"x.csv"}"#).unwrap();
        assert_eq!(file.id, "abc123");
    }
}

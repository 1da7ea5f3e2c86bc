//! Google Drive API client for the script file flows.

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};

use crate::error::{DriveError, Result};
use crate::filter::{is_eligible_script, FOLDER_MIME_TYPE, PYTHON_FILE_MIME_TYPE};
use crate::models::{
    ApiErrorResponse, DriveApiFile, DriveDocument, FileListResponse, UploadResponse,
};
use crate::storage::TokenStore;

/// Base URL for Google Drive API v3.
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Upload URL for Google Drive API.
const UPLOAD_API_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

/// Metadata fields requested when listing or fetching files.
const LIST_FIELDS: &str = "files(id,name,mimeType,size,modifiedTime)";
const FILE_FIELDS: &str = "id,name,mimeType,modifiedTime";

/// Client for the Drive REST surface used by the script flows.
///
/// Every request carries bearer-token authorization with the current stored
/// token. Failures are terminal; no flow retries.
#[derive(Clone)]
pub struct DriveClient {
    tokens: TokenStore,
    http: Client,
    api_base: String,
    upload_base: String,
}

impl DriveClient {
    pub fn new(tokens: TokenStore) -> Self {
        Self::with_base_urls(tokens, DRIVE_API_BASE, UPLOAD_API_BASE)
    }

    /// Client against alternate endpoints, used to point tests at a mock
    /// server.
    pub fn with_base_urls(tokens: TokenStore, api_base: &str, upload_base: &str) -> Self {
        Self {
            tokens,
            http: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            upload_base: upload_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Download a file's text content by id.
    pub async fn download_file(&self, file: &DriveDocument) -> Result<String> {
        let response = self
            .http
            .get(format!("{}/files/{}", self.api_base, file.id))
            .bearer_auth(self.tokens.token())
            .query(&[("alt", "media")])
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.text().await?)
    }

    /// Find a file by name in a folder.
    pub async fn find_file_in_folder(
        &self,
        name: &str,
        folder_id: &str,
    ) -> Result<Option<DriveApiFile>> {
        let query = format!(
            "trashed=false and '{}' in parents and name='{}'",
            folder_id,
            name.replace('\'', "\\'")
        );

        let response = self
            .http
            .get(format!("{}/files", self.api_base))
            .bearer_auth(self.tokens.token())
            .query(&[("q", query.as_str())])
            .send()
            .await?;

        let response = check_status(response).await?;
        let list: FileListResponse = response.json().await?;
        Ok(list.files.into_iter().find(|f| f.name == name))
    }

    /// Replace the content of an existing file.
    pub async fn replace_file_content(&self, file_id: &str, content: &str) -> Result<String> {
        let response = self
            .http
            .patch(format!("{}/files/{}", self.upload_base, file_id))
            .bearer_auth(self.tokens.token())
            .query(&[("uploadType", "media")])
            .header("Content-Type", PYTHON_FILE_MIME_TYPE)
            .body(content.to_string())
            .send()
            .await?;

        let response = check_status(response).await?;
        let uploaded: UploadResponse = response.json().await?;
        Ok(uploaded.id)
    }

    /// Create a new file in a folder via multipart upload.
    pub async fn create_file(
        &self,
        name: &str,
        folder_id: &str,
        content: &str,
    ) -> Result<String> {
        let metadata = serde_json::json!({
            "name": name,
            "mimeType": PYTHON_FILE_MIME_TYPE,
            "parents": [folder_id]
        });

        let metadata_part = Part::text(metadata.to_string()).mime_str("application/json")?;
        let file_part = Part::text(content.to_string()).mime_str(PYTHON_FILE_MIME_TYPE)?;

        let form = Form::new()
            .part("metadata", metadata_part)
            .part("file", file_part);

        let response = self
            .http
            .post(format!("{}/files", self.upload_base))
            .bearer_auth(self.tokens.token())
            .query(&[("uploadType", "multipart")])
            .multipart(form)
            .send()
            .await?;

        let response = check_status(response).await?;
        let uploaded: UploadResponse = response.json().await?;
        Ok(uploaded.id)
    }

    /// Upload file content to a folder, replacing a same-named file when one
    /// exists. The existence check always precedes the create or replace
    /// request. Returns the resulting file id and whether a replace happened.
    pub async fn upload_file(
        &self,
        name: &str,
        folder_id: &str,
        content: &str,
    ) -> Result<(String, bool)> {
        match self.find_file_in_folder(name, folder_id).await? {
            Some(existing) => {
                tracing::debug!(file_id = %existing.id, "replacing existing file");
                let id = self.replace_file_content(&existing.id, content).await?;
                Ok((id, true))
            }
            None => {
                let id = self.create_file(name, folder_id, content).await?;
                Ok((id, false))
            }
        }
    }

    /// List the eligible script files directly inside a folder.
    ///
    /// Folders are excluded server-side via the `mimeType!=` query clause;
    /// the script eligibility filter then applies on top. An empty result is
    /// `Ok`, not an error.
    pub async fn list_folder_files(&self, folder_id: &str) -> Result<Vec<DriveDocument>> {
        let query = format!(
            "trashed=false and '{}' in parents and mimeType!='{}'",
            folder_id, FOLDER_MIME_TYPE
        );

        let response = self
            .http
            .get(format!("{}/files", self.api_base))
            .bearer_auth(self.tokens.token())
            .query(&[("q", query.as_str()), ("fields", LIST_FIELDS)])
            .send()
            .await?;

        let response = check_status(response).await?;
        let list: FileListResponse = response.json().await?;

        let documents = list
            .files
            .iter()
            .filter(|f| is_eligible_script(&f.name, f.mime_type.as_deref().unwrap_or("")))
            .map(DriveDocument::from_api_file)
            .collect();

        Ok(documents)
    }

    /// Fetch folder metadata by id, normalized with a folder discriminator.
    pub async fn fetch_folder_info(&self, folder_id: &str) -> Result<DriveDocument> {
        let response = self
            .http
            .get(format!("{}/files/{}", self.api_base, folder_id))
            .bearer_auth(self.tokens.token())
            .query(&[("fields", FILE_FIELDS)])
            .send()
            .await?;

        let response = check_status(response).await?;
        let file: DriveApiFile = response.json().await?;
        Ok(DriveDocument::folder_from_api_file(&file))
    }
}

/// Map a non-2xx response to an API error, parsing the Google error envelope
/// when the body carries one.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_body = response.text().await.unwrap_or_default();
    if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&error_body) {
        return Err(DriveError::ApiError {
            status: api_error.error.code,
            message: api_error.error.message,
        });
    }

    Err(DriveError::ApiError {
        status: status.as_u16(),
        message: error_body,
    })
}

#[cfg(test)]
mod tests {
    // Tests are in tests/client_test.rs
}

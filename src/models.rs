//! Data models for Google Drive API responses and the picker widget contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::filter::{FOLDER_MIME_TYPE, PYTHON_FILE_MIME_TYPE};

/// Discriminator for normalized Drive documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Document,
    Folder,
}

/// The application's normalized representation of a remote file or folder,
/// independent of which REST or widget shape produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveDocument {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    /// Last-modified timestamp in epoch milliseconds.
    pub last_edited_utc_ms: i64,
    /// Owning-service tag, always `"drive"` for documents produced here.
    pub service_id: String,
    pub kind: DocumentKind,
}

impl DriveDocument {
    /// Normalize a raw `files` resource into a document.
    ///
    /// Missing modified time falls back to the current time, a missing or
    /// empty MIME type falls back to the script MIME type, and the size
    /// string parses as an integer defaulting to zero.
    pub fn from_api_file(file: &DriveApiFile) -> Self {
        Self {
            id: file.id.clone(),
            name: file.name.clone(),
            mime_type: match file.mime_type.as_deref() {
                Some(mime) if !mime.is_empty() => mime.to_string(),
                _ => PYTHON_FILE_MIME_TYPE.to_string(),
            },
            size_bytes: file.size.unwrap_or(0),
            last_edited_utc_ms: parse_modified_time(file.modified_time.as_deref()),
            service_id: "drive".to_string(),
            kind: DocumentKind::Document,
        }
    }

    /// Normalize folder metadata into a document with a folder discriminator.
    pub fn folder_from_api_file(file: &DriveApiFile) -> Self {
        Self {
            id: file.id.clone(),
            name: file.name.clone(),
            mime_type: match file.mime_type.as_deref() {
                Some(mime) if !mime.is_empty() => mime.to_string(),
                _ => FOLDER_MIME_TYPE.to_string(),
            },
            size_bytes: 0,
            last_edited_utc_ms: parse_modified_time(file.modified_time.as_deref()),
            service_id: "drive".to_string(),
            kind: DocumentKind::Folder,
        }
    }
}

fn parse_modified_time(modified_time: Option<&str>) -> i64 {
    modified_time
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| Utc::now().timestamp_millis())
}

/// Raw `files` resource from the Drive API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveApiFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Drive reports size as a decimal string; unparsable values are dropped.
    #[serde(default, deserialize_with = "deserialize_size")]
    pub size: Option<u64>,
    #[serde(default)]
    pub modified_time: Option<String>,
}

fn deserialize_size<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| s.parse::<u64>().ok()))
}

/// Response from the files.list API endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListResponse {
    #[serde(default)]
    pub files: Vec<DriveApiFile>,
}

/// Response from a content create or replace request.
#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    pub id: String,
}

/// Google API error response.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub code: u16,
    pub message: String,
}

/// Outcome discriminator of a single picker invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickerAction {
    Picked,
    Cancelled,
}

/// One item from the picker callback payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickedDoc {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub size_bytes: u64,
    /// Epoch milliseconds, when the widget reports one.
    #[serde(default)]
    pub last_edited_utc: Option<i64>,
}

impl DriveDocument {
    /// Normalize a picker item into a document.
    pub fn from_picked_doc(doc: &PickedDoc) -> Self {
        let kind = if doc.mime_type == FOLDER_MIME_TYPE {
            DocumentKind::Folder
        } else {
            DocumentKind::Document
        };

        Self {
            id: doc.id.clone(),
            name: doc.name.clone(),
            mime_type: if doc.mime_type.is_empty() {
                PYTHON_FILE_MIME_TYPE.to_string()
            } else {
                doc.mime_type.clone()
            },
            size_bytes: doc.size_bytes,
            last_edited_utc_ms: doc
                .last_edited_utc
                .unwrap_or_else(|| Utc::now().timestamp_millis()),
            service_id: "drive".to_string(),
            kind,
        }
    }
}

/// The single callback payload delivered per picker open.
#[derive(Debug, Clone, Deserialize)]
pub struct PickerResponse {
    pub action: PickerAction,
    #[serde(default)]
    pub docs: Vec<PickedDoc>,
}

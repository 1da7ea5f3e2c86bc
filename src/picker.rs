//! Picker launch configuration and selection handling.
//!
//! The hosted selection widget itself is external; this module models its
//! invocation contract, waits for it to load, and applies the selection
//! policy to its single callback payload.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::dispatcher::{FlowEvent, FlowRequest};
use crate::error::{DriveError, Result};
use crate::filter::{is_folder, partition_selection};
use crate::models::{DriveDocument, PickedDoc, PickerAction, PickerResponse};
use crate::storage::TokenStore;

/// OAuth scope requested for the picker session.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// Widget load polling: fixed interval, bounded at roughly ten seconds.
const LOAD_POLL_INTERVAL: Duration = Duration::from_millis(100);
const LOAD_MAX_ATTEMPTS: u32 = 100;

/// Configuration handed to the hosted picker widget.
#[derive(Debug, Clone)]
pub struct PickerConfig {
    pub client_id: String,
    pub developer_key: String,
    pub view_id: String,
    pub oauth_token: String,
    pub scopes: Vec<String>,
    pub include_folders: bool,
    pub select_folder_enabled: bool,
    pub multiselect: bool,
    pub support_drives: bool,
    pub parent_folder: Option<String>,
}

/// The hosted picker widget: loads out-of-band and produces exactly one
/// callback payload per open.
#[async_trait]
pub trait PickerPort: Send + Sync {
    fn is_loaded(&self) -> bool;
    async fn open(&self, config: PickerConfig) -> Result<PickerResponse>;
}

/// Wait for the widget to finish loading, polling at a fixed interval.
pub async fn ensure_loaded(port: &dyn PickerPort) -> Result<()> {
    ensure_loaded_with(port, LOAD_POLL_INTERVAL, LOAD_MAX_ATTEMPTS).await
}

async fn ensure_loaded_with(
    port: &dyn PickerPort,
    interval: Duration,
    max_attempts: u32,
) -> Result<()> {
    for _ in 0..max_attempts {
        if port.is_loaded() {
            return Ok(());
        }
        tokio::time::sleep(interval).await;
    }

    Err(DriveError::PickerUnavailable(
        "Timeout waiting for picker widget to load".to_string(),
    ))
}

/// Applies the selection policy to picker responses.
///
/// Folder picks are persisted as the new default folder and trigger the
/// folder-listing flow; eligible files are announced as a download
/// selection. Either is held pending while no token is available, since the
/// picker's own authorization step may complete after the selection
/// callback.
pub struct SelectionCoordinator {
    tokens: TokenStore,
    requests: mpsc::Sender<FlowRequest>,
    events: mpsc::Sender<FlowEvent>,
    pending: Mutex<Vec<PickedDoc>>,
}

impl SelectionCoordinator {
    pub fn new(
        tokens: TokenStore,
        requests: mpsc::Sender<FlowRequest>,
        events: mpsc::Sender<FlowEvent>,
    ) -> Self {
        Self {
            tokens,
            requests,
            events,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Handle the single callback payload of one picker open.
    pub async fn handle_response(&self, response: PickerResponse) {
        if response.action != PickerAction::Picked {
            debug!("picker dialog cancelled, nothing happens");
            return;
        }

        let selection = partition_selection(response.docs);
        let token = self.tokens.token();

        if let Some(folder) = selection.folders.into_iter().next() {
            self.tokens.save_default_folder(&folder.id);

            if token.is_empty() {
                self.pending.lock().await.push(folder);
            } else {
                let _ = self
                    .requests
                    .send(FlowRequest::ListFolderFiles {
                        folder_id: folder.id,
                    })
                    .await;
            }
        }

        if !selection.files.is_empty() {
            if token.is_empty() {
                self.pending.lock().await.extend(selection.files);
            } else {
                self.announce_selection(&selection.files).await;
            }
        }
    }

    /// Save a freshly granted token and flush any docs held pending on it.
    pub async fn authorize(&self, token: &str, ttl_seconds: i64) {
        self.tokens.save_token(token, ttl_seconds);

        let pending = std::mem::take(&mut *self.pending.lock().await);
        if pending.is_empty() {
            return;
        }

        // A pending folder takes precedence over pending files.
        if let Some(folder) = pending.iter().find(|doc| is_folder(&doc.mime_type)) {
            let _ = self
                .requests
                .send(FlowRequest::ListFolderFiles {
                    folder_id: folder.id.clone(),
                })
                .await;
        } else {
            self.announce_selection(&pending).await;
        }
    }

    /// Handle the callback of a folder-only picker open: the first picked
    /// item becomes the new default folder and is announced as the selected
    /// folder.
    pub async fn handle_folder_response(&self, response: PickerResponse) {
        if response.action != PickerAction::Picked {
            debug!("picker dialog cancelled, nothing happens");
            return;
        }

        let Some(folder) = response.docs.into_iter().next() else {
            return;
        };

        self.tokens.save_default_folder(&folder.id);
        let _ = self
            .events
            .send(FlowEvent::DidSelectFolder(DriveDocument::from_picked_doc(
                &folder,
            )))
            .await;
    }

    async fn announce_selection(&self, docs: &[PickedDoc]) {
        let documents: Vec<DriveDocument> =
            docs.iter().map(DriveDocument::from_picked_doc).collect();
        let _ = self
            .events
            .send(FlowEvent::DidSelectDownloadFiles(documents))
            .await;
    }
}

/// Builds picker configurations and runs one open-and-handle cycle.
pub struct PickerLauncher {
    client_id: String,
    developer_key: String,
    tokens: TokenStore,
}

impl PickerLauncher {
    pub fn new(client_id: &str, developer_key: &str, tokens: TokenStore) -> Self {
        Self {
            client_id: client_id.to_string(),
            developer_key: developer_key.to_string(),
            tokens,
        }
    }

    /// Configuration for the file/folder download picker: multi-select over
    /// documents, folders included and selectable, constrained to the stored
    /// default folder when one exists.
    pub fn download_config(&self) -> PickerConfig {
        let default_folder = self.tokens.default_folder();

        PickerConfig {
            client_id: self.client_id.clone(),
            developer_key: self.developer_key.clone(),
            view_id: "DOCS".to_string(),
            oauth_token: self.tokens.token(),
            scopes: vec![DRIVE_SCOPE.to_string()],
            include_folders: true,
            select_folder_enabled: true,
            multiselect: true,
            support_drives: true,
            parent_folder: if default_folder.is_empty() {
                None
            } else {
                Some(default_folder)
            },
        }
    }

    /// Configuration for the folder-only picker: single-select over the
    /// folder view, constrained to the stored default folder when one
    /// exists.
    pub fn folder_config(&self) -> PickerConfig {
        let default_folder = self.tokens.default_folder();

        PickerConfig {
            client_id: self.client_id.clone(),
            developer_key: self.developer_key.clone(),
            view_id: "FOLDERS".to_string(),
            oauth_token: self.tokens.token(),
            scopes: vec![DRIVE_SCOPE.to_string()],
            include_folders: false,
            select_folder_enabled: true,
            multiselect: false,
            support_drives: true,
            parent_folder: if default_folder.is_empty() {
                None
            } else {
                Some(default_folder)
            },
        }
    }

    /// Open the folder-only picker and hand its selection to the
    /// coordinator.
    pub async fn open_folder_picker(
        &self,
        port: &dyn PickerPort,
        coordinator: &SelectionCoordinator,
    ) -> Result<()> {
        ensure_loaded(port).await?;
        let response = port.open(self.folder_config()).await?;
        coordinator.handle_folder_response(response).await;
        Ok(())
    }

    /// Open the picker and hand its selection to the coordinator.
    pub async fn open_download_picker(
        &self,
        port: &dyn PickerPort,
        coordinator: &SelectionCoordinator,
    ) -> Result<()> {
        ensure_loaded(port).await?;
        let response = port.open(self.download_config()).await?;
        coordinator.handle_response(response).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountdownPort {
        remaining: AtomicU32,
    }

    impl CountdownPort {
        fn ready_after(polls: u32) -> Self {
            Self {
                remaining: AtomicU32::new(polls),
            }
        }
    }

    #[async_trait]
    impl PickerPort for CountdownPort {
        fn is_loaded(&self) -> bool {
            if self.remaining.load(Ordering::SeqCst) == 0 {
                return true;
            }
            self.remaining.fetch_sub(1, Ordering::SeqCst);
            false
        }

        async fn open(&self, _config: PickerConfig) -> Result<PickerResponse> {
            Ok(PickerResponse {
                action: PickerAction::Cancelled,
                docs: Vec::new(),
            })
        }
    }

    #[tokio::test]
    async fn test_ensure_loaded_eventually_ready() {
        let port = CountdownPort::ready_after(3);
        let result = ensure_loaded_with(&port, Duration::from_millis(1), 10).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_ensure_loaded_times_out() {
        let port = CountdownPort::ready_after(u32::MAX);
        let err = ensure_loaded_with(&port, Duration::from_millis(1), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, DriveError::PickerUnavailable(_)));
    }

    #[test]
    fn test_download_config_without_state() {
        let tokens = TokenStore::in_memory();
        let launcher = PickerLauncher::new("client-id", "api-key", tokens);

        let config = launcher.download_config();
        assert_eq!(config.view_id, "DOCS");
        assert_eq!(config.oauth_token, "");
        assert!(config.multiselect);
        assert!(config.select_folder_enabled);
        assert!(config.parent_folder.is_none());
        assert_eq!(config.scopes, vec![DRIVE_SCOPE.to_string()]);
    }

    #[test]
    fn test_folder_config_is_single_select_folder_view() {
        let tokens = TokenStore::in_memory();
        tokens.save_default_folder("folder123");
        let launcher = PickerLauncher::new("client-id", "api-key", tokens);

        let config = launcher.folder_config();
        assert_eq!(config.view_id, "FOLDERS");
        assert!(config.select_folder_enabled);
        assert!(!config.multiselect);
        assert!(config.support_drives);
        assert_eq!(config.parent_folder.as_deref(), Some("folder123"));
    }

    #[tokio::test]
    async fn test_open_download_picker_hands_selection_to_coordinator() {
        struct PickingPort;

        #[async_trait]
        impl PickerPort for PickingPort {
            fn is_loaded(&self) -> bool {
                true
            }

            async fn open(&self, _config: PickerConfig) -> Result<PickerResponse> {
                Ok(PickerResponse {
                    action: PickerAction::Picked,
                    docs: vec![PickedDoc {
                        id: "f1".to_string(),
                        name: "main.py".to_string(),
                        mime_type: "text/x-python".to_string(),
                        size_bytes: 10,
                        last_edited_utc: Some(0),
                    }],
                })
            }
        }

        let tokens = TokenStore::in_memory();
        tokens.save_token("t1", 3600);
        let launcher = PickerLauncher::new("client-id", "api-key", tokens.clone());

        let (requests_tx, _requests_rx) = mpsc::channel(8);
        let (events_tx, mut events_rx) = mpsc::channel(8);
        let coordinator = SelectionCoordinator::new(tokens, requests_tx, events_tx);

        launcher
            .open_download_picker(&PickingPort, &coordinator)
            .await
            .unwrap();

        match events_rx.recv().await.unwrap() {
            FlowEvent::DidSelectDownloadFiles(files) => {
                assert_eq!(files.len(), 1);
                assert_eq!(files[0].id, "f1");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_download_config_uses_stored_state() {
        let tokens = TokenStore::in_memory();
        tokens.save_token("t1", 3600);
        tokens.save_default_folder("folder123");
        let launcher = PickerLauncher::new("client-id", "api-key", tokens);

        let config = launcher.download_config();
        assert_eq!(config.oauth_token, "t1");
        assert_eq!(config.parent_folder.as_deref(), Some("folder123"));
    }
}

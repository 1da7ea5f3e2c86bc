//! Event-driven dispatch of the Drive client flows.
//!
//! Each flow-trigger kind gets its own worker task: same-kind requests run
//! in arrival order, one full flow per occurrence, while distinct kinds run
//! concurrently with no cross-kind ordering. Requests are never deduplicated
//! or coalesced.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::warn;

use crate::client::DriveClient;
use crate::error::DriveError;
use crate::file_storage::FileStorage;
use crate::models::DriveDocument;

/// A flow trigger: one complete request/response sequence per occurrence.
#[derive(Debug, Clone)]
pub enum FlowRequest {
    DownloadFile(DriveDocument),
    UploadFile {
        file_name: String,
        target_folder_id: String,
    },
    ListFolderFiles {
        folder_id: String,
    },
    FetchFolderInfo {
        folder_id: String,
    },
}

/// Success and failure announcements emitted by the flows.
#[derive(Debug)]
pub enum FlowEvent {
    DidDownloadFile {
        file: DriveDocument,
        content: String,
    },
    FailToDownloadFile {
        file: DriveDocument,
    },
    DidUploadFile {
        file_id: String,
        replaced: bool,
    },
    FailToUploadFile {
        error: DriveError,
    },
    DidListFolderFiles(Vec<DriveDocument>),
    FailToListFolderFiles {
        error: DriveError,
    },
    /// Documents announced for download, either straight from a picker
    /// selection or auto-triggered by a folder listing.
    DidSelectDownloadFiles(Vec<DriveDocument>),
    /// A folder chosen through the folder-only picker.
    DidSelectFolder(DriveDocument),
    DidFetchFolderInfo(DriveDocument),
}

const QUEUE_CAPACITY: usize = 32;

/// Routes flow triggers to their handlers.
pub struct Dispatcher;

impl Dispatcher {
    /// Spawn the dispatcher and its per-kind workers. Returns the trigger
    /// sender; announcements arrive on `events`. The dispatcher stops once
    /// every trigger sender is dropped.
    pub fn spawn(
        client: DriveClient,
        file_storage: Arc<dyn FileStorage>,
        events: mpsc::Sender<FlowEvent>,
    ) -> mpsc::Sender<FlowRequest> {
        let (request_tx, mut request_rx) = mpsc::channel::<FlowRequest>(QUEUE_CAPACITY);

        let (download_tx, mut download_rx) = mpsc::channel::<DriveDocument>(QUEUE_CAPACITY);
        let (upload_tx, mut upload_rx) = mpsc::channel::<(String, String)>(QUEUE_CAPACITY);
        let (list_tx, mut list_rx) = mpsc::channel::<String>(QUEUE_CAPACITY);
        let (info_tx, mut info_rx) = mpsc::channel::<String>(QUEUE_CAPACITY);

        {
            let client = client.clone();
            let events = events.clone();
            tokio::spawn(async move {
                while let Some(file) = download_rx.recv().await {
                    handle_download(&client, &events, file).await;
                }
            });
        }

        {
            let client = client.clone();
            let events = events.clone();
            tokio::spawn(async move {
                while let Some((file_name, folder_id)) = upload_rx.recv().await {
                    handle_upload(&client, file_storage.as_ref(), &events, &file_name, &folder_id)
                        .await;
                }
            });
        }

        {
            let client = client.clone();
            let events = events.clone();
            tokio::spawn(async move {
                while let Some(folder_id) = list_rx.recv().await {
                    handle_list_folder(&client, &events, &folder_id).await;
                }
            });
        }

        tokio::spawn(async move {
            while let Some(folder_id) = info_rx.recv().await {
                handle_fetch_folder_info(&client, &events, &folder_id).await;
            }
        });

        tokio::spawn(async move {
            while let Some(request) = request_rx.recv().await {
                let routed = match request {
                    FlowRequest::DownloadFile(file) => download_tx.send(file).await.is_ok(),
                    FlowRequest::UploadFile {
                        file_name,
                        target_folder_id,
                    } => upload_tx.send((file_name, target_folder_id)).await.is_ok(),
                    FlowRequest::ListFolderFiles { folder_id } => {
                        list_tx.send(folder_id).await.is_ok()
                    }
                    FlowRequest::FetchFolderInfo { folder_id } => {
                        info_tx.send(folder_id).await.is_ok()
                    }
                };

                if !routed {
                    break;
                }
            }
        });

        request_tx
    }
}

async fn handle_download(
    client: &DriveClient,
    events: &mpsc::Sender<FlowEvent>,
    file: DriveDocument,
) {
    match client.download_file(&file).await {
        Ok(content) => {
            let _ = events.send(FlowEvent::DidDownloadFile { file, content }).await;
        }
        Err(err) => {
            warn!(file_id = %file.id, error = %err, "failed to download file");
            let _ = events.send(FlowEvent::FailToDownloadFile { file }).await;
        }
    }
}

async fn handle_upload(
    client: &DriveClient,
    file_storage: &dyn FileStorage,
    events: &mpsc::Sender<FlowEvent>,
    file_name: &str,
    target_folder_id: &str,
) {
    let content = match file_storage.read_file(file_name).await {
        Ok(content) => content,
        Err(error) => {
            warn!(%file_name, %error, "failed to read file for upload");
            let _ = events.send(FlowEvent::FailToUploadFile { error }).await;
            return;
        }
    };

    match client.upload_file(file_name, target_folder_id, &content).await {
        Ok((file_id, replaced)) => {
            let _ = events
                .send(FlowEvent::DidUploadFile { file_id, replaced })
                .await;
        }
        Err(error) => {
            warn!(%file_name, %error, "failed to upload file");
            let _ = events.send(FlowEvent::FailToUploadFile { error }).await;
        }
    }
}

async fn handle_list_folder(
    client: &DriveClient,
    events: &mpsc::Sender<FlowEvent>,
    folder_id: &str,
) {
    match client.list_folder_files(folder_id).await {
        Ok(documents) => {
            if documents.is_empty() {
                let _ = events.send(FlowEvent::DidListFolderFiles(Vec::new())).await;
                return;
            }

            // The list announcement strictly precedes the auto-download one.
            let _ = events
                .send(FlowEvent::DidListFolderFiles(documents.clone()))
                .await;
            let _ = events
                .send(FlowEvent::DidSelectDownloadFiles(documents))
                .await;
        }
        Err(error) => {
            warn!(%folder_id, %error, "failed to list folder files");
            let _ = events.send(FlowEvent::FailToListFolderFiles { error }).await;
        }
    }
}

async fn handle_fetch_folder_info(
    client: &DriveClient,
    events: &mpsc::Sender<FlowEvent>,
    folder_id: &str,
) {
    match client.fetch_folder_info(folder_id).await {
        Ok(folder) => {
            let _ = events.send(FlowEvent::DidFetchFolderInfo(folder)).await;
        }
        Err(error) => {
            // Best effort: manual folder selection still works without it.
            warn!(%folder_id, %error, "failed to fetch folder info");
        }
    }
}

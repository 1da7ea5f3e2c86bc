//! script_drive - Google Drive integration for script files.
//!
//! This library provides functionality to:
//! - Manage a short-lived OAuth access token and a persisted default folder id
//! - Model the hosted file/folder picker contract and classify its selections
//! - Download, upload/replace, and list script files via the Drive REST API
//! - Dispatch flow triggers to their handlers and announce the outcomes
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use script_drive::{
//!     Dispatcher, DriveClient, FlowEvent, FlowRequest, LocalFileStorage, TokenStore,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let tokens = TokenStore::in_memory();
//!     tokens.save_token("access-token", 3600);
//!
//!     let client = DriveClient::new(tokens);
//!     let storage = Arc::new(LocalFileStorage::new("programs"));
//!     let (events_tx, mut events_rx) = tokio::sync::mpsc::channel(32);
//!
//!     let requests = Dispatcher::spawn(client, storage, events_tx);
//!     requests
//!         .send(FlowRequest::ListFolderFiles {
//!             folder_id: "folder-id".to_string(),
//!         })
//!         .await
//!         .unwrap();
//!
//!     while let Some(event) = events_rx.recv().await {
//!         if let FlowEvent::DidListFolderFiles(files) = event {
//!             println!("{} script files found", files.len());
//!         }
//!     }
//! }
//! ```

pub mod client;
pub mod dispatcher;
pub mod error;
pub mod file_storage;
pub mod filter;
pub mod models;
pub mod picker;
pub mod storage;

// Re-exports for convenience
pub use client::DriveClient;
pub use dispatcher::{Dispatcher, FlowEvent, FlowRequest};
pub use error::{DriveError, Result};
pub use file_storage::{FileStorage, LocalFileStorage};
pub use filter::{is_eligible_script, is_folder, partition_selection, Selection};
pub use models::{DocumentKind, DriveDocument, PickedDoc, PickerAction, PickerResponse};
pub use picker::{PickerConfig, PickerLauncher, PickerPort, SelectionCoordinator};
pub use storage::{MemoryStorage, StorageArea, TokenStore};

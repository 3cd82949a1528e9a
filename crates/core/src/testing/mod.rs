//! Testing utilities and mock implementations for lifecycle tests.
//!
//! This module provides mock implementations of every collaborator trait,
//! allowing full ingestion cycles to run against a temporary directory
//! without a portal or storage service.
//!
//! # Example
//!
//! ```rust,ignore
//! use casemirror_core::testing::{fixtures, MockPortal, MockRenderer, MockStorage};
//!
//! let storage = MockStorage::new();
//! let portal = MockPortal::new();
//!
//! portal.set_cases(vec![fixtures::case_record("AB-123", "998877", 1_700_000_000_000)]).await;
//! storage.set_folder("998877", vec![fixtures::active_file("f1", "scan.stl")]).await;
//! storage.set_file("f1", b"solid".to_vec()).await;
//! ```

mod mock_portal;
mod mock_renderer;
mod mock_storage;

pub use mock_portal::{MockPortal, RecordedWrite};
pub use mock_renderer::{MockRenderer, RecordedRender};
pub use mock_storage::{MockStorage, RecordedListing};

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::json;
    use std::path::Path;

    use crate::config::{
        Config, FolderConfig, IngestConfig, PortalConfig, ServerConfig, StorageConfig,
    };
    use crate::portal::{CaseActivity, CaseDetails, CaseRecord, RedesignRecord};
    use crate::storage::{EntryKind, ItemStatus, RemoteFile};

    /// Create a case with a patient name and one service.
    pub fn case_record(case_id: &str, folder_id: &str, creation_time_ms: i64) -> CaseRecord {
        let details = CaseDetails::from_value(json!({
            "patientName": format!("Patient {}", case_id),
            "services": {
                "crownAndBridge": {
                    "material": "Zirconia",
                    "instanceDetails": [{"toothNumbers": ["11", "12"]}]
                }
            }
        }))
        .unwrap_or_default();

        CaseRecord {
            case_id: case_id.to_string(),
            storage_folder_id: Some(folder_id.to_string()),
            creation_time_ms,
            details,
            details_error: None,
        }
    }

    /// Create a case whose details payload could not be parsed.
    pub fn case_with_unreadable_details(
        case_id: &str,
        folder_id: &str,
        creation_time_ms: i64,
    ) -> CaseRecord {
        CaseRecord {
            details: CaseDetails::default(),
            details_error: Some("invalid details_json: key must be a string".to_string()),
            ..case_record(case_id, folder_id, creation_time_ms)
        }
    }

    /// Create a case the portal has not attached a storage folder to.
    pub fn case_without_folder(case_id: &str, creation_time_ms: i64) -> CaseRecord {
        CaseRecord {
            storage_folder_id: None,
            ..case_record(case_id, "", creation_time_ms)
        }
    }

    /// Create a redesign request with a short comment thread.
    pub fn redesign_record(
        redesign_id: &str,
        folder_id: Option<&str>,
        creation_time_ms: i64,
    ) -> RedesignRecord {
        RedesignRecord {
            redesign_id: redesign_id.to_string(),
            case_id: "AB-123".to_string(),
            creation_time_ms,
            storage_folder_id: folder_id.map(str::to_string),
            priority: "High".to_string(),
            activities: vec![
                CaseActivity {
                    kind: "user_comment".to_string(),
                    timestamp: creation_time_ms / 1000,
                    content: "Please shorten the margin".to_string(),
                },
                CaseActivity {
                    kind: "system_update".to_string(),
                    timestamp: creation_time_ms / 1000,
                    content: "Status changed".to_string(),
                },
            ],
        }
    }

    /// An active file entry.
    pub fn active_file(id: &str, name: &str) -> RemoteFile {
        RemoteFile {
            id: id.to_string(),
            name: name.to_string(),
            kind: EntryKind::File,
            status: ItemStatus::Active,
        }
    }

    /// A trashed file entry.
    pub fn trashed_file(id: &str, name: &str) -> RemoteFile {
        RemoteFile {
            status: ItemStatus::Other("trashed".to_string()),
            ..active_file(id, name)
        }
    }

    /// A sub-folder entry.
    pub fn folder_entry(id: &str, name: &str) -> RemoteFile {
        RemoteFile {
            kind: EntryKind::Folder,
            ..active_file(id, name)
        }
    }

    /// A complete config rooted at `base_folder` with placeholder endpoints.
    pub fn config(base_folder: &Path) -> Config {
        Config {
            folders: FolderConfig {
                base_folder: base_folder.to_path_buf(),
                utc_offset_minutes: 0,
            },
            portal: PortalConfig {
                cases_url: "http://portal.test/cases".to_string(),
                status_url: "http://portal.test/status".to_string(),
                constants_get_url: "http://portal.test/constants/".to_string(),
                constants_post_url: "http://portal.test/constants".to_string(),
                redesigns_url: None,
                timeout_secs: 5,
            },
            storage: StorageConfig {
                api_url: "http://storage.test/2.0".to_string(),
                access_token: "test-token".to_string(),
                timeout_secs: 5,
                page_size: 100,
            },
            ingest: IngestConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

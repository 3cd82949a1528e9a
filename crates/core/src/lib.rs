pub mod config;
pub mod cycle;
pub mod document;
pub mod fetcher;
pub mod ingest;
pub mod metrics;
pub mod paths;
pub mod pool;
pub mod portal;
pub mod storage;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use cycle::{
    AdvisoryLock, Collaborators, CycleCoordinator, CycleError, CycleOutcome, CycleReport,
    CycleRunner, LockAttempt, RunnerStatus,
};
pub use document::{Document, DocumentError, DocumentRenderer, PdfRenderer};
pub use fetcher::{FetchError, FileFetcher};
pub use ingest::{CaseFailure, CaseIngestor, CaseReport, IngestionOutcome, RedesignIngestor};
pub use paths::{CaseId, FolderKind, PathError, PathResolver};
pub use pool::{run_bounded, TaskFailure};
pub use portal::{
    CaseRecord, CaseSource, KeyValueStore, PortalClient, PortalError, RedesignSource,
    StatusReporter,
};
pub use storage::{BoxStorage, RemoteFile, RemoteStorage, StorageError};

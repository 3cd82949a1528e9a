//! Path derivation and folder creation for mirrored cases.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use super::error::PathError;
use super::types::{CaseId, FolderKind};

/// Namespace directory for redesign requests under a date bucket.
const REDESIGN_DIR: &str = "REDESIGN";

/// Derives and creates the on-disk locations for cases and redesigns.
///
/// Holds the date mapping for one ingestion cycle: a case id is mapped to its
/// date bucket by [`ensure_lab_root`](Self::ensure_lab_root) and every later
/// lookup for that case reads the same bucket, so a case never straddles two
/// dates even if the cycle crosses midnight.
#[derive(Debug)]
pub struct PathResolver {
    base_folder: PathBuf,
    offset: FixedOffset,
    case_dates: HashMap<CaseId, String>,
    redesign_dates: HashMap<CaseId, String>,
}

impl PathResolver {
    /// Creates a resolver rooted at `base_folder`, bucketing dates in the given UTC offset.
    pub fn new(base_folder: impl Into<PathBuf>, utc_offset_minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60)).unwrap_or_else(
            || {
                warn!(
                    "UTC offset of {} minutes is out of range, bucketing dates in UTC",
                    utc_offset_minutes
                );
                Utc.fix()
            },
        );

        Self {
            base_folder: base_folder.into(),
            offset,
            case_dates: HashMap::new(),
            redesign_dates: HashMap::new(),
        }
    }

    /// Root of the mirrored tree.
    pub fn base_folder(&self) -> &Path {
        &self.base_folder
    }

    /// Formats a creation timestamp (epoch milliseconds) as a `YYYY-MM-DD` bucket.
    pub fn date_bucket(&self, creation_time_ms: i64) -> Result<String, PathError> {
        let created = DateTime::<Utc>::from_timestamp_millis(creation_time_ms)
            .ok_or(PathError::InvalidTimestamp(creation_time_ms))?;
        Ok(created
            .with_timezone(&self.offset)
            .format("%Y-%m-%d")
            .to_string())
    }

    /// The date bucket recorded for a case in this cycle.
    pub fn case_date(&self, case_id: &CaseId) -> Result<&str, PathError> {
        self.case_dates
            .get(case_id)
            .map(String::as_str)
            .ok_or_else(|| PathError::UnmappedCase(case_id.to_string()))
    }

    /// Records the case's date bucket and creates the four lab-level folders.
    pub async fn ensure_lab_root(
        &mut self,
        case_id: &CaseId,
        creation_time_ms: i64,
    ) -> Result<PathBuf, PathError> {
        let date = self.date_bucket(creation_time_ms)?;
        self.case_dates.insert(case_id.clone(), date.clone());

        let lab_root = self.base_folder.join(&date).join(case_id.lab_token());
        debug!(case_id = %case_id, date = %date, "Ensuring lab root");

        for kind in FolderKind::ALL {
            ensure_folder(&lab_root.join(kind.as_str())).await?;
        }

        Ok(lab_root)
    }

    /// Creates `<date>/<lab>/<kind>/<case_id>` and returns it.
    pub async fn ensure_case_folder(
        &self,
        case_id: &CaseId,
        kind: FolderKind,
    ) -> Result<PathBuf, PathError> {
        let folder = self.case_folder(case_id, kind)?;
        ensure_folder(&folder).await?;
        Ok(folder)
    }

    /// Location of a case's working folder of the given kind.
    pub fn case_folder(&self, case_id: &CaseId, kind: FolderKind) -> Result<PathBuf, PathError> {
        let date = self.case_date(case_id)?;
        Ok(self
            .base_folder
            .join(date)
            .join(case_id.lab_token())
            .join(kind.as_str())
            .join(case_id.as_str()))
    }

    /// Location of a file inside a case's working folder. Does not touch the disk.
    pub fn file_path(
        &self,
        case_id: &CaseId,
        filename: &str,
        kind: FolderKind,
    ) -> Result<PathBuf, PathError> {
        Ok(self.case_folder(case_id, kind)?.join(filename))
    }

    /// Records the redesign's date bucket and creates `<date>/REDESIGN/<rd_id>`.
    pub async fn ensure_redesign_root(
        &mut self,
        redesign_id: &CaseId,
        creation_time_ms: i64,
    ) -> Result<PathBuf, PathError> {
        let date = self.date_bucket(creation_time_ms)?;
        self.redesign_dates.insert(redesign_id.clone(), date);

        let folder = self.redesign_folder_path(redesign_id)?;
        debug!(redesign_id = %redesign_id, "Ensuring redesign folder");
        ensure_folder(&folder).await?;
        Ok(folder)
    }

    /// Location of a redesign's folder.
    pub fn redesign_folder_path(&self, redesign_id: &CaseId) -> Result<PathBuf, PathError> {
        let date = self
            .redesign_dates
            .get(redesign_id)
            .ok_or_else(|| PathError::UnmappedCase(redesign_id.to_string()))?;
        Ok(self
            .base_folder
            .join(date)
            .join(REDESIGN_DIR)
            .join(redesign_id.as_str()))
    }
}

/// Creates a folder and its parents; an existing folder is not an error.
async fn ensure_folder(path: &Path) -> Result<(), PathError> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| PathError::FolderCreation {
            path: path.to_path_buf(),
            source: e,
        })
}

//! Cycle reports and errors.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::ingest::{CaseSummary, RedesignReport};
use crate::portal::PortalError;

/// Errors that end a cycle before any case is attempted.
#[derive(Debug, Error)]
pub enum CycleError {
    /// The lock key could not be read or written.
    #[error("advisory lock unavailable: {0}")]
    Lock(#[source] PortalError),

    /// The case listing failed. The lock is left in place.
    #[error("case listing failed: {0}")]
    Listing(#[source] PortalError),
}

impl CycleError {
    pub fn label(&self) -> &'static str {
        match self {
            CycleError::Lock(_) => "lock_error",
            CycleError::Listing(_) => "listing_error",
        }
    }
}

/// Result of one redesign within a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedesignSummary {
    pub redesign_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<RedesignReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CycleOutcome {
    /// Another worker holds the lock. `held_since` is unix seconds when known.
    Skipped { held_since: Option<i64> },
    /// The lock was taken and the listing processed.
    Ran {
        /// Attempted cases, in listing order.
        cases: Vec<CaseSummary>,
        /// Listed cases without a storage folder.
        skipped_without_folder: usize,
        redesigns: Vec<RedesignSummary>,
        /// Watermark written at the end of the batch, if any.
        watermark: Option<i64>,
    },
}

/// Report of one ingestion cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: CycleOutcome,
}

impl CycleReport {
    /// Whether the next cycle should start right away.
    ///
    /// True when at least one case was attempted and the watermark moved past
    /// it, so the next listing returns newer cases.
    pub fn should_rearm(&self) -> bool {
        match &self.outcome {
            CycleOutcome::Ran {
                cases, watermark, ..
            } => !cases.is_empty() && watermark.is_some(),
            CycleOutcome::Skipped { .. } => false,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, CycleOutcome::Skipped { .. })
    }

    pub fn label(&self) -> &'static str {
        match self.outcome {
            CycleOutcome::Skipped { .. } => "skipped",
            CycleOutcome::Ran { .. } => "ran",
        }
    }
}

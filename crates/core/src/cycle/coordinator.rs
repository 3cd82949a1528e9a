//! One ingestion cycle: lock, list, ingest, advance the watermark, unlock.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{Config, FolderConfig};
use crate::document::DocumentRenderer;
use crate::fetcher::FileFetcher;
use crate::ingest::{CaseIngestor, CaseSummary, IngestSettings, RedesignIngestor};
use crate::metrics;
use crate::paths::PathResolver;
use crate::portal::{CaseSource, KeyValueStore, RedesignSource, StatusReporter};
use crate::storage::RemoteStorage;

use super::lock::{AdvisoryLock, LockAttempt};
use super::types::{CycleError, CycleOutcome, CycleReport, RedesignSummary};

/// External collaborators a coordinator drives.
#[derive(Clone)]
pub struct Collaborators {
    pub storage: Arc<dyn RemoteStorage>,
    pub cases: Arc<dyn CaseSource>,
    /// Redesign mirroring is skipped when `None`.
    pub redesigns: Option<Arc<dyn RedesignSource>>,
    pub reporter: Arc<dyn StatusReporter>,
    pub kv: Arc<dyn KeyValueStore>,
    pub renderer: Arc<dyn DocumentRenderer>,
}

/// Runs ingestion cycles under the advisory lock.
pub struct CycleCoordinator {
    lock: AdvisoryLock,
    cases: Arc<dyn CaseSource>,
    redesigns: Option<Arc<dyn RedesignSource>>,
    kv: Arc<dyn KeyValueStore>,
    case_ingestor: CaseIngestor,
    redesign_ingestor: RedesignIngestor,
    folders: FolderConfig,
    watermark_key: String,
}

impl CycleCoordinator {
    pub fn new(config: &Config, deps: Collaborators) -> Self {
        let settings = IngestSettings::from(config);
        let fetcher = Arc::new(FileFetcher::new(
            deps.storage.clone(),
            config.ingest.buffer_size,
        ));

        let case_ingestor = CaseIngestor::new(
            deps.storage.clone(),
            fetcher.clone(),
            deps.renderer.clone(),
            deps.reporter,
            deps.kv.clone(),
            settings.clone(),
        );
        let redesign_ingestor =
            RedesignIngestor::new(deps.storage, fetcher, deps.renderer, settings);

        Self {
            lock: AdvisoryLock::new(
                deps.kv.clone(),
                config.ingest.lock_key.clone(),
                config.ingest.lock_window_secs,
            ),
            cases: deps.cases,
            redesigns: deps.redesigns,
            kv: deps.kv,
            case_ingestor,
            redesign_ingestor,
            folders: config.folders.clone(),
            watermark_key: config.ingest.watermark_key.clone(),
        }
    }

    /// Runs one cycle.
    ///
    /// Returns `Skipped` without listing anything when the lock is held.
    /// Individual case failures never fail the cycle.
    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        let cycle_id = Uuid::new_v4();
        let span = info_span!("cycle", cycle_id = %cycle_id);

        let result = self.run(cycle_id).instrument(span).await;

        let label = match &result {
            Ok(report) => report.label(),
            Err(e) => e.label(),
        };
        metrics::CYCLES_TOTAL.with_label_values(&[label]).inc();
        result
    }

    async fn run(&self, cycle_id: Uuid) -> Result<CycleReport, CycleError> {
        let started_at = Utc::now();

        let token = match self
            .lock
            .try_acquire(started_at.timestamp())
            .await
            .map_err(CycleError::Lock)?
        {
            LockAttempt::Acquired { token } => token,
            LockAttempt::Held { since } => {
                info!(held_since = ?since, "Cycle already running elsewhere, skipping");
                return Ok(CycleReport {
                    cycle_id,
                    started_at,
                    finished_at: Utc::now(),
                    outcome: CycleOutcome::Skipped { held_since: since },
                });
            }
        };

        info!("Processing cases");
        let listed = match self.cases.list_cases().await {
            Ok(listed) => listed,
            Err(e) => {
                error!(error = %e, "Case listing failed, lock kept until its window expires");
                return Err(CycleError::Listing(e));
            }
        };

        let mut paths =
            PathResolver::new(&self.folders.base_folder, self.folders.utc_offset_minutes);
        let mut cases = Vec::new();
        let mut skipped_without_folder = 0;
        let mut candidate = None;

        for case in &listed {
            if case.storage_folder().is_none() {
                debug!(case_id = %case.case_id, "No storage folder, skipping");
                skipped_without_folder += 1;
                continue;
            }

            let outcome = self.case_ingestor.ingest(&mut paths, case).await;
            cases.push(CaseSummary::new(&case.case_id, case.creation_time_ms, &outcome));
            candidate = Some(case.creation_time_ms);
        }

        let redesigns = self.run_redesigns(&mut paths).await;

        let watermark = match candidate {
            Some(ts) => match self.kv.put(&self.watermark_key, &ts.to_string()).await {
                Ok(()) => {
                    info!(watermark = ts, "Watermark updated");
                    Some(ts)
                }
                Err(e) => {
                    warn!(error = %e, "Failed to update watermark");
                    None
                }
            },
            None => {
                info!("No cases found");
                None
            }
        };

        match self.lock.release(&token).await {
            Ok(true) => debug!("Lock released"),
            Ok(false) => warn!(key = %self.lock.key(), "Lock was taken over before release"),
            Err(e) => warn!(error = %e, "Failed to release lock"),
        }

        Ok(CycleReport {
            cycle_id,
            started_at,
            finished_at: Utc::now(),
            outcome: CycleOutcome::Ran {
                cases,
                skipped_without_folder,
                redesigns,
                watermark,
            },
        })
    }

    async fn run_redesigns(&self, paths: &mut PathResolver) -> Vec<RedesignSummary> {
        let Some(source) = &self.redesigns else {
            return Vec::new();
        };

        let listed = match source.list_redesigns().await {
            Ok(listed) => listed,
            Err(e) => {
                warn!(error = %e, "Redesign listing failed");
                return Vec::new();
            }
        };

        let mut summaries = Vec::with_capacity(listed.len());
        for redesign in &listed {
            let summary = match self.redesign_ingestor.ingest(paths, redesign).await {
                Ok(report) => RedesignSummary {
                    redesign_id: redesign.redesign_id.clone(),
                    report: Some(report),
                    error: None,
                },
                Err(e) => {
                    warn!(redesign_id = %redesign.redesign_id, error = %e, "Redesign failed");
                    RedesignSummary {
                        redesign_id: redesign.redesign_id.clone(),
                        report: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            summaries.push(summary);
        }
        summaries
    }
}

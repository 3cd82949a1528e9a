//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Cycles (lock outcomes, listing failures)
//! - Cases (outcomes, duration)
//! - Files and documents (downloads, bytes, renders)
//! - Status reporting back to the portal

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Cycles
// =============================================================================

/// Ingestion cycles by result.
pub static CYCLES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("casemirror_cycles_total", "Total ingestion cycles"),
        &["result"], // "ran", "skipped", "lock_error", "listing_error"
    )
    .unwrap()
});

// =============================================================================
// Cases
// =============================================================================

/// Cases processed by outcome.
pub static CASES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("casemirror_cases_total", "Total cases processed"),
        &["result"], // "completed", "invalid_id", "folder_error", "listing_error", "no_files"
    )
    .unwrap()
});

/// Time spent ingesting a single case.
pub static CASE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "casemirror_case_duration_seconds",
            "Duration of a single case ingestion",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Files and documents
// =============================================================================

/// File downloads by result.
pub static FILES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("casemirror_files_total", "Total file downloads"),
        &["result"], // "downloaded", "stream_unavailable", "copy_failed", "path_error"
    )
    .unwrap()
});

/// Bytes written to disk by downloads.
pub static DOWNLOAD_BYTES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "casemirror_download_bytes_total",
        "Total bytes written by file downloads",
    )
    .unwrap()
});

/// Generated documents by result.
pub static DOCUMENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("casemirror_documents_total", "Total generated documents"),
        &["result"], // "written", "failed"
    )
    .unwrap()
});

// =============================================================================
// Portal
// =============================================================================

/// Status reports posted to the portal by result.
pub static STATUS_REPORTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "casemirror_status_reports_total",
            "Total status reports posted",
        ),
        &["result"], // "ok", "failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CYCLES_TOTAL.clone()),
        Box::new(CASES_TOTAL.clone()),
        Box::new(CASE_DURATION.clone()),
        Box::new(FILES_TOTAL.clone()),
        Box::new(DOWNLOAD_BYTES.clone()),
        Box::new(DOCUMENTS_TOTAL.clone()),
        Box::new(STATUS_REPORTS_TOTAL.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_register_cleanly() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
        FILES_TOTAL.with_label_values(&["downloaded"]).inc();
        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"casemirror_files_total".to_string()));
    }
}

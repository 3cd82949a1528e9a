//! Background loop that triggers ingestion cycles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, Notify, RwLock};
use tracing::{error, info, warn};

use super::coordinator::CycleCoordinator;
use super::types::{CycleError, CycleReport};

/// Counters and the most recent cycle, for the status endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunnerStatus {
    /// Whether the background loop is running.
    pub running: bool,
    pub poll_interval_secs: u64,
    pub cycles_ran: u64,
    pub cycles_skipped: u64,
    pub cycles_failed: u64,
    pub last_report: Option<CycleReport>,
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct RunnerState {
    cycles_ran: u64,
    cycles_skipped: u64,
    cycles_failed: u64,
    last_report: Option<CycleReport>,
    last_error: Option<String>,
}

/// Drives the coordinator on a timer and on demand.
///
/// A cycle that attempted cases and advanced the watermark is followed
/// immediately by another one; otherwise the loop waits for the poll interval
/// or a trigger.
pub struct CycleRunner {
    coordinator: Arc<CycleCoordinator>,
    poll_interval: Duration,

    // Runtime state
    running: Arc<AtomicBool>,
    trigger: Arc<Notify>,
    state: Arc<RwLock<RunnerState>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl CycleRunner {
    pub fn new(coordinator: Arc<CycleCoordinator>, poll_interval: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            coordinator,
            poll_interval,
            running: Arc::new(AtomicBool::new(false)),
            trigger: Arc::new(Notify::new()),
            state: Arc::new(RwLock::new(RunnerState::default())),
            shutdown_tx,
        }
    }

    /// Start the background loop. The first cycle runs immediately.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Cycle runner already running");
            return;
        }

        info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            "Starting cycle runner"
        );
        self.spawn_loop();
    }

    /// Stop the background loop. A cycle in progress finishes first.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Cycle runner not running");
            return;
        }

        info!("Stopping cycle runner");
        let _ = self.shutdown_tx.send(());
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Requests a cycle now.
    ///
    /// Wakes the loop when it is running; otherwise runs one cycle in the
    /// background. Returns whether the loop was woken.
    pub fn trigger(&self) -> bool {
        if self.is_running() {
            self.trigger.notify_one();
            return true;
        }

        let coordinator = Arc::clone(&self.coordinator);
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let _ = Self::execute(&coordinator, &state).await;
        });
        false
    }

    /// Runs one cycle on the caller's task and records it.
    pub async fn run_once(&self) -> Result<CycleReport, CycleError> {
        Self::execute(&self.coordinator, &self.state).await
    }

    /// Current status.
    pub async fn status(&self) -> RunnerStatus {
        let state = self.state.read().await;
        RunnerStatus {
            running: self.is_running(),
            poll_interval_secs: self.poll_interval.as_secs(),
            cycles_ran: state.cycles_ran,
            cycles_skipped: state.cycles_skipped,
            cycles_failed: state.cycles_failed,
            last_report: state.last_report.clone(),
            last_error: state.last_error.clone(),
        }
    }

    fn spawn_loop(&self) {
        let running = Arc::clone(&self.running);
        let coordinator = Arc::clone(&self.coordinator);
        let state = Arc::clone(&self.state);
        let trigger = Arc::clone(&self.trigger);
        let poll_interval = self.poll_interval;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Cycle loop started");
            let mut rearm = true;
            loop {
                if !rearm {
                    tokio::select! {
                        _ = shutdown_rx.recv() => {
                            info!("Cycle loop received shutdown signal");
                            break;
                        }
                        _ = trigger.notified() => {
                            info!("Cycle triggered");
                        }
                        _ = tokio::time::sleep(poll_interval) => {}
                    }
                }

                if !running.load(Ordering::Relaxed) {
                    break;
                }

                rearm = match Self::execute(&coordinator, &state).await {
                    Ok(report) => report.should_rearm(),
                    Err(_) => false,
                };
                if rearm {
                    info!("Batch processed, restarting cycle");
                }
            }
            info!("Cycle loop stopped");
        });
    }

    async fn execute(
        coordinator: &CycleCoordinator,
        state: &RwLock<RunnerState>,
    ) -> Result<CycleReport, CycleError> {
        let result = coordinator.run_cycle().await;

        let mut state = state.write().await;
        match &result {
            Ok(report) if report.is_skipped() => {
                state.cycles_skipped += 1;
                state.last_report = Some(report.clone());
            }
            Ok(report) => {
                state.cycles_ran += 1;
                state.last_report = Some(report.clone());
                state.last_error = None;
            }
            Err(e) => {
                error!(error = %e, "Cycle failed");
                state.cycles_failed += 1;
                state.last_error = Some(e.to_string());
            }
        }
        result
    }
}

//! Ingestion cycles.
//!
//! - [`AdvisoryLock`] keeps two workers from running a cycle at once
//! - [`CycleCoordinator`] runs one cycle: lock, list, ingest each case in
//!   order, mirror redesigns, advance the watermark, unlock
//! - [`CycleRunner`] triggers cycles on a timer, on demand, and right after a
//!   batch that made progress

mod coordinator;
mod lock;
mod runner;
mod types;

pub use coordinator::{Collaborators, CycleCoordinator};
pub use lock::{AdvisoryLock, LockAttempt};
pub use runner::{CycleRunner, RunnerStatus};
pub use types::{CycleError, CycleOutcome, CycleReport, RedesignSummary};

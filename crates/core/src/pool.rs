//! Bounded-concurrency runner for deferred tasks.
//!
//! Workers are futures polled together on the caller's task; each one claims
//! the next unclaimed task index until the queue is drained. A failing or
//! panicking task only affects its own result slot.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use futures::future::join_all;
use futures::FutureExt;
use thiserror::Error;

/// Why a pooled task produced no value.
#[derive(Debug, Error)]
pub enum TaskFailure<E> {
    /// The task returned an error.
    #[error("{0}")]
    Failed(E),

    /// The task panicked.
    #[error("task panicked: {0}")]
    Panicked(String),
}

impl<E> TaskFailure<E> {
    /// The task's own error, if it returned one.
    pub fn as_failed(&self) -> Option<&E> {
        match self {
            TaskFailure::Failed(e) => Some(e),
            TaskFailure::Panicked(_) => None,
        }
    }
}

type Slot<T, E> = Mutex<Option<Result<T, TaskFailure<E>>>>;

/// Runs `tasks` with at most `workers` in flight at once.
///
/// Results are returned in input order regardless of completion order, one
/// per task. Returns only after every task has been attempted exactly once.
pub async fn run_bounded<T, E, F, Fut>(
    tasks: Vec<F>,
    workers: usize,
) -> Vec<Result<T, TaskFailure<E>>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let total = tasks.len();
    if total == 0 {
        return Vec::new();
    }

    let queue: Vec<Mutex<Option<F>>> = tasks.into_iter().map(|t| Mutex::new(Some(t))).collect();
    let slots: Vec<Slot<T, E>> = (0..total).map(|_| Mutex::new(None)).collect();
    let next = AtomicUsize::new(0);

    let worker_count = workers.clamp(1, total);
    join_all((0..worker_count).map(|_| drain(&queue, &slots, &next))).await;

    slots
        .into_iter()
        .map(|slot| {
            slot.into_inner()
                .unwrap_or_else(PoisonError::into_inner)
                .unwrap_or_else(|| Err(TaskFailure::Panicked("task was never run".to_string())))
        })
        .collect()
}

/// One worker: claim, run, store, repeat.
async fn drain<T, E, F, Fut>(queue: &[Mutex<Option<F>>], slots: &[Slot<T, E>], next: &AtomicUsize)
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    loop {
        let idx = next.fetch_add(1, Ordering::SeqCst);
        if idx >= queue.len() {
            break;
        }

        let task = queue[idx]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(task) = task else {
            continue;
        };

        let outcome = match AssertUnwindSafe(async move { task().await })
            .catch_unwind()
            .await
        {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(TaskFailure::Failed(e)),
            Err(panic) => Err(TaskFailure::Panicked(panic_message(panic.as_ref()))),
        };

        *slots[idx].lock().unwrap_or_else(PoisonError::into_inner) = Some(outcome);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

//! Timestamp-based advisory lock over the portal's key/value store.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::portal::{KeyValueStore, PortalError};

/// Value a released lock is reset to.
const RELEASED: &str = "0";

/// Result of trying to take the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockAttempt {
    /// The lock is ours; `token` is the value we wrote.
    Acquired { token: String },
    /// Another worker holds it. `since` is unix seconds when known.
    Held { since: Option<i64> },
}

/// Cooperative lock: a key holding the unix time it was last taken.
///
/// A value younger than the window means another worker is mid-cycle. Older
/// values are stale and may be taken over, so a crashed worker blocks others
/// for at most one window.
pub struct AdvisoryLock {
    kv: Arc<dyn KeyValueStore>,
    key: String,
    window_secs: u64,
}

impl AdvisoryLock {
    pub fn new(kv: Arc<dyn KeyValueStore>, key: impl Into<String>, window_secs: u64) -> Self {
        Self {
            kv,
            key: key.into(),
            window_secs,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Tries to take the lock at `now_secs`.
    pub async fn try_acquire(&self, now_secs: i64) -> Result<LockAttempt, PortalError> {
        let entry = self.kv.get(&self.key).await?;

        let observed = match &entry {
            Some(e) if e.name != self.key => {
                warn!(
                    key = %self.key,
                    returned = %e.name,
                    "Lock lookup returned a different key, treating lock as held"
                );
                return Ok(LockAttempt::Held { since: None });
            }
            Some(e) => Some(e.value.as_str()),
            None => None,
        };

        // Unparseable values count as stale.
        if let Some(since) = observed.and_then(|v| v.trim().parse::<i64>().ok()) {
            let age = now_secs.saturating_sub(since);
            if age < self.window_secs as i64 {
                debug!(key = %self.key, age_secs = age, "Lock is held");
                return Ok(LockAttempt::Held { since: Some(since) });
            }
        }

        let token = now_secs.to_string();
        if self.kv.compare_and_set(&self.key, observed, &token).await? {
            debug!(key = %self.key, token = %token, "Lock acquired");
            Ok(LockAttempt::Acquired { token })
        } else {
            debug!(key = %self.key, "Lost the race for the lock");
            Ok(LockAttempt::Held { since: None })
        }
    }

    /// Releases the lock if it still holds `token`. Returns whether it did.
    pub async fn release(&self, token: &str) -> Result<bool, PortalError> {
        self.kv
            .compare_and_set(&self.key, Some(token), RELEASED)
            .await
    }
}

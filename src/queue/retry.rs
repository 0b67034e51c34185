use std::time::Duration;

use chrono::DateTime;

use super::Operation;

/// Exponential backoff between attempts of a single operation.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub base: Duration,
    pub cap: Duration,
}

/// Retry strategy for the operation queue.
///
/// The default reproduces the historical behavior: a fixed 15 second sync
/// cadence, every pending operation attempted on every pass, and no ceiling
/// on attempts. Backoff and `max_attempts` exist for deployments that want
/// bounded retry; exhausted operations are dropped with a warning, never
/// retained forever.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Cadence of the periodic sync task.
    pub sync_interval: Duration,
    /// Per-operation backoff; `None` retries on every pass.
    pub backoff: Option<Backoff>,
    /// Attempt ceiling; `None` retries indefinitely.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            sync_interval: Duration::from_secs(15),
            backoff: None,
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// Whether the operation is due for another attempt at `now_ms`.
    pub(crate) fn eligible(&self, op: &Operation, now_ms: i64) -> bool {
        let Some(backoff) = self.backoff else {
            return true;
        };
        let Some(last_attempt) = op.last_attempt_at.as_deref() else {
            return true;
        };
        let Ok(last) = DateTime::parse_from_rfc3339(last_attempt) else {
            return true;
        };
        let exp = op.retry_count.min(16);
        let wait_ms = (backoff.base.as_millis() as i64)
            .saturating_mul(1i64 << exp)
            .min(backoff.cap.as_millis() as i64);
        now_ms >= last.timestamp_millis().saturating_add(wait_ms)
    }

    /// Whether the operation has used up its attempt ceiling.
    pub(crate) fn exhausted(&self, retry_count: u32) -> bool {
        self.max_attempts
            .map(|max| retry_count >= max)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::OperationStatus;

    fn op_with(retry_count: u32, last_attempt_at: Option<&str>) -> Operation {
        Operation {
            id: "op-1".into(),
            kind: "saveDraft".into(),
            payload: serde_json::Value::Null,
            status: OperationStatus::Pending,
            created_at: "2024-01-01T00:00:00+00:00".into(),
            last_attempt_at: last_attempt_at.map(str::to_string),
            retry_count,
            last_error: None,
            user: None,
            entity_id: None,
        }
    }

    #[test]
    fn default_policy_is_always_eligible_and_unbounded() {
        let policy = RetryPolicy::default();
        assert!(policy.eligible(&op_with(999, Some("2024-01-01T00:00:00+00:00")), 0));
        assert!(!policy.exhausted(u32::MAX));
    }

    #[test]
    fn backoff_defers_recent_failures() {
        let policy = RetryPolicy {
            backoff: Some(Backoff {
                base: Duration::from_secs(10),
                cap: Duration::from_secs(3600),
            }),
            ..RetryPolicy::default()
        };
        let op = op_with(2, Some("2024-01-01T00:00:00+00:00"));
        let attempt_ms = DateTime::parse_from_rfc3339("2024-01-01T00:00:00+00:00")
            .unwrap()
            .timestamp_millis();
        // retry_count 2 -> wait 40s
        assert!(!policy.eligible(&op, attempt_ms + 39_000));
        assert!(policy.eligible(&op, attempt_ms + 40_000));
    }

    #[test]
    fn backoff_waits_are_capped() {
        let policy = RetryPolicy {
            backoff: Some(Backoff {
                base: Duration::from_secs(10),
                cap: Duration::from_secs(60),
            }),
            ..RetryPolicy::default()
        };
        let op = op_with(16, Some("2024-01-01T00:00:00+00:00"));
        let attempt_ms = DateTime::parse_from_rfc3339("2024-01-01T00:00:00+00:00")
            .unwrap()
            .timestamp_millis();
        assert!(policy.eligible(&op, attempt_ms + 60_000));
    }

    #[test]
    fn max_attempts_marks_exhaustion() {
        let policy = RetryPolicy {
            max_attempts: Some(3),
            ..RetryPolicy::default()
        };
        assert!(!policy.exhausted(2));
        assert!(policy.exhausted(3));
    }
}

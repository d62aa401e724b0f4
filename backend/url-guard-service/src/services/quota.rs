use crate::config::QuotaConfig;
use crate::error::UrlGuardError;
use crate::metrics;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Outcome of a quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl QuotaDecision {
    /// Structured rejection for a denied decision, `None` when allowed.
    pub fn rejection(&self, limit: u32) -> Option<UrlGuardError> {
        (!self.allowed).then_some(UrlGuardError::QuotaExceeded {
            reset_at: self.reset_at,
            limit,
        })
    }
}

#[derive(Debug, Default)]
struct QuotaWindow {
    count: u32,
    /// `None` until the first consume after start-up.
    window_start: Option<DateTime<Utc>>,
}

/// Rolling-window counter of requests delegated to the feed provider.
///
/// Open while `count < ceiling`, closed otherwise until the window rolls
/// over. The read-reset-increment sequence runs under one short-held lock.
pub struct QuotaTracker {
    config: QuotaConfig,
    window: Mutex<QuotaWindow>,
}

impl QuotaTracker {
    pub fn new(config: QuotaConfig) -> Self {
        Self {
            config,
            window: Mutex::new(QuotaWindow::default()),
        }
    }

    pub fn config(&self) -> &QuotaConfig {
        &self.config
    }

    /// Items to request downstream for a caller asking for `requested`.
    pub fn batch_size(&self, requested: u32) -> u32 {
        requested.clamp(1, self.config.per_call_batch_cap.max(1))
    }

    pub fn try_consume(&self) -> QuotaDecision {
        self.try_consume_at(Utc::now())
    }

    pub fn try_consume_at(&self, now: DateTime<Utc>) -> QuotaDecision {
        let mut window = self.lock();
        let window_start = self.roll_over(&mut window, now);
        let reset_at = self.reset_after(window_start);

        let decision = if window.count >= self.config.ceiling {
            QuotaDecision {
                allowed: false,
                remaining: 0,
                reset_at,
            }
        } else {
            window.count += 1;
            QuotaDecision {
                allowed: true,
                remaining: self.config.ceiling - window.count,
                reset_at,
            }
        };
        drop(window);

        metrics::FEED_QUOTA_DECISIONS_TOTAL
            .with_label_values(&[if decision.allowed { "allowed" } else { "denied" }])
            .inc();

        if !decision.allowed {
            tracing::info!(reset_at = %decision.reset_at, "Feed quota exhausted");
        }

        decision
    }

    /// Current state without consuming.
    pub fn peek(&self) -> QuotaDecision {
        self.peek_at(Utc::now())
    }

    pub fn peek_at(&self, now: DateTime<Utc>) -> QuotaDecision {
        let window = self.lock();
        let (count, window_start) = match window.window_start {
            Some(start) if now - start < self.config.window => (window.count, start),
            _ => (0, now),
        };

        QuotaDecision {
            allowed: count < self.config.ceiling,
            remaining: self.config.ceiling.saturating_sub(count),
            reset_at: self.reset_after(window_start),
        }
    }

    /// Reset the window when it has expired (or never started) and return its start.
    fn roll_over(&self, window: &mut QuotaWindow, now: DateTime<Utc>) -> DateTime<Utc> {
        match window.window_start {
            Some(start) if now - start < self.config.window => start,
            _ => {
                window.count = 0;
                window.window_start = Some(now);
                now
            }
        }
    }

    fn reset_after(&self, window_start: DateTime<Utc>) -> DateTime<Utc> {
        window_start
            .checked_add_signed(self.config.window)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    fn lock(&self) -> MutexGuard<'_, QuotaWindow> {
        // Every mutation completes before the guard drops, so a poisoned
        // window is still consistent.
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn count(&self) -> u32 {
        self.lock().count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::sync::{Arc, Barrier};

    fn tracker(ceiling: u32) -> QuotaTracker {
        QuotaTracker::new(QuotaConfig {
            window: Duration::hours(1),
            ceiling,
            per_call_batch_cap: 10,
        })
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_ceiling_then_rejection() {
        let quota = tracker(50);
        let first = t0();

        for i in 0..50 {
            let decision = quota.try_consume_at(first + Duration::seconds(i));
            assert!(decision.allowed, "call {} should be allowed", i + 1);
            assert_eq!(decision.remaining, 50 - (i as u32 + 1));
        }

        let denied = quota.try_consume_at(first + Duration::minutes(30));
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert_eq!(denied.reset_at, first + Duration::hours(1));
        assert_eq!(quota.count(), 50);
    }

    #[test]
    fn test_window_rollover_reopens() {
        let quota = tracker(2);
        quota.try_consume_at(t0());
        quota.try_consume_at(t0());
        assert!(!quota.try_consume_at(t0() + Duration::minutes(59)).allowed);

        let later = t0() + Duration::hours(1);
        let decision = quota.try_consume_at(later);
        assert!(decision.allowed);
        assert_eq!(quota.count(), 1);
        assert_eq!(decision.reset_at, later + Duration::hours(1));
    }

    #[test]
    fn test_rejection_carries_reset_time() {
        let quota = tracker(0);
        let decision = quota.try_consume_at(t0());
        match decision.rejection(0) {
            Some(UrlGuardError::QuotaExceeded { reset_at, limit }) => {
                assert_eq!(reset_at, t0() + Duration::hours(1));
                assert_eq!(limit, 0);
            }
            other => panic!("expected quota rejection, got {:?}", other),
        }
        assert!(tracker(1).try_consume_at(t0()).rejection(1).is_none());
    }

    #[test]
    fn test_peek_does_not_consume() {
        let quota = tracker(3);
        quota.try_consume_at(t0());
        let peeked = quota.peek_at(t0() + Duration::minutes(1));
        assert!(peeked.allowed);
        assert_eq!(peeked.remaining, 2);
        assert_eq!(quota.count(), 1);

        let expired = quota.peek_at(t0() + Duration::hours(2));
        assert_eq!(expired.remaining, 3);
        assert_eq!(quota.count(), 1);
    }

    #[test]
    fn test_batch_size_is_capped() {
        let quota = tracker(50);
        assert_eq!(quota.batch_size(9), 9);
        assert_eq!(quota.batch_size(100), 10);
        assert_eq!(quota.batch_size(0), 1);
    }

    #[test]
    fn test_concurrent_consume_at_last_slot() {
        let quota = Arc::new(tracker(50));
        for _ in 0..49 {
            assert!(quota.try_consume_at(t0()).allowed);
        }

        let callers = 32;
        let barrier = Arc::new(Barrier::new(callers));
        let handles: Vec<_> = (0..callers)
            .map(|_| {
                let quota = quota.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    quota.try_consume_at(t0() + Duration::seconds(1)).allowed
                })
            })
            .collect();

        let allowed = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|allowed| *allowed)
            .count();
        assert_eq!(allowed, 1);
        assert_eq!(quota.count(), 50);
    }

    #[test]
    fn test_oversized_window_saturates_reset_time() {
        let quota = QuotaTracker::new(QuotaConfig {
            window: Duration::MAX,
            ceiling: 1,
            per_call_batch_cap: 10,
        });

        let first = quota.try_consume_at(t0());
        assert!(first.allowed);
        assert_eq!(first.reset_at, DateTime::<Utc>::MAX_UTC);

        assert!(!quota.try_consume_at(t0() + Duration::days(400)).allowed);
        assert_eq!(quota.peek_at(t0()).reset_at, DateTime::<Utc>::MAX_UTC);
    }
}

//! Debounce gate: admits at most one request per interval.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Serialized admission control over a single "last accepted" timestamp.
///
/// Every check-and-update runs under one mutex, so concurrent callers are
/// totally ordered and at most one of them can be admitted per interval.
#[derive(Debug)]
pub struct DebounceGate {
    interval: Duration,
    last_accepted: Mutex<Option<Instant>>,
}

impl DebounceGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_accepted: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Admit a request arriving at `now`.
    ///
    /// Returns true and records `now` if at least one interval has passed
    /// since the last admitted request (or none was ever admitted).
    /// Otherwise returns false and leaves the gate untouched.
    pub fn should_admit(&self, now: Instant) -> bool {
        let mut last = self
            .last_accepted
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let admit = match *last {
            None => true,
            // A `now` earlier than the last admission has not waited at all.
            Some(prev) => now
                .checked_duration_since(prev)
                .is_some_and(|elapsed| elapsed >= self.interval),
        };
        if admit {
            *last = Some(now);
        }
        admit
    }

    /// Admit a request arriving right now.
    pub fn admit_now(&self) -> bool {
        self.should_admit(Instant::now())
    }
}

impl Default for DebounceGate {
    fn default() -> Self {
        Self::new(Duration::from_millis(crate::config::DEFAULT_DEBOUNCE_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    const INTERVAL: Duration = Duration::from_millis(500);

    #[test]
    fn test_first_request_admitted() {
        let gate = DebounceGate::new(INTERVAL);
        assert!(gate.should_admit(Instant::now()));
    }

    #[test]
    fn test_just_inside_interval_rejected() {
        let gate = DebounceGate::new(INTERVAL);
        let t = Instant::now();
        assert!(gate.should_admit(t));
        assert!(!gate.should_admit(t + INTERVAL - Duration::from_millis(1)));
    }

    #[test]
    fn test_exactly_one_interval_admitted() {
        let gate = DebounceGate::new(INTERVAL);
        let t = Instant::now();
        assert!(gate.should_admit(t));
        assert!(gate.should_admit(t + INTERVAL));
    }

    #[test]
    fn test_rejection_has_no_side_effects() {
        let gate = DebounceGate::new(INTERVAL);
        let t = Instant::now();
        assert!(gate.should_admit(t));
        // A rejected call must not push the window forward.
        assert!(!gate.should_admit(t + Duration::from_millis(300)));
        assert!(gate.should_admit(t + INTERVAL));
    }

    #[test]
    fn test_earlier_timestamp_rejected() {
        let gate = DebounceGate::new(INTERVAL);
        let t = Instant::now() + Duration::from_secs(1);
        assert!(gate.should_admit(t));
        assert!(!gate.should_admit(t - Duration::from_millis(10)));
    }

    #[test]
    fn test_zero_interval_admits_everything() {
        let gate = DebounceGate::new(Duration::ZERO);
        let t = Instant::now();
        assert!(gate.should_admit(t));
        assert!(gate.should_admit(t));
    }

    #[test]
    fn test_concurrent_callers_admit_once() {
        let gate = Arc::new(DebounceGate::new(Duration::from_secs(60)));
        let admitted = Arc::new(AtomicUsize::new(0));
        let now = Instant::now();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let gate = Arc::clone(&gate);
                let admitted = Arc::clone(&admitted);
                thread::spawn(move || {
                    if gate.should_admit(now) {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(admitted.load(Ordering::SeqCst), 1);
    }
}

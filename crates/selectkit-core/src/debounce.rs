// crates/selectkit-core/src/debounce.rs

//! Trailing-edge debounce.
//!
//! The scheduler never owns a timer. Hosts call [`DebounceScheduler::poll`]
//! whenever their event loop wakes (and may use [`DebounceScheduler::deadline`]
//! to decide when that should be), so the same code runs under a browser timer,
//! a tokio sleep, or a test that advances a manual clock.

use crate::clock::Timestamp;
use std::time::Duration;

#[derive(Debug)]
struct Pending<T> {
    value: T,
    due: Timestamp,
}

/// Coalesces a burst of values into one emission of the last value once the
/// input has been quiet for the scheduled delay.
#[derive(Debug)]
pub struct DebounceScheduler<T> {
    pending: Option<Pending<T>>,
    emitted: u64,
}

impl<T> Default for DebounceScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DebounceScheduler<T> {
    pub fn new() -> Self {
        Self {
            pending: None,
            emitted: 0,
        }
    }

    /// Replaces any pending value. The earlier value will never be emitted.
    pub fn schedule(&mut self, value: T, delay: Duration, now: Timestamp) {
        self.pending = Some(Pending {
            value,
            due: now + delay,
        });
    }

    /// Emits the pending value if its quiet period has elapsed.
    ///
    /// A zero delay is due on the first poll, which still coalesces every
    /// `schedule` made before it into a single emission.
    pub fn poll(&mut self, now: Timestamp) -> Option<T> {
        match &self.pending {
            Some(p) if now >= p.due => {
                self.emitted += 1;
                self.pending.take().map(|p| p.value)
            }
            _ => None,
        }
    }

    /// Drops the pending value without emitting it.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending value becomes due, if any.
    pub fn deadline(&self) -> Option<Timestamp> {
        self.pending.as_ref().map(|p| p.due)
    }

    pub fn peek(&self) -> Option<&T> {
        self.pending.as_ref().map(|p| &p.value)
    }

    /// Number of values emitted so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const WINDOW: Duration = Duration::from_millis(300);

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(10)]
    fn burst_emits_only_the_last_value(#[case] n: u64) {
        let mut d = DebounceScheduler::new();
        for i in 0..n {
            d.schedule(i, WINDOW, Timestamp(i * 50));
        }
        let last_at = (n - 1) * 50;

        assert_eq!(d.poll(Timestamp(last_at + 299)), None);
        assert_eq!(d.poll(Timestamp(last_at + 300)), Some(n - 1));
        assert_eq!(d.poll(Timestamp(last_at + 10_000)), None);
        assert_eq!(d.emitted(), 1);
    }

    #[test]
    fn zero_delay_coalesces_same_tick_burst() {
        let mut d = DebounceScheduler::new();
        d.schedule("a", Duration::ZERO, Timestamp(7));
        d.schedule("ab", Duration::ZERO, Timestamp(7));
        d.schedule("abc", Duration::ZERO, Timestamp(7));
        assert_eq!(d.poll(Timestamp(7)), Some("abc"));
        assert_eq!(d.poll(Timestamp(7)), None);
    }

    #[test]
    fn cancel_is_total() {
        let mut d = DebounceScheduler::new();
        d.schedule("x", WINDOW, Timestamp(0));
        assert!(d.cancel());
        assert!(!d.is_pending());
        assert_eq!(d.poll(Timestamp(1_000)), None);
        assert_eq!(d.emitted(), 0);
    }

    #[test]
    fn separate_quiet_runs_emit_in_order() {
        let mut d = DebounceScheduler::new();
        d.schedule("first", WINDOW, Timestamp(0));
        assert_eq!(d.deadline(), Some(Timestamp(300)));
        assert_eq!(d.poll(Timestamp(300)), Some("first"));

        d.schedule("second", WINDOW, Timestamp(400));
        assert_eq!(d.peek(), Some(&"second"));
        assert_eq!(d.poll(Timestamp(700)), Some("second"));
        assert_eq!(d.emitted(), 2);
    }
}

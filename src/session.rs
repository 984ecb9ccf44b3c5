//! Debounced export scheduling.
//!
//! Editing a layout fires many small changes in quick succession;
//! regenerating output on every one is wasteful, and applying a fresh
//! import itself mutates the model, which must not immediately trigger
//! a re-export of what was just parsed. The scheduler coalesces
//! changes behind a debounce interval and ignores changes that land
//! inside the settle window opened after an apply.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct ExportScheduler {
    debounce: Duration,
    settle: Duration,
    last_change: Option<Instant>,
    settle_until: Option<Instant>,
}

impl Default for ExportScheduler {
    fn default() -> Self {
        ExportScheduler::new(Duration::from_millis(50), Duration::from_millis(250))
    }
}

impl ExportScheduler {
    pub fn new(debounce: Duration, settle: Duration) -> Self {
        ExportScheduler {
            debounce,
            settle,
            last_change: None,
            settle_until: None,
        }
    }

    /// Record a model change at `now`. Changes inside the settle
    /// window are echoes of an apply and are dropped.
    pub fn note_change(&mut self, now: Instant) {
        if let Some(until) = self.settle_until {
            if now < until {
                return;
            }
            self.settle_until = None;
        }
        self.last_change = Some(now);
    }

    /// Open a settle window, swallowing change echoes until it ends.
    pub fn note_applied(&mut self, now: Instant) {
        self.settle_until = Some(now + self.settle);
        self.last_change = None;
    }

    /// True when a pending change has been quiet long enough.
    /// Consumes the pending change.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.last_change {
            Some(changed) if now.duration_since(changed) >= self.debounce => {
                self.last_change = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.last_change.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> ExportScheduler {
        ExportScheduler::new(Duration::from_millis(300), Duration::from_millis(500))
    }

    #[test]
    fn test_poll_waits_for_debounce() {
        let mut s = scheduler();
        let t0 = Instant::now();
        s.note_change(t0);
        assert!(!s.poll(t0 + Duration::from_millis(100)));
        assert!(s.poll(t0 + Duration::from_millis(300)));
        // Consumed; nothing further to export.
        assert!(!s.poll(t0 + Duration::from_millis(600)));
    }

    #[test]
    fn test_rapid_changes_coalesce() {
        let mut s = scheduler();
        let t0 = Instant::now();
        s.note_change(t0);
        s.note_change(t0 + Duration::from_millis(200));
        // The second change reset the quiet period.
        assert!(!s.poll(t0 + Duration::from_millis(350)));
        assert!(s.poll(t0 + Duration::from_millis(500)));
    }

    #[test]
    fn test_settle_window_swallows_echoes() {
        let mut s = scheduler();
        let t0 = Instant::now();
        s.note_applied(t0);
        s.note_change(t0 + Duration::from_millis(100));
        assert!(!s.is_dirty());
        assert!(!s.poll(t0 + Duration::from_secs(5)));
        // After the window closes, changes count again.
        s.note_change(t0 + Duration::from_millis(600));
        assert!(s.poll(t0 + Duration::from_millis(900)));
    }
}

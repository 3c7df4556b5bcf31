// src/watch/debounce.rs

//! Per-path debouncing of file events.
//!
//! Each event restarts the quiet window of its path. A path is flushed once
//! no event for it arrived for the whole window. Pure and clock-injected.

use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: HashMap<String, Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashMap::new(),
        }
    }

    pub fn record(&mut self, rel_path: String, now: Instant) {
        self.pending.insert(rel_path, now + self.window);
    }

    /// Earliest moment a pending path becomes due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().copied()
    }

    /// Remove and return every path whose window elapsed, sorted.
    pub fn take_due(&mut self, now: Instant) -> Vec<String> {
        let mut due: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(path, _)| path.clone())
            .collect();
        for path in &due {
            self.pending.remove(path);
        }
        due.sort();
        due
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_on_one_path_flushes_once_after_quiet_window() {
        let t0 = Instant::now();
        let window = Duration::from_millis(100);
        let mut d = Debouncer::new(window);

        d.record("src/a.scss".into(), t0);
        d.record("src/a.scss".into(), t0 + Duration::from_millis(60));
        assert!(d.take_due(t0 + Duration::from_millis(120)).is_empty());

        let due = d.take_due(t0 + Duration::from_millis(160));
        assert_eq!(due, vec!["src/a.scss".to_string()]);
        assert!(d.is_empty());
    }

    #[test]
    fn paths_are_independent() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(100));
        d.record("a".into(), t0);
        d.record("b".into(), t0 + Duration::from_millis(50));

        assert_eq!(d.next_deadline(), Some(t0 + Duration::from_millis(100)));
        assert_eq!(d.take_due(t0 + Duration::from_millis(100)), vec!["a".to_string()]);
        assert_eq!(d.take_due(t0 + Duration::from_millis(150)), vec!["b".to_string()]);
    }
}

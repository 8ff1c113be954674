use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct Counter {
    scanned: AtomicUsize,
    sorted: AtomicUsize,
    pooled: AtomicUsize,
    skipped: AtomicUsize,
    already_sorted: AtomicUsize,
    failed: AtomicUsize,
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

impl Counter {
    pub fn new() -> Self {
        Self {
            scanned: AtomicUsize::new(0),
            sorted: AtomicUsize::new(0),
            pooled: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            already_sorted: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        }
    }

    fn slot(&self, counter: Counters) -> &AtomicUsize {
        match counter {
            Counters::Scanned => &self.scanned,
            Counters::Sorted => &self.sorted,
            Counters::Pooled => &self.pooled,
            Counters::Skipped => &self.skipped,
            Counters::AlreadySorted => &self.already_sorted,
            Counters::Failed => &self.failed,
        }
    }

    pub fn increment(&self, counter: Counters) {
        self.slot(counter).fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self, counter: Counters) -> usize {
        self.slot(counter).load(Ordering::SeqCst)
    }

    pub fn summary(&self) -> Summary {
        Summary {
            scanned: self.get(Counters::Scanned),
            sorted: self.get(Counters::Sorted),
            pooled: self.get(Counters::Pooled),
            skipped: self.get(Counters::Skipped),
            already_sorted: self.get(Counters::AlreadySorted),
            failed: self.get(Counters::Failed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counters {
    Scanned,
    /// Transferred into a dated folder.
    Sorted,
    /// Transferred into the unmatched pool.
    Pooled,
    /// Unmatched and left in place.
    Skipped,
    AlreadySorted,
    Failed,
}

/// Counts for one finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub scanned: usize,
    pub sorted: usize,
    pub pooled: usize,
    pub skipped: usize,
    pub already_sorted: usize,
    pub failed: usize,
}

impl Summary {
    /// Every scanned file lands in exactly one bucket.
    pub fn is_balanced(&self) -> bool {
        self.scanned
            == self.sorted + self.pooled + self.skipped + self.already_sorted + self.failed
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files scanned: {} sorted, {} unmatched pooled, {} skipped, {} already sorted, {} failed",
            self.scanned, self.sorted, self.pooled, self.skipped, self.already_sorted, self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_independent() {
        let counter = Counter::new();
        counter.increment(Counters::Scanned);
        counter.increment(Counters::Scanned);
        counter.increment(Counters::Sorted);
        counter.increment(Counters::Failed);

        assert_eq!(counter.get(Counters::Scanned), 2);
        assert_eq!(counter.get(Counters::Sorted), 1);
        assert_eq!(counter.get(Counters::Failed), 1);
        assert_eq!(counter.get(Counters::Pooled), 0);
        assert!(counter.summary().is_balanced());
    }

    #[test]
    fn test_summary_display() {
        let summary = Summary {
            scanned: 3,
            sorted: 1,
            pooled: 1,
            skipped: 1,
            ..Default::default()
        };

        assert_eq!(
            summary.to_string(),
            "3 files scanned: 1 sorted, 1 unmatched pooled, 1 skipped, 0 already sorted, 0 failed"
        );
    }
}

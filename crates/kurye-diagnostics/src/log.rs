use std::collections::VecDeque;

use crate::classify::ErrorRecord;

pub const DEFAULT_CAPACITY: usize = 100;

/// Bounded record buffer; the oldest record is evicted once full.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    records: VecDeque<ErrorRecord>,
    capacity: usize,
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ErrorLog {
    /// A capacity of zero is treated as one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, record: ErrorRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Up to `n` records, newest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<ErrorRecord> {
        self.records.iter().rev().take(n).cloned().collect()
    }

    /// All records, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ErrorRecord> {
        self.records.iter()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::failure::Failure;

    fn record(n: usize) -> ErrorRecord {
        classify(&Failure::other(format!("failure {n}")), "test")
    }

    #[test]
    fn never_exceeds_capacity_and_evicts_oldest() {
        let mut log = ErrorLog::default();
        for n in 0..150 {
            log.push(record(n));
            assert!(log.len() <= DEFAULT_CAPACITY);
        }
        assert_eq!(log.len(), 100);
        assert_eq!(log.iter().next().unwrap().original_error, "failure 50");
        assert_eq!(log.recent(1)[0].original_error, "failure 149");
    }

    #[test]
    fn recent_is_newest_first() {
        let mut log = ErrorLog::with_capacity(3);
        for n in 0..3 {
            log.push(record(n));
        }
        let recent: Vec<_> = log
            .recent(5)
            .into_iter()
            .map(|r| r.original_error)
            .collect();
        assert_eq!(recent, ["failure 2", "failure 1", "failure 0"]);
    }

    #[test]
    fn clear_empties_the_log() {
        let mut log = ErrorLog::with_capacity(2);
        log.push(record(1));
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.capacity(), 2);
    }
}

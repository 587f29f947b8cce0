use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::classify::{classify, Category, ErrorRecord, Severity};
use crate::failure::Failure;
use crate::log::ErrorLog;
use crate::present::{present_to_user, PresentOptions, Presenter};

const DEFAULT_RECENT: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct ErrorStats {
    pub total: usize,
    pub by_category: BTreeMap<Category, usize>,
    pub by_severity: BTreeMap<Severity, usize>,
    /// Newest first.
    pub recent: Vec<ErrorRecord>,
}

/// Shared diagnostic sink. Cheap to share behind an `Arc`.
#[derive(Debug)]
pub struct ErrorReporter {
    log: Mutex<ErrorLog>,
    logging_enabled: bool,
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ErrorReporter {
    #[must_use]
    pub fn new(logging_enabled: bool) -> Self {
        Self::with_log(ErrorLog::default(), logging_enabled)
    }

    #[must_use]
    pub fn with_log(log: ErrorLog, logging_enabled: bool) -> Self {
        Self {
            log: Mutex::new(log),
            logging_enabled,
        }
    }

    // A panic while holding the lock cannot leave the log half-written, so
    // a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, ErrorLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self, record: ErrorRecord) {
        if self.logging_enabled {
            tracing::error!(
                category = %record.category,
                severity = %record.severity,
                context = %record.context,
                original = %record.original_error,
                "{}",
                record.user_message
            );
        }
        self.lock().push(record);
    }

    /// Classifies and records `failure` without presenting anything.
    pub fn report(&self, failure: &Failure, context: &str) -> ErrorRecord {
        let record = classify(failure, context);
        self.record(record.clone());
        record
    }

    /// Classifies, records, and presents `failure` unless `options.silent`.
    pub fn handle(
        &self,
        failure: &Failure,
        context: &str,
        options: &PresentOptions,
        presenter: &dyn Presenter,
    ) -> ErrorRecord {
        let record = self.report(failure, context);
        if !options.silent {
            if let Some(dialog) = present_to_user(&record, options) {
                presenter.present(dialog);
            }
        }
        record
    }

    #[must_use]
    pub fn stats(&self) -> ErrorStats {
        self.stats_with_recent(DEFAULT_RECENT)
    }

    #[must_use]
    pub fn stats_with_recent(&self, recent_n: usize) -> ErrorStats {
        let log = self.lock();
        let mut by_category = BTreeMap::new();
        let mut by_severity = BTreeMap::new();
        for record in log.iter() {
            *by_category.entry(record.category).or_insert(0) += 1;
            *by_severity.entry(record.severity).or_insert(0) += 1;
        }
        ErrorStats {
            total: log.len(),
            by_category,
            by_severity,
            recent: log.recent(recent_n),
        }
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

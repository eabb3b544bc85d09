// src/pipeline/concurrent.rs
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;
use parking_lot::Mutex;
use log::{debug, warn};

use crate::enricher::{AnnotationFailure, EnrichOutcome, EnrichmentReport};
use crate::error::Error;

/// Shared cancellation flag.
///
/// Clones observe the same flag. A child token also observes every
/// ancestor, while cancelling the child leaves its ancestors running.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    ancestors: Vec<Arc<AtomicBool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child(&self) -> Self {
        let mut ancestors = self.ancestors.clone();
        ancestors.push(self.cancelled.clone());
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            ancestors,
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
            || self.ancestors.iter().any(|flag| flag.load(Ordering::SeqCst))
    }
}

/// Gathers per-annotation outcomes from every worker of a pass.
pub struct OutcomeCollector {
    enriched: AtomicUsize,
    not_found: AtomicUsize,
    skipped: AtomicUsize,
    unprocessed: AtomicUsize,
    failures: Mutex<Vec<AnnotationFailure>>,
    fatal: Mutex<Option<Error>>,
    suppressed_fatal: AtomicUsize,
    timed_out: AtomicBool,
    start_time: Instant,
}

impl Default for OutcomeCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl OutcomeCollector {
    pub fn new() -> Self {
        Self {
            enriched: AtomicUsize::new(0),
            not_found: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            unprocessed: AtomicUsize::new(0),
            failures: Mutex::new(Vec::new()),
            fatal: Mutex::new(None),
            suppressed_fatal: AtomicUsize::new(0),
            timed_out: AtomicBool::new(false),
            start_time: Instant::now(),
        }
    }

    pub fn record_outcome(&self, outcome: EnrichOutcome) {
        let counter = match outcome {
            EnrichOutcome::Enriched => &self.enriched,
            EnrichOutcome::NotFound => &self.not_found,
            EnrichOutcome::Skipped => &self.skipped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self, failure: AnnotationFailure) {
        debug!("Annotation {} [{}, {}) left unmodified: {}",
               failure.id, failure.start, failure.end, failure.error);
        self.failures.lock().push(failure);
    }

    /// Keeps the first fatal error; later ones are logged and counted.
    /// Returns true when `error` was the first.
    pub fn record_fatal(&self, error: Error) -> bool {
        let mut fatal = self.fatal.lock();
        if fatal.is_none() {
            *fatal = Some(error);
            true
        } else {
            warn!("Additional store error after abort: {}", error);
            self.suppressed_fatal.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    pub fn add_unprocessed(&self, count: usize) {
        if count > 0 {
            self.unprocessed.fetch_add(count, Ordering::Relaxed);
        }
    }

    /// Returns true for the first caller only.
    pub fn mark_timed_out(&self) -> bool {
        !self.timed_out.swap(true, Ordering::SeqCst)
    }

    pub fn timed_out(&self) -> bool {
        self.timed_out.load(Ordering::SeqCst)
    }

    pub fn suppressed_fatal(&self) -> usize {
        self.suppressed_fatal.load(Ordering::Relaxed)
    }

    /// Counts and failures (ordered by annotation position) plus the first fatal error.
    pub fn into_report(self) -> (EnrichmentReport, Option<Error>) {
        let mut failures = self.failures.into_inner();
        failures.sort_by_key(|failure| failure.index);

        let report = EnrichmentReport {
            enriched: self.enriched.into_inner(),
            not_found: self.not_found.into_inner(),
            skipped: self.skipped.into_inner(),
            unprocessed: self.unprocessed.into_inner(),
            failures,
            elapsed: self.start_time.elapsed(),
            ..EnrichmentReport::default()
        };

        (report, self.fatal.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::SpanError;

    #[test]
    fn child_token_sees_parent_cancellation() {
        let parent = CancelToken::new();
        let child = parent.child();
        let grandchild = child.child();

        assert!(!grandchild.is_cancelled());
        parent.cancel();
        assert!(child.is_cancelled());
        assert!(grandchild.is_cancelled());
    }

    #[test]
    fn cancelling_child_leaves_parent_running() {
        let parent = CancelToken::new();
        let child = parent.child();
        child.cancel();

        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
        assert!(!parent.child().is_cancelled());
    }

    #[test]
    fn keeps_first_fatal_error_only() {
        let collector = OutcomeCollector::new();
        assert!(collector.record_fatal(Error::connection("first")));
        assert!(!collector.record_fatal(Error::connection("second")));
        assert_eq!(collector.suppressed_fatal(), 1);

        let (_, fatal) = collector.into_report();
        match fatal {
            Some(Error::Connection(msg)) => assert_eq!(msg, "first"),
            other => panic!("unexpected fatal error: {:?}", other),
        }
    }

    #[test]
    fn failures_are_ordered_by_position() {
        let collector = OutcomeCollector::new();
        for index in [4usize, 1, 3] {
            collector.record_failure(AnnotationFailure {
                index,
                id: index as u32,
                start: 5,
                end: 2,
                error: SpanError::InvalidSpan { start: 5, end: 2 },
            });
        }
        collector.record_outcome(EnrichOutcome::Enriched);
        collector.add_unprocessed(2);

        let (report, fatal) = collector.into_report();
        assert!(fatal.is_none());
        assert_eq!(report.enriched, 1);
        assert_eq!(report.unprocessed, 2);
        let order: Vec<usize> = report.failures.iter().map(|f| f.index).collect();
        assert_eq!(order, vec![1, 3, 4]);
    }
}

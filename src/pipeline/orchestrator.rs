// src/pipeline/orchestrator.rs
use std::time::Instant;
use crossbeam_channel::{bounded, Receiver, SendError};
use crossbeam_utils::thread;
use log::{info, debug, warn, error, trace};

use crate::enricher::{AnnotationFailure, Enricher, EnrichmentReport};
use crate::error::{Error, Result};
use crate::types::EntityAnnotation;
use super::concurrent::{CancelToken, OutcomeCollector};
pub use crate::config::subsystems::orchestrator::OrchestratorConfig;

/// Splits the eligible annotations of a document into fixed-size batches and
/// enriches them on a bounded pool of scoped worker threads.
///
/// Batches are disjoint slices of the caller's annotations, so workers write
/// results in place without locking. The annotations afterwards are the same
/// as those produced by [`Enricher::enrich_all`].
pub struct BatchOrchestrator {
    config: OrchestratorConfig,
    cancel: CancelToken,
}

impl BatchOrchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        Self {
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Run under an externally owned token, e.g. one tripped by Ctrl-C.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Enriches every eligible annotation and waits for all workers.
    ///
    /// Span errors stay in the report. The first store error cancels the
    /// remaining work and is returned; so are a timeout and an external
    /// cancellation that left annotations unprocessed.
    pub fn run(&self, enricher: &Enricher<'_>, annotations: &mut [EntityAnnotation]) -> Result<EnrichmentReport> {
        let start_time = Instant::now();
        let total = annotations.len();

        let mut eligible: Vec<(usize, &mut EntityAnnotation)> = annotations
            .iter_mut()
            .enumerate()
            .filter(|(_, annotation)| enricher.is_eligible(annotation))
            .collect();
        let skipped = total - eligible.len();

        let batch_size = self.config.batch_size.max(1);
        let batch_count = (eligible.len() + batch_size - 1) / batch_size;
        let workers = self.config.effective_workers().min(batch_count).max(1);
        let deadline = self.config.timeout().map(|timeout| start_time + timeout);

        // Tripped on abort; the caller's token only observes it the other way round
        let run_token = self.cancel.child();
        let collector = OutcomeCollector::new();

        debug!("Enriching {} of {} annotations in {} batches of {} on {} workers",
               eligible.len(), total, batch_count, batch_size, workers);

        if batch_count > 0 {
            let (sender, receiver) = bounded(self.config.effective_queue_capacity().max(1));

            let scope_result = thread::scope(|scope| {
                for worker_id in 0..workers {
                    let receiver = receiver.clone();
                    let collector = &collector;
                    let run_token = &run_token;
                    scope.spawn(move |_| {
                        run_worker(worker_id, receiver, enricher, collector, run_token, deadline)
                    });
                }
                drop(receiver);

                for (batch_id, batch) in eligible.chunks_mut(batch_size).enumerate() {
                    if run_token.is_cancelled() {
                        collector.add_unprocessed(batch.len());
                        continue;
                    }
                    if let Err(SendError((_, batch))) = sender.send((batch_id, batch)) {
                        // Every worker is gone
                        collector.add_unprocessed(batch.len());
                    }
                }
                drop(sender);
            });

            if scope_result.is_err() {
                error!("An enrichment worker panicked");
                return Err(Error::worker("enrichment worker panicked"));
            }
        }

        let timed_out = collector.timed_out();
        let suppressed = collector.suppressed_fatal();
        let (mut report, fatal) = collector.into_report();
        report.total = total;
        report.skipped += skipped;
        report.batches = batch_count;
        report.workers = workers;
        report.elapsed = start_time.elapsed();

        if let Some(error) = fatal {
            if suppressed > 0 {
                warn!("{} further store errors followed the first", suppressed);
            }
            error!("Enrichment aborted after {} of {} eligible annotations: {}",
                   report.processed(), total - skipped, error);
            return Err(error);
        }

        if timed_out {
            let timeout = self.config.timeout().unwrap_or_default();
            warn!("Enrichment timed out with {} annotations unprocessed", report.unprocessed);
            return Err(Error::Timeout(timeout));
        }

        if report.unprocessed > 0 && self.cancel.is_cancelled() {
            warn!("Enrichment cancelled with {} annotations unprocessed", report.unprocessed);
            return Err(Error::Cancelled(format!("{} annotations not processed", report.unprocessed)));
        }

        info!("Enriched {} annotations ({} not found, {} skipped, {} failed) in {:?}",
              report.enriched, report.not_found, report.skipped, report.failures.len(), report.elapsed);

        Ok(report)
    }
}

fn run_worker(
    worker_id: usize,
    receiver: Receiver<(usize, &mut [(usize, &mut EntityAnnotation)])>,
    enricher: &Enricher<'_>,
    collector: &OutcomeCollector,
    cancel: &CancelToken,
    deadline: Option<Instant>,
) {
    let mut batches_done = 0usize;

    for (batch_id, batch) in receiver.iter() {
        let batch_len = batch.len();
        trace!("Worker {} took batch {} ({} annotations)", worker_id, batch_id, batch_len);

        for (position, entry) in batch.iter_mut().enumerate() {
            if cancel.is_cancelled() {
                collector.add_unprocessed(batch_len - position);
                break;
            }
            if deadline.map_or(false, |deadline| Instant::now() >= deadline) {
                if collector.mark_timed_out() {
                    warn!("Enrichment deadline reached; cancelling remaining batches");
                }
                cancel.cancel();
                collector.add_unprocessed(batch_len - position);
                break;
            }

            let index = entry.0;
            let annotation = &mut *entry.1;
            match enricher.enrich(annotation) {
                Ok(outcome) => collector.record_outcome(outcome),
                Err(Error::Span(error)) => collector.record_failure(AnnotationFailure {
                    index,
                    id: annotation.id,
                    start: annotation.start,
                    end: annotation.end,
                    error,
                }),
                Err(error) => {
                    if collector.record_fatal(error) {
                        error!("Worker {} hit a store error on annotation {}; cancelling", worker_id, annotation.id);
                    }
                    cancel.cancel();
                    collector.add_unprocessed(batch_len - position - 1);
                    break;
                }
            }
        }

        batches_done += 1;
    }

    debug!("Worker {} exiting after {} batches", worker_id, batches_done);
}

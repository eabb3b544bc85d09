// src/pipeline/mod.rs
pub mod concurrent;
pub mod orchestrator;

use log::{debug, info};

use crate::config::SpanlinkConfig;
use crate::enricher::{Enricher, EnrichmentReport};
use crate::error::Result;
use crate::index::TokenIndex;
use crate::storage::TermStore;
use crate::types::Document;

pub use self::concurrent::{CancelToken, OutcomeCollector};
pub use self::orchestrator::{BatchOrchestrator, OrchestratorConfig};

/// Indexes a document's tokens and enriches its entity annotations in place.
///
/// A duplicate token start under the `reject` policy fails the whole
/// document before any annotation is touched.
pub fn enrich_document(
    document: &mut Document,
    store: &dyn TermStore,
    config: &SpanlinkConfig,
    cancel: &CancelToken,
) -> Result<EnrichmentReport> {
    let name = document.name.clone().unwrap_or_else(|| "<unnamed>".to_string());

    let index = TokenIndex::build_with_policy(
        document.tokens.iter().cloned(),
        config.index.duplicate_policy,
    )?;
    debug!("Document {}: indexed {} tokens ({} overwritten)", name, index.len(), index.overwritten());

    let enricher = Enricher::new(&index, store, config.resolver.clone(), config.enricher.clone());
    let orchestrator = BatchOrchestrator::new(config.orchestrator.clone())
        .with_cancel_token(cancel.clone());

    let report = orchestrator.run(&enricher, &mut document.entities)?;
    info!("Document {}: {} enriched, {} not found, {} skipped, {} malformed",
          name, report.enriched, report.not_found, report.skipped, report.failures.len());

    Ok(report)
}

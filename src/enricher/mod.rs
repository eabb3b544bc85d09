// src/enricher/mod.rs

use std::time::{Duration, Instant};
use log::{debug, info, trace};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::index::TokenIndex;
use crate::resolver::{SpanError, SpanResolver};
use crate::storage::TermStore;
use crate::types::{EntityAnnotation, FeatureMap, Offset, TermRecord};
pub use crate::config::subsystems::enricher::EnricherConfig;
use crate::config::subsystems::resolver::ResolverConfig;

pub const MAJOR_TYPE_KEY: &str = "majorType";
pub const MINOR_TYPE_KEY: &str = "minorType";
pub const LANGUAGE_KEY: &str = "language";

/// What happened to one annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnrichOutcome {
    /// Features replaced with the matched term record.
    Enriched,
    /// Eligible, but the store has no record for the label.
    NotFound,
    /// Provenance is not the configured one.
    Skipped,
}

/// An annotation whose span could not be resolved. It keeps its original features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationFailure {
    /// Position in the annotation slice handed to the pass
    pub index: usize,
    pub id: u32,
    pub start: Offset,
    pub end: Offset,
    #[serde(serialize_with = "serialize_display")]
    pub error: SpanError,
}

fn serialize_display<S: serde::Serializer>(error: &SpanError, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EnrichmentReport {
    pub total: usize,
    pub enriched: usize,
    pub not_found: usize,
    pub skipped: usize,
    /// Not reached because the pass was cancelled
    pub unprocessed: usize,
    pub failures: Vec<AnnotationFailure>,
    pub batches: usize,
    pub workers: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl EnrichmentReport {
    pub fn record(&mut self, outcome: EnrichOutcome) {
        match outcome {
            EnrichOutcome::Enriched => self.enriched += 1,
            EnrichOutcome::NotFound => self.not_found += 1,
            EnrichOutcome::Skipped => self.skipped += 1,
        }
    }

    /// Annotations that went through the enricher, failed or not.
    pub fn processed(&self) -> usize {
        self.enriched + self.not_found + self.failures.len()
    }

    pub fn merge(&mut self, other: &EnrichmentReport) {
        self.total += other.total;
        self.enriched += other.enriched;
        self.not_found += other.not_found;
        self.skipped += other.skipped;
        self.unprocessed += other.unprocessed;
        self.failures.extend(other.failures.iter().cloned());
        self.batches += other.batches;
        self.workers = self.workers.max(other.workers);
        self.elapsed += other.elapsed;
    }
}

/// Resolves an annotation's label and attaches the matching term record.
///
/// Holds only shared references, so a single enricher serves every worker
/// of a pass.
pub struct Enricher<'a> {
    resolver: SpanResolver<'a>,
    store: &'a dyn TermStore,
    config: EnricherConfig,
}

impl<'a> Enricher<'a> {
    pub fn new(
        index: &'a TokenIndex,
        store: &'a dyn TermStore,
        resolver_config: ResolverConfig,
        config: EnricherConfig,
    ) -> Self {
        Self {
            resolver: SpanResolver::new(index, resolver_config),
            store,
            config,
        }
    }

    pub fn with_defaults(index: &'a TokenIndex, store: &'a dyn TermStore) -> Self {
        Self::new(index, store, ResolverConfig::default(), EnricherConfig::default())
    }

    pub fn config(&self) -> &EnricherConfig {
        &self.config
    }

    pub fn is_eligible(&self, annotation: &EntityAnnotation) -> bool {
        annotation.provenance == self.config.provenance
    }

    /// Label the store is queried with: the resolved span text, lowercased.
    pub fn lookup_key(&self, annotation: &EntityAnnotation) -> std::result::Result<String, SpanError> {
        let label = self.resolver.resolve(annotation.start, annotation.end)?;
        Ok(label.to_lowercase())
    }

    /// Fixed features followed by the record's own; record attributes win on collision.
    pub fn build_features(&self, record: &TermRecord) -> FeatureMap {
        let mut features = FeatureMap::new();
        features.insert(MAJOR_TYPE_KEY.to_string(), self.config.major_type.clone());
        features.insert(MINOR_TYPE_KEY.to_string(), self.config.minor_type.clone());
        features.insert(LANGUAGE_KEY.to_string(), self.config.language.clone());
        features.extend(record.features.iter().map(|(k, v)| (k.clone(), v.clone())));
        features
    }

    /// Enriches one annotation in place.
    ///
    /// Features are only touched when a record is found. Span errors come
    /// back as `Error::Span`; store errors are returned as-is.
    pub fn enrich(&self, annotation: &mut EntityAnnotation) -> Result<EnrichOutcome> {
        if !self.is_eligible(annotation) {
            return Ok(EnrichOutcome::Skipped);
        }

        let key = self.lookup_key(annotation)?;
        match self.store.lookup(&key)? {
            Some(record) => {
                trace!("Annotation {} [{}, {}) {:?} matched term {:?}",
                       annotation.id, annotation.start, annotation.end, key, record.label);
                annotation.features = self.build_features(&record);
                Ok(EnrichOutcome::Enriched)
            },
            None => {
                trace!("Annotation {} [{}, {}) {:?} has no term record",
                       annotation.id, annotation.start, annotation.end, key);
                Ok(EnrichOutcome::NotFound)
            }
        }
    }

    /// Enriches every annotation on the calling thread.
    ///
    /// Span errors are collected into the report; the first store error
    /// aborts the pass.
    pub fn enrich_all(&self, annotations: &mut [EntityAnnotation]) -> Result<EnrichmentReport> {
        let start_time = Instant::now();
        let mut report = EnrichmentReport {
            total: annotations.len(),
            batches: 1,
            workers: 1,
            ..EnrichmentReport::default()
        };

        for (index, annotation) in annotations.iter_mut().enumerate() {
            match self.enrich(annotation) {
                Ok(outcome) => report.record(outcome),
                Err(Error::Span(error)) => {
                    debug!("Annotation {} [{}, {}) left unmodified: {}",
                           annotation.id, annotation.start, annotation.end, error);
                    report.failures.push(AnnotationFailure {
                        index,
                        id: annotation.id,
                        start: annotation.start,
                        end: annotation.end,
                        error,
                    });
                },
                Err(e) => return Err(e),
            }
        }

        report.elapsed = start_time.elapsed();
        info!("Sequential enrichment: {} enriched, {} not found, {} skipped, {} failed in {:?}",
              report.enriched, report.not_found, report.skipped, report.failures.len(), report.elapsed);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryTermStore;
    use crate::types::{Token, PROVENANCE_KEY};

    const NCBI: &str = "organism_from_ncbi";

    fn canine_store() -> MemoryTermStore {
        let mut features = FeatureMap::new();
        features.insert("taxonId".to_string(), "9615".to_string());
        MemoryTermStore::from_records(vec![TermRecord::new("canine", features)])
    }

    #[test]
    fn enriches_matching_annotation() {
        let index = TokenIndex::build(vec![Token::new(0, 6, "canine")]);
        let store = canine_store();
        let enricher = Enricher::with_defaults(&index, &store);

        let mut annotation = EntityAnnotation::new(1, 0, 6, NCBI);
        assert_eq!(enricher.enrich(&mut annotation).unwrap(), EnrichOutcome::Enriched);

        let expected: FeatureMap = [
            ("majorType", "organism"),
            ("minorType", "organism_from_ncbi"),
            ("language", "en"),
            ("taxonId", "9615"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(annotation.features, expected);
    }

    #[test]
    fn missing_record_leaves_features_untouched() {
        let index = TokenIndex::build(vec![Token::new(0, 6, "canine")]);
        let store = MemoryTermStore::new();
        let enricher = Enricher::with_defaults(&index, &store);

        let mut annotation = EntityAnnotation::new(1, 0, 6, NCBI);
        let before = annotation.features.clone();
        assert_eq!(enricher.enrich(&mut annotation).unwrap(), EnrichOutcome::NotFound);
        assert_eq!(annotation.features, before);
        assert_eq!(annotation.features.get(PROVENANCE_KEY).map(String::as_str), Some(NCBI));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let index = TokenIndex::build(vec![Token::new(0, 4, "Homo"), Token::new(5, 12, "Sapiens")]);
        let store = MemoryTermStore::from_records(vec![TermRecord::new("homo sapiens", FeatureMap::new())]);
        let enricher = Enricher::with_defaults(&index, &store);

        let mut upper = EntityAnnotation::new(1, 0, 12, NCBI);
        assert_eq!(enricher.lookup_key(&upper).unwrap(), "homo sapiens");
        assert_eq!(enricher.enrich(&mut upper).unwrap(), EnrichOutcome::Enriched);
    }

    #[test]
    fn other_provenance_is_skipped() {
        let index = TokenIndex::build(vec![Token::new(0, 6, "canine")]);
        let store = canine_store();
        let enricher = Enricher::with_defaults(&index, &store);

        let mut annotation = EntityAnnotation::new(1, 0, 6, "gazetteer_simple");
        let before = annotation.clone();
        assert_eq!(enricher.enrich(&mut annotation).unwrap(), EnrichOutcome::Skipped);
        assert_eq!(annotation, before);
    }

    #[test]
    fn record_features_override_fixed_fields() {
        let index = TokenIndex::default();
        let store = MemoryTermStore::new();
        let enricher = Enricher::with_defaults(&index, &store);

        let mut features = FeatureMap::new();
        features.insert("language".to_string(), "la".to_string());
        let built = enricher.build_features(&TermRecord::new("canis", features));
        assert_eq!(built.get(LANGUAGE_KEY).map(String::as_str), Some("la"));
        assert_eq!(built.get(MAJOR_TYPE_KEY).map(String::as_str), Some("organism"));
    }

    #[test]
    fn enrich_all_collects_span_failures() {
        let index = TokenIndex::build(vec![Token::new(0, 6, "canine"), Token::new(7, 11, "bite")]);
        let store = canine_store();
        let enricher = Enricher::with_defaults(&index, &store);

        let mut annotations = vec![
            EntityAnnotation::new(1, 0, 6, NCBI),
            EntityAnnotation::new(2, 7, 20, NCBI),
            EntityAnnotation::new(3, 7, 11, NCBI),
            EntityAnnotation::new(4, 0, 6, "other"),
        ];
        let untouched = annotations[1].clone();

        let report = enricher.enrich_all(&mut annotations).unwrap();
        assert_eq!(report.total, 4);
        assert_eq!(report.enriched, 1);
        assert_eq!(report.not_found, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 1);
        assert_eq!(report.failures[0].id, 2);
        assert_eq!(annotations[1], untouched);
        assert_eq!(report.processed(), 3);
    }

    #[test]
    fn store_errors_abort_sequential_pass() {
        let index = TokenIndex::build(vec![Token::new(0, 6, "canine")]);
        let mut store = canine_store();
        store.close().unwrap();
        let enricher = Enricher::with_defaults(&index, &store);

        let mut annotations = vec![EntityAnnotation::new(1, 0, 6, NCBI)];
        assert!(matches!(enricher.enrich_all(&mut annotations), Err(Error::Connection(_))));
    }
}

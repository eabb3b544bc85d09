//! spanlink attaches term-database records to entity annotations.
//! It rebuilds the text under each annotation from the document's tokens,
//! looks the lowercased label up in a term store and replaces the
//! annotation's features with the matching record, batching the lookups
//! across a pool of worker threads.

// Module declarations
pub mod error;
pub mod types;
pub mod config;
pub mod index;
pub mod resolver;
pub mod enricher;
pub mod pipeline;
pub mod storage;
pub mod utils;

// Re-exports
pub use error::{Error, Result};
pub use types::{Document, EntityAnnotation, FeatureMap, Offset, TermRecord, Token};
pub use index::{DuplicatePolicy, IndexError, TokenIndex};
pub use resolver::{resolve_label, SpanError, SpanResolver};
pub use enricher::{AnnotationFailure, EnrichOutcome, Enricher, EnrichmentReport};
pub use pipeline::{enrich_document, BatchOrchestrator, CancelToken};
pub use storage::{MemoryTermStore, TermStore, lmdb::LmdbTermStore};

// Re-export the config from config module
pub use config::SpanlinkConfig;

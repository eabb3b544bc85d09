pub mod index;
pub mod resolver;
pub mod enricher;
pub mod orchestrator;
pub mod store;
pub mod logging;

pub use index::IndexConfig;
pub use resolver::ResolverConfig;
pub use enricher::EnricherConfig;
pub use orchestrator::OrchestratorConfig;
pub use store::StoreConfig;
pub use logging::LoggingConfig;

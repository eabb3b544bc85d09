use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, error};
use spanlink::{
    enrich_document,
    CancelToken,
    EnrichmentReport,
    Error,
    LmdbTermStore,
    Result,
    SpanlinkConfig,
    TermStore,
    utils::{
        io::{list_documents, read_document, write_document},
        logger::init_logging,
        report::{summarize_by_kind, AnnotationCsvWriter, KindSummary},
    },
};

type ReportWriter = AnnotationCsvWriter<BufWriter<File>>;

/// Enrich entity annotations with records from the term database
#[derive(Parser, Debug)]
#[command(name = "enrich_spans")]
#[command(about = "Resolve entity labels and attach matching term records")]
struct Args {
    /// Document JSON file or a directory of them (defaults to [files] input_path)
    input: Option<PathBuf>,

    /// Directory for enriched documents, overrides [files] output_dir
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// INI configuration file (defaults to ./default.ini when present)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Write a CSV row per annotation to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Annotations per batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Worker threads per document (0 = automatic)
    #[arg(long)]
    workers: Option<usize>,

    /// Term database directory, overrides [store] db_path
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Abort a document's enrichment after this many seconds (0 = no limit)
    #[arg(long)]
    timeout: Option<u64>,
}

fn apply_overrides(config: &mut SpanlinkConfig, args: Args) {
    if let Some(input) = args.input {
        config.files.input_path = input;
    }
    if let Some(output) = args.output {
        config.files.output_dir = output;
    }
    if let Some(report) = args.report {
        config.files.report_path = Some(report);
    }
    if let Some(batch_size) = args.batch_size {
        config.orchestrator.batch_size = batch_size;
    }
    if let Some(workers) = args.workers {
        config.orchestrator.workers = workers;
    }
    if let Some(db_path) = args.db_path {
        config.store.db_path = db_path;
    }
    if let Some(timeout) = args.timeout {
        config.orchestrator.timeout_secs = if timeout == 0 { None } else { Some(timeout) };
    }
    config.store.read_only = true;
}

/// Errors that only cost the current document
fn is_document_error(error: &Error) -> bool {
    matches!(error, Error::Json(_) | Error::Index(_) | Error::Timeout(_))
}

fn process_document(
    path: &Path,
    store: &dyn TermStore,
    config: &SpanlinkConfig,
    cancel: &CancelToken,
    report: Option<&mut ReportWriter>,
    kinds: &mut BTreeMap<String, KindSummary>,
) -> Result<EnrichmentReport> {
    let mut document = read_document(path)?;
    let result = enrich_document(&mut document, store, config, cancel)?;

    let file_name = path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("document.json"));
    write_document(config.files.output_dir.join(file_name), &document)?;

    if let Some(writer) = report {
        let name = document.name.as_deref().unwrap_or_default();
        writer.write_annotations(name, &document.entities)?;
    }

    for (kind, summary) in summarize_by_kind(&document.entities) {
        let total = kinds.entry(kind).or_default();
        total.annotations += summary.annotations;
        total.enriched += summary.enriched;
    }

    Ok(result)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = SpanlinkConfig::load(args.config.as_deref())?;
    apply_overrides(&mut config, args);
    config.validate()?;

    init_logging(&config.logging, "enrich_spans")?;
    config.files.ensure_directories()?;

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            warn!("Interrupt received; cancelling enrichment");
            cancel.cancel();
        })
        .map_err(|e| Error::worker(format!("Failed to install Ctrl-C handler: {}", e)))?;
    }

    let input = config.files.input_path.clone();
    let documents = if input.is_dir() {
        list_documents(&input)?
    } else {
        vec![input.clone()]
    };
    if documents.is_empty() {
        warn!("No *.json documents found in {:?}", input);
        return Ok(());
    }
    info!("Enriching {} documents from {:?} into {:?}", documents.len(), input, config.files.output_dir);

    let mut store = LmdbTermStore::open(config.store.clone())?;
    info!("Term store {:?} holds {} terms", store.path(), store.len()?);

    let mut report_writer = match &config.files.report_path {
        Some(path) => Some(AnnotationCsvWriter::new(BufWriter::new(File::create(path)?))?),
        None => None,
    };

    let progress = ProgressBar::new(documents.len() as u64);
    progress.set_style(ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} documents ({eta}) {msg}")
        .map_err(|e| Error::config(format!("Invalid progress template: {}", e)))?);

    let start_time = Instant::now();
    let mut totals = EnrichmentReport::default();
    let mut kinds: BTreeMap<String, KindSummary> = BTreeMap::new();
    let mut enriched_documents = 0usize;
    let mut failed_documents = 0usize;
    let mut outcome: Result<()> = Ok(());

    for path in &documents {
        if cancel.is_cancelled() {
            outcome = Err(Error::Cancelled("interrupted before all documents were processed".to_string()));
            break;
        }
        progress.set_message(path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default());

        match process_document(path, &store, &config, &cancel, report_writer.as_mut(), &mut kinds) {
            Ok(report) => {
                totals.merge(&report);
                enriched_documents += 1;
            },
            Err(e) if is_document_error(&e) => {
                error!("Skipping {:?}: {}", path, e);
                failed_documents += 1;
            },
            Err(e) => {
                error!("Stopping at {:?}: {}", path, e);
                outcome = Err(e);
                break;
            }
        }
        progress.inc(1);
    }
    progress.finish_with_message("done");

    if let Some(writer) = report_writer {
        let rows = writer.rows();
        writer.finish()?;
        info!("Wrote {} annotation rows to {:?}", rows, config.files.report_path);
    }

    let stats = store.get_stats()?;
    store.close()?;

    info!("Enrichment finished in {:?}: {} enriched, {} not found, {} skipped, {} malformed, {} unprocessed, {} documents failed",
          start_time.elapsed(), totals.enriched, totals.not_found, totals.skipped,
          totals.failures.len(), totals.unprocessed, failed_documents);
    info!("Store lookups: {} ({:.1}% found, {} served from cache)",
          stats.metrics.lookups, stats.metrics.hit_rate() * 100.0, stats.metrics.cache_hits);
    for (kind, summary) in &kinds {
        info!("  {}: {} annotations, {} enriched", kind, summary.annotations, summary.enriched);
    }

    println!("{} enriched, {} not found, {} skipped, {} malformed across {} documents",
             totals.enriched, totals.not_found, totals.skipped, totals.failures.len(),
             enriched_documents);

    outcome
}

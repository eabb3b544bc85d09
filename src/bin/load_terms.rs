use std::path::PathBuf;
use std::time::Instant;
use clap::Parser;
use log::info;
use spanlink::{
    LmdbTermStore,
    Result,
    SpanlinkConfig,
    TermStore,
    utils::{io::read_term_dump, logger::init_logging},
};

/// Build the LMDB term database from a JSONL dump
#[derive(Parser, Debug)]
#[command(name = "load_terms")]
#[command(about = "Load {\"label\", \"features\"} records into the term database")]
struct Args {
    /// JSONL dump, one term record per line
    dump: PathBuf,

    /// INI configuration file (defaults to ./default.ini when present)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Term database directory, overrides [store] db_path
    #[arg(long)]
    db_path: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = SpanlinkConfig::load(args.config.as_deref())?;
    if let Some(db_path) = args.db_path {
        config.store.db_path = db_path;
    }
    config.store.read_only = false;
    config.validate()?;

    init_logging(&config.logging, "load_terms")?;
    info!("Loading terms from {:?}", args.dump);
    info!("{}", config.store.describe());

    let start_time = Instant::now();
    let records = read_term_dump(&args.dump)?;
    let parsed = records.len();

    let mut store = LmdbTermStore::open(config.store.clone())?;
    let written = store.load_records(records)?;
    let stats = store.get_stats()?;
    store.close()?;

    info!("Wrote {} of {} parsed records; store now holds {} distinct terms ({:?})",
          written, parsed, stats.total_terms, start_time.elapsed());
    println!("Loaded {} term records ({} distinct terms) into {:?}",
             written, stats.total_terms, config.store.db_path);

    Ok(())
}

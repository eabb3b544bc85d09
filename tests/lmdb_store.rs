use std::path::Path;
use spanlink::config::subsystems::StoreConfig;
use spanlink::{Error, FeatureMap, LmdbTermStore, TermRecord, TermStore};
use tempfile::tempdir;

fn store_config(path: &Path) -> StoreConfig {
    StoreConfig {
        db_path: path.to_path_buf(),
        lmdb_map_size_mb: Some(16),
        load_batch_size: 2,
        ..StoreConfig::default()
    }
}

fn record(label: &str, taxon: &str) -> TermRecord {
    let mut features = FeatureMap::new();
    features.insert("taxonId".to_string(), taxon.to_string());
    TermRecord::new(label, features)
}

fn seeded_store(path: &Path) -> LmdbTermStore {
    let mut store = LmdbTermStore::open(store_config(path)).unwrap();
    store
        .load_records(vec![
            record("Canine", "9615"),
            record("Homo sapiens", "9606"),
            record("Mus musculus", "10090"),
        ])
        .unwrap();
    store
}

#[test]
fn stores_records_under_lowercased_labels() {
    let dir = tempdir().unwrap();
    let store = seeded_store(&dir.path().join("terms"));

    assert_eq!(store.len().unwrap(), 3);

    let canine = store.lookup("canine").unwrap().unwrap();
    assert_eq!(canine.label, "Canine");
    assert_eq!(canine.features.get("taxonId").map(String::as_str), Some("9615"));

    assert!(store.lookup("homo sapiens").unwrap().is_some());
    // Callers normalise; the raw label is not a key
    assert!(store.lookup("Canine").unwrap().is_none());
    assert!(store.lookup("felis catus").unwrap().is_none());
}

#[test]
fn later_records_replace_earlier_ones() {
    let dir = tempdir().unwrap();
    let mut store = LmdbTermStore::open(store_config(&dir.path().join("terms"))).unwrap();

    store.load_records(vec![record("canine", "1")]).unwrap();
    assert_eq!(store.lookup("canine").unwrap().unwrap().features["taxonId"], "1");

    // The cached hit must not survive a reload
    store.load_records(vec![record("CANINE", "9615")]).unwrap();
    assert_eq!(store.len().unwrap(), 1);
    assert_eq!(store.lookup("canine").unwrap().unwrap().features["taxonId"], "9615");
}

#[test]
fn reopens_read_only_after_close() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("terms");

    let mut writer = seeded_store(&path);
    writer.close().unwrap();
    drop(writer);

    let mut reader = LmdbTermStore::open(store_config(&path).read_only()).unwrap();
    assert_eq!(reader.len().unwrap(), 3);
    assert!(reader.lookup("mus musculus").unwrap().is_some());
    assert!(matches!(reader.load_records(vec![record("felis", "9685")]), Err(Error::Storage(_))));
}

#[test]
fn read_only_open_of_missing_database_is_a_connection_error() {
    let dir = tempdir().unwrap();
    let result = LmdbTermStore::open(store_config(&dir.path().join("absent")).read_only());
    assert!(matches!(result, Err(Error::Connection(_))));
}

#[test]
fn closed_store_rejects_lookups() {
    let dir = tempdir().unwrap();
    let mut store = seeded_store(&dir.path().join("terms"));

    store.close().unwrap();
    assert!(!store.is_open());
    assert!(matches!(store.lookup("canine"), Err(Error::Connection(_))));
    // Idempotent
    store.close().unwrap();
}

#[test]
fn repeated_lookups_hit_the_cache() {
    let dir = tempdir().unwrap();
    let store = seeded_store(&dir.path().join("terms"));

    store.lookup("canine").unwrap();
    store.lookup("canine").unwrap();
    store.lookup("felis catus").unwrap();
    store.lookup("felis catus").unwrap();

    let stats = store.get_stats().unwrap();
    assert_eq!(stats.total_terms, 3);
    assert_eq!(stats.metrics.lookups, 4);
    assert_eq!(stats.metrics.hits, 2);
    assert_eq!(stats.metrics.misses, 2);
    assert_eq!(stats.metrics.cache_hits, 2);
}

#[test]
fn lookups_from_many_threads() {
    let dir = tempdir().unwrap();
    let store = seeded_store(&dir.path().join("terms"));
    let labels = ["canine", "homo sapiens", "mus musculus", "felis catus"];

    std::thread::scope(|scope| {
        for worker in 0..8 {
            let store = &store;
            scope.spawn(move || {
                for round in 0..50 {
                    let label = labels[(worker + round) % labels.len()];
                    let found = store.lookup(label).unwrap();
                    assert_eq!(found.is_some(), label != "felis catus");
                }
            });
        }
    });

    assert_eq!(store.get_stats().unwrap().metrics.lookups, 400);
}

// utils/io.rs
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use log::{debug, info};
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::types::{Document, TermRecord};

pub fn read_document<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut document: Document = serde_json::from_reader(reader)?;

    if document.name.is_none() {
        document.name = path.file_stem().map(|stem| stem.to_string_lossy().into_owned());
    }
    debug!("Read {:?}: {} tokens, {} entities", path, document.tokens.len(), document.entities.len());
    Ok(document)
}

pub fn write_document<P: AsRef<Path>>(path: P, document: &Document) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer_pretty(&mut writer, document)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// `*.json` files directly under `dir`, sorted by name.
pub fn list_documents<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut files = fs::read_dir(dir.as_ref())?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect::<Vec<_>>();
    files.sort();
    Ok(files)
}

/// Parses a JSONL term dump, one `{"label", "features"}` object per line.
///
/// Blank lines are ignored. Lines are parsed in parallel and any bad line
/// fails the whole dump, reported with its line number.
pub fn parse_term_dump(content: &str) -> Result<Vec<TermRecord>> {
    let lines: Vec<(usize, &str)> = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .collect();

    lines
        .par_iter()
        .map(|(line_num, line)| {
            serde_json::from_str::<TermRecord>(line).map_err(|e| {
                Error::Serialization(format!("term dump line {}: {}", line_num + 1, e))
            })
        })
        .collect()
}

pub fn read_term_dump<P: AsRef<Path>>(path: P) -> Result<Vec<TermRecord>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let records = parse_term_dump(&content)?;
    info!("Parsed {} term records from {:?}", records.len(), path);
    Ok(records)
}

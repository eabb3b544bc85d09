// utils/report.rs
use std::collections::BTreeMap;
use std::io::Write;
use serde::Serialize;

use crate::enricher::MAJOR_TYPE_KEY;
use crate::error::{Error, Result};
use crate::types::{EntityAnnotation, FeatureMap};

const HEADER: [&str; 6] = ["document", "kind", "start", "end", "id", "features"];

/// One CSV row per annotation, appended document by document.
pub struct AnnotationCsvWriter<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl<W: Write> AnnotationCsvWriter<W> {
    pub fn new(inner: W) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        writer.write_record(&HEADER)?;
        Ok(Self { writer, rows: 0 })
    }

    pub fn write_annotations(&mut self, document: &str, annotations: &[EntityAnnotation]) -> Result<()> {
        for annotation in annotations {
            self.writer.write_record(&[
                document.to_string(),
                annotation.kind.clone(),
                annotation.start.to_string(),
                annotation.end.to_string(),
                annotation.id.to_string(),
                format_features(&annotation.features),
            ])?;
            self.rows += 1;
        }
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        self.writer.into_inner().map_err(|e| {
            Error::Io(std::io::Error::new(e.error().kind(), e.error().to_string()))
        })
    }
}

/// Writes a complete report for a single document.
pub fn write_annotation_csv<W: Write>(writer: W, document: &str, annotations: &[EntityAnnotation]) -> Result<()> {
    let mut report = AnnotationCsvWriter::new(writer)?;
    report.write_annotations(document, annotations)?;
    report.finish()?;
    Ok(())
}

/// `key=value` pairs in key order, separated by `;`.
pub fn format_features(features: &FeatureMap) -> String {
    features
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(";")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindSummary {
    pub annotations: usize,
    /// Annotations carrying term features
    pub enriched: usize,
}

/// Annotation counts per kind.
pub fn summarize_by_kind<'a, I>(annotations: I) -> BTreeMap<String, KindSummary>
where
    I: IntoIterator<Item = &'a EntityAnnotation>,
{
    let mut summary: BTreeMap<String, KindSummary> = BTreeMap::new();
    for annotation in annotations {
        let entry = summary.entry(annotation.kind.clone()).or_default();
        entry.annotations += 1;
        if annotation.features.contains_key(MAJOR_TYPE_KEY) {
            entry.enriched += 1;
        }
    }
    summary
}

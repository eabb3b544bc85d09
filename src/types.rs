use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

/// Character offset into the document text.
pub type Offset = u64;

/// Attribute name -> value mapping carried by annotations and term records.
pub type FeatureMap = BTreeMap<String, String>;

/// Feature key holding the recognizer tag on freshly produced annotations.
pub const PROVENANCE_KEY: &str = "provenance";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub start: Offset,
    pub end: Offset,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Token {
    pub fn new<S: Into<String>>(start: Offset, end: Offset, text: S) -> Self {
        Self { start, end, text: Some(text.into()) }
    }

    /// A token whose string feature was never set upstream.
    pub fn without_text(start: Offset, end: Offset) -> Self {
        Self { start, end, text: None }
    }
}

fn default_kind() -> String {
    "Lookup".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityAnnotation {
    pub id: u32,
    pub start: Offset,
    pub end: Offset,
    pub provenance: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub features: FeatureMap,
}

impl EntityAnnotation {
    /// Creates an annotation whose feature map holds only its provenance tag.
    pub fn new<S: Into<String>>(id: u32, start: Offset, end: Offset, provenance: S) -> Self {
        let provenance = provenance.into();
        let mut features = FeatureMap::new();
        features.insert(PROVENANCE_KEY.to_string(), provenance.clone());

        Self {
            id,
            start,
            end,
            provenance,
            kind: default_kind(),
            features,
        }
    }

    pub fn with_kind<S: Into<String>>(mut self, kind: S) -> Self {
        self.kind = kind.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRecord {
    pub label: String,
    #[serde(default)]
    pub features: FeatureMap,
}

impl TermRecord {
    pub fn new<S: Into<String>>(label: S, features: FeatureMap) -> Self {
        Self { label: label.into(), features }
    }

    /// Key the record is stored under: the lowercased label.
    pub fn key(&self) -> String {
        self.label.to_lowercase()
    }
}

/// One document as exchanged with the upstream pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub tokens: Vec<Token>,
    #[serde(default)]
    pub entities: Vec<EntityAnnotation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_annotation_carries_provenance_feature() {
        let annotation = EntityAnnotation::new(7, 0, 6, "organism_from_ncbi");
        assert_eq!(annotation.kind, "Lookup");
        assert_eq!(annotation.features.len(), 1);
        assert_eq!(annotation.features.get(PROVENANCE_KEY).map(String::as_str), Some("organism_from_ncbi"));
    }

    #[test]
    fn term_record_key_is_lowercased() {
        let record = TermRecord::new("Homo Sapiens", FeatureMap::new());
        assert_eq!(record.key(), "homo sapiens");
    }

    #[test]
    fn document_json_allows_missing_token_text() {
        let json = r#"{
            "tokens": [{"start": 0, "end": 6, "text": "canine"}, {"start": 6, "end": 7}],
            "entities": [{"id": 1, "start": 0, "end": 6, "provenance": "organism_from_ncbi"}]
        }"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.tokens[1].text, None);
        assert_eq!(doc.entities[0].kind, "Lookup");
        assert!(doc.entities[0].features.is_empty());
    }
}

//! Versioned JSON interchange form.
//!
//! A persisted document is wrapped in an envelope carrying the schema
//! version:
//!
//! ```json
//! { "schema_version": 1, "document": { "metadata": {..}, "fonts": [..], "pages": [..] } }
//! ```
//!
//! The version is checked before anything else is decoded. Unknown fields,
//! at the envelope and at every entity, are kept and written back out.
//!
//! Collaborators return translations as run update batches in their own
//! envelope (`{ "schema_version": 1, "updates": [..] }`).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{Document, RunId, TranslationState};

/// Version of the persisted schema written by this crate.
pub const SCHEMA_VERSION: u32 = 1;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Persisted document with its schema version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub schema_version: u32,

    pub document: Document,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl Envelope {
    pub fn new(document: Document) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            document,
            extra: BTreeMap::new(),
        }
    }
}

/// New translation state for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunUpdate {
    pub page: u32,
    pub run: RunId,
    pub translation: TranslationState,
}

impl RunUpdate {
    pub fn translated(page: u32, run: RunId, text: impl Into<String>) -> Self {
        Self {
            page,
            run,
            translation: TranslationState::Translated { text: text.into() },
        }
    }
}

#[derive(Serialize, Deserialize)]
struct UpdateBatch {
    schema_version: u32,
    updates: Vec<RunUpdate>,
}

/// Outcome of applying run updates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    pub applied: usize,
    /// Updates naming a page or run the document does not have
    pub unknown: Vec<RunUpdate>,
}

fn to_string<T: Serialize>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

/// Parse JSON and check its schema version.
fn parse_versioned(json: &str) -> Result<Value> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| Error::SchemaValidation(format!("Malformed JSON: {}", e)))?;

    let version = value
        .get("schema_version")
        .ok_or_else(|| Error::SchemaValidation("Missing schema_version".to_string()))?;
    let found = version
        .as_u64()
        .ok_or_else(|| Error::SchemaValidation(format!("Invalid schema_version: {}", version)))?;
    if found != u64::from(SCHEMA_VERSION) {
        return Err(Error::SchemaIncompatibility {
            found,
            supported: SCHEMA_VERSION,
        });
    }
    Ok(value)
}

/// Encode an envelope.
pub fn encode_envelope(envelope: &Envelope, format: JsonFormat) -> Result<String> {
    to_string(envelope, format)
}

/// Decode an envelope, keeping unknown fields.
pub fn decode_envelope(json: &str) -> Result<Envelope> {
    let value = parse_versioned(json)?;
    serde_json::from_value(value).map_err(|e| Error::SchemaValidation(e.to_string()))
}

/// Encode a document at the current schema version.
///
/// Envelope fields kept from [`decode`] are written back out.
pub fn encode(doc: &Document, format: JsonFormat) -> Result<String> {
    #[derive(Serialize)]
    struct EnvelopeRef<'a> {
        schema_version: u32,
        document: &'a Document,
        #[serde(flatten)]
        extra: &'a BTreeMap<String, Value>,
    }

    to_string(
        &EnvelopeRef {
            schema_version: SCHEMA_VERSION,
            document: doc,
            extra: &doc.envelope_extra,
        },
        format,
    )
}

/// Decode a document.
///
/// Unknown envelope fields move to [`Document::envelope_extra`]. Fails
/// with [`Error::SchemaIncompatibility`] for another schema version and
/// [`Error::SchemaValidation`] for malformed input or missing fields.
pub fn decode(json: &str) -> Result<Document> {
    let Envelope {
        mut document, extra, ..
    } = decode_envelope(json)?;
    document.envelope_extra = extra;
    Ok(document)
}

/// Write a document to a file.
pub fn save(doc: &Document, path: impl AsRef<Path>, format: JsonFormat) -> Result<()> {
    fs::write(path, encode(doc, format)?)?;
    Ok(())
}

/// Read a document from a file.
pub fn load(path: impl AsRef<Path>) -> Result<Document> {
    decode(&fs::read_to_string(path)?)
}

/// Encode a batch of run updates.
pub fn encode_updates(updates: &[RunUpdate], format: JsonFormat) -> Result<String> {
    to_string(
        &UpdateBatch {
            schema_version: SCHEMA_VERSION,
            updates: updates.to_vec(),
        },
        format,
    )
}

/// Decode a batch of run updates.
pub fn decode_updates(json: &str) -> Result<Vec<RunUpdate>> {
    let value = parse_versioned(json)?;
    let batch: UpdateBatch = serde_json::from_value(value).map_err(|e| Error::SchemaValidation(e.to_string()))?;
    Ok(batch.updates)
}

/// Apply run updates to a document.
pub fn apply_updates(doc: &mut Document, updates: impl IntoIterator<Item = RunUpdate>) -> ApplyReport {
    let mut report = ApplyReport::default();

    for update in updates {
        match doc.page_mut(update.page).and_then(|p| p.run_mut(update.run)) {
            Some(run) => {
                run.translation = update.translation;
                report.applied += 1;
            }
            None => {
                warn!("Update targets unknown run {:?} on page {}", update.run, update.page);
                report.unknown.push(update);
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, Block, BlockId, FontDescriptor, FontId, Line, Page, Region, RegionContent, RegionId, RegionKind, Run, SemanticTag};

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.metadata.title = Some("Manual".to_string());
        let font = doc.fonts.intern(&FontDescriptor::new("Helvetica", 10.0));

        let bbox = BBox::new(50.0, 100.0, 120.0, 112.0);
        let line = Line::new(110.0, bbox, vec![Run::new(RunId(0), "Hello", font, bbox)]);
        let block = Block::new(BlockId(0), bbox, font, SemanticTag::Body, vec![line]);
        let mut page = Page::letter(0);
        page.regions.push(Region::new(
            RegionId(0),
            RegionKind::SingleColumn,
            bbox,
            RegionContent::Blocks { blocks: vec![block] },
        ));
        doc.add_page(page);
        doc
    }

    #[test]
    fn test_round_trip() {
        let doc = sample();
        for format in [JsonFormat::Pretty, JsonFormat::Compact] {
            let json = encode(&doc, format).unwrap();
            assert_eq!(decode(&json).unwrap(), doc);
        }
    }

    #[test]
    fn test_compact_has_no_newlines() {
        let json = encode(&sample(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.starts_with(r#"{"schema_version":1,"#));
    }

    #[test]
    fn test_unsupported_version() {
        let json = r#"{"schema_version": 2, "document": "not even a document"}"#;
        match decode(json) {
            Err(Error::SchemaIncompatibility { found, supported }) => {
                assert_eq!(found, 2);
                assert_eq!(supported, SCHEMA_VERSION);
            }
            other => panic!("expected incompatibility, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_version_and_fields() {
        assert!(matches!(decode(r#"{"document": {}}"#), Err(Error::SchemaValidation(_))));
        assert!(matches!(decode("not json"), Err(Error::SchemaValidation(_))));
        assert!(matches!(
            decode(r#"{"schema_version": 1, "document": {"metadata": {}}}"#),
            Err(Error::SchemaValidation(_))
        ));
    }

    #[test]
    fn test_unknown_fields_survive() {
        let mut value: Value = serde_json::from_str(&encode(&sample(), JsonFormat::Compact).unwrap()).unwrap();
        value["producer"] = Value::from("scanner 2.0");
        value["document"]["review"] = serde_json::json!({"approved": true});
        value["document"]["pages"][0]["dpi"] = Value::from(300);

        let envelope = decode_envelope(&value.to_string()).unwrap();
        assert_eq!(envelope.extra["producer"], "scanner 2.0");

        let again: Value = serde_json::from_str(&encode_envelope(&envelope, JsonFormat::Compact).unwrap()).unwrap();
        assert_eq!(again["producer"], "scanner 2.0");
        assert_eq!(again["document"]["review"]["approved"], true);
        assert_eq!(again["document"]["pages"][0]["dpi"], 300);
    }

    #[test]
    fn test_updates_apply() {
        let mut doc = sample();
        let updates = vec![
            RunUpdate::translated(0, RunId(0), "Hola"),
            RunUpdate::translated(0, RunId(9), "Nada"),
            RunUpdate::translated(4, RunId(0), "Nada"),
        ];
        let json = encode_updates(&updates, JsonFormat::Compact).unwrap();
        let decoded = decode_updates(&json).unwrap();
        assert_eq!(decoded, updates);

        let report = apply_updates(&mut doc, decoded);
        assert_eq!(report.applied, 1);
        assert_eq!(report.unknown.len(), 2);
        assert_eq!(doc.pages[0].runs().next().unwrap().display_text(), "Hola");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let doc = sample();
        save(&doc, &path, JsonFormat::Pretty).unwrap();
        assert_eq!(load(&path).unwrap(), doc);
    }

    #[test]
    fn test_envelope_fields_survive_load_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let mut value: Value = serde_json::from_str(&encode(&sample(), JsonFormat::Compact).unwrap()).unwrap();
        value["producer"] = Value::from("scanner 2.0");
        fs::write(&path, value.to_string()).unwrap();

        let mut doc = load(&path).unwrap();
        assert_eq!(doc.envelope_extra["producer"], "scanner 2.0");
        apply_updates(&mut doc, vec![RunUpdate::translated(0, RunId(0), "Hola")]);
        save(&doc, &path, JsonFormat::Pretty).unwrap();

        let again: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(again["producer"], "scanner 2.0");
        assert_eq!(again["schema_version"], 1);
        assert!(again["document"].get("envelope_extra").is_none());
        assert_eq!(load(&path).unwrap().pages[0].runs().next().unwrap().display_text(), "Hola");
    }
}

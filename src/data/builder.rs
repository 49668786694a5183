// ============================================================
// Layer 4: Document Builder
// ============================================================
// Maps a parsed Document onto the field schema the index
// engine consumes:
//
//   id            keyword  exact match, stored
//   path          keyword  mirrors id
//   title         text     analyzed, stored
//   author        text     analyzed, stored
//   bibliography  text     analyzed, stored
//   content       text     analyzed, stored, positions (configurable)
//
// Pure transform: no analysis happens here. The analyzer runs
// inside the index engine when the document is added. layout()
// is the same list without values; the index schema is built
// from it.

use serde::{Deserialize, Serialize};

use crate::domain::document::Document;
use crate::domain::fields::{self, FieldSpec, IndexField, IndexableDocument};

/// Per-field ingest options forwarded to the index engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldOptions {
    /// Record term positions for the content field
    pub content_positions: bool,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self { content_positions: true }
    }
}

pub struct DocumentBuilder {
    options: FieldOptions,
}

impl DocumentBuilder {
    pub fn new(options: FieldOptions) -> Self {
        Self { options }
    }

    pub fn layout(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::keyword(fields::ID),
            FieldSpec::keyword(fields::PATH),
            FieldSpec::text(fields::TITLE, false),
            FieldSpec::text(fields::AUTHOR, false),
            FieldSpec::text(fields::BIBLIOGRAPHY, false),
            FieldSpec::text(fields::CONTENT, self.options.content_positions),
        ]
    }

    pub fn build(&self, doc: &Document) -> IndexableDocument {
        let values = [&doc.id, &doc.id, &doc.title, &doc.author, &doc.bibliography, &doc.content];
        IndexableDocument {
            fields: self
                .layout()
                .into_iter()
                .zip(values)
                .map(|(spec, value)| IndexField::new(spec, value.as_str()))
                .collect(),
        }
    }
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new(FieldOptions::default())
    }
}

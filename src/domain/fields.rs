// ============================================================
// Layer 3: Index Field Schema
// ============================================================
// The shape a Document takes on its way into the index.
//
// The index engine does not know about titles or authors; it
// only sees named fields of two kinds:
//   - Keyword: stored verbatim, matched exactly (ids, paths)
//   - Text:    stored, run through the analyzer, optionally
//              with term positions recorded for proximity use
//
// Reference: Rust Book §6 (Enums and Pattern Matching)

use serde::{Deserialize, Serialize};

pub const ID:           &str = "id";
pub const PATH:         &str = "path";
pub const TITLE:        &str = "title";
pub const AUTHOR:       &str = "author";
pub const BIBLIOGRAPHY: &str = "bibliography";
pub const CONTENT:      &str = "content";

/// How a field is treated at ingest time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Not tokenized. The whole value is one exact-match term.
    Keyword,
    /// Tokenized by the analyzer. `positions` asks the engine to keep
    /// per-term positions (term vectors) for this field.
    Text { positions: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexField {
    pub name:  String,
    pub value: String,
    pub kind:  FieldKind,
}

impl IndexField {
    pub fn new(spec: FieldSpec, value: impl Into<String>) -> Self {
        Self { name: spec.name.to_string(), value: value.into(), kind: spec.kind }
    }
}

/// One entry of the index layout: a field name and how it is ingested.
/// The index schema is derived from a list of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn keyword(name: &'static str) -> Self {
        Self { name, kind: FieldKind::Keyword }
    }

    pub const fn text(name: &'static str, positions: bool) -> Self {
        Self { name, kind: FieldKind::Text { positions } }
    }
}

/// A document as the index engine consumes it: an ordered field list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexableDocument {
    pub fields: Vec<IndexField>,
}

impl IndexableDocument {
    /// First field with the given name.
    pub fn field(&self, name: &str) -> Option<&IndexField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Value of the `id` keyword field, if present.
    pub fn id(&self) -> Option<&str> {
        self.field(ID).map(|f| f.value.as_str())
    }
}

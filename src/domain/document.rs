// ============================================================
// Layer 3: Document Domain Type
// ============================================================
// One record of the abstract collection, as parsed from a
// `.I` block. Plain data with no behaviour beyond
// construction.
//
// Each text field holds the lines that followed its tag,
// joined in source order, every line followed by a single
// space. That is why a one-line title "Foo" is stored as "Foo ".
//
// Reference: Rust Book §5 (Structs and Methods)

use serde::{Deserialize, Serialize};

/// A parsed abstract record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Identifier from the record-start line, e.g. "184"
    pub id: String,

    pub title: String,

    pub author: String,

    pub bibliography: String,

    /// The abstract body (`.W` section)
    pub content: String,
}

impl Document {
    /// Create an empty Document carrying only its identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// All five fields at once, for fixtures.
    #[cfg(test)]
    pub fn with_fields(
        id:           impl Into<String>,
        title:        impl Into<String>,
        author:       impl Into<String>,
        bibliography: impl Into<String>,
        content:      impl Into<String>,
    ) -> Self {
        Self {
            id:           id.into(),
            title:        title.into(),
            author:       author.into(),
            bibliography: bibliography.into(),
            content:      content.into(),
        }
    }
}

// ============================================================
// Layer 3: Query and SearchHit Domain Types
// ============================================================
// A Query is one `.I` block of the query collection. Its text
// is every line of the block except the `.W` marker itself, so
// unlike Document there is no separate body field.
//
// A SearchHit is one ranked result coming back from a
// ranking strategy.

use serde::{Deserialize, Serialize};

/// A parsed query record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// First token after `.I`, kept verbatim ("001", not 1)
    pub id: String,

    /// Accumulated raw query text, one trailing space per line
    pub text: String,
}

impl Query {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id:   id.into(),
            text: text.into(),
        }
    }

    /// True when the query has nothing worth sending to a ranker.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// One ranked document returned by a strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub doc_id: String,
    pub score:  f64,
}

impl SearchHit {
    pub fn new(doc_id: impl Into<String>, score: f64) -> Self {
        Self { doc_id: doc_id.into(), score }
    }
}

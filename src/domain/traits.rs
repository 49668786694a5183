// ============================================================
// Layer 3: Core Traits (Abstractions)
// ============================================================
// The seams between the pipeline core and its collaborators.
//
// The orchestration code in Layer 2 only ever talks to these
// traits, never to a concrete index or scorer:
//   - IndexWriter (infra)        implements IndexSink
//   - VectorSpaceStrategy,
//     Bm25Strategy (ranking)     implement RankingStrategy
//   - FeedbackExpander,
//     PassThroughExpander        implement QueryExpander
//   - RunWriter (infra)          implements RunSink
//
// Tests swap in small in-memory fakes for each of them.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)
//            Rust Book §17 (Object Oriented Patterns)

use crate::domain::error::Result;
use crate::domain::fields::IndexableDocument;
use crate::domain::query::SearchHit;

// ─── IndexSink ────────────────────────────────────────────────────────────────
/// Anything that accepts normalized documents for indexing.
pub trait IndexSink {
    /// Queue one document. Nothing is durable until `commit`.
    fn add_document(&mut self, doc: &IndexableDocument) -> Result<()>;

    /// Make every queued document durable.
    fn commit(&mut self) -> Result<()>;
}

// ─── RankingStrategy ──────────────────────────────────────────────────────────
/// A stateless scorer that turns query text into an ordered hit list.
pub trait RankingStrategy {
    /// Short label used for run files and log lines ("vsm", "bm25").
    fn name(&self) -> &str;

    /// Rank documents for `query`, returning at most `top_k` hits in
    /// descending score order. `run_index` is the orchestrator's
    /// sequential cursor, passed through for diagnostics.
    fn search(&self, query: &str, top_k: usize, run_index: usize) -> Result<Vec<SearchHit>>;
}

// ─── QueryExpander ────────────────────────────────────────────────────────────
pub trait QueryExpander {
    /// Turn raw query text into the query string handed to the rankers.
    fn expand(&self, raw: &str) -> Result<String>;
}

// ─── RunSink ──────────────────────────────────────────────────────────────────
/// Destination for ranked output, one call per (query, strategy) pair.
pub trait RunSink {
    fn write_hits(&mut self, run_index: usize, strategy: &str, hits: &[SearchHit]) -> Result<()>;
}

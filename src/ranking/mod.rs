// ============================================================
// Layer 5: Ranking Layer
// ============================================================
// The scoring side of the system. Everything here reads the
// committed index through IndexReader and never writes.
//
//   vector_space.rs   classic TF-IDF vector-space scoring over
//                     the engine's postings and field norms
//   bm25.rs           tantivy's own BM25 scorer
//   expander.rs       query expansion: pseudo-relevance
//                     feedback, or plain normalization
//
// Both strategies follow the same recipe:
//   1. analyze the query with the shared Analyzer
//   2. score every document matching a query term in any
//      configured search field
//   3. keep the top_k documents with a positive score, ties
//      in index order
//
// The scoring formulas are an implementation detail; the
// orchestrator only sees the RankingStrategy trait.
//
// Reference: Manning et al. (2008) Introduction to IR, ch. 6 and 11

/// TF-IDF cosine-style strategy
pub mod vector_space;

/// BM25 strategy
pub mod bm25;

/// Query expanders
pub mod expander;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::data::analyzer::Analyzer;
use crate::domain::error::{Error, Result};
use crate::domain::fields;
use crate::domain::query::SearchHit;
use crate::domain::traits::{QueryExpander, RankingStrategy};
use crate::infra::index_store::IndexReader;

pub use bm25::Bm25Strategy;
pub use expander::{FeedbackExpander, PassThroughExpander};
pub use vector_space::VectorSpaceStrategy;

// ─── Configuration ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Vsm,
    Bm25,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Strategies run for every query, in this order
    pub strategies:    Vec<StrategyKind>,
    /// Index fields whose scores are summed
    pub search_fields: Vec<String>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            strategies:    vec![StrategyKind::Vsm, StrategyKind::Bm25],
            search_fields: vec![fields::TITLE.to_string(), fields::CONTENT.to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpansionKind {
    /// Pseudo-relevance feedback over the top BM25 documents
    Feedback,
    /// Normalize only
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    pub strategy:        ExpansionKind,
    /// Documents treated as relevant in the feedback pass
    pub feedback_docs:   usize,
    /// Terms appended to the query
    pub expansion_terms: usize,
    /// On expansion failure, use the normalized query instead of aborting
    pub fallback_to_normalized: bool,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            strategy:               ExpansionKind::Feedback,
            feedback_docs:          5,
            expansion_terms:        10,
            fallback_to_normalized: false,
        }
    }
}

// ─── Factories ────────────────────────────────────────────────────────────────
/// Instantiate the configured strategies, in configured order.
pub fn build_strategies(
    config:   &RankingConfig,
    reader:   &Arc<IndexReader>,
    analyzer: &Arc<Analyzer>,
) -> Vec<Box<dyn RankingStrategy>> {
    config
        .strategies
        .iter()
        .map(|kind| -> Box<dyn RankingStrategy> {
            match kind {
                StrategyKind::Vsm => Box::new(VectorSpaceStrategy::new(
                    Arc::clone(reader),
                    Arc::clone(analyzer),
                    config.search_fields.clone(),
                )),
                StrategyKind::Bm25 => Box::new(Bm25Strategy::new(
                    Arc::clone(reader),
                    Arc::clone(analyzer),
                    config.search_fields.clone(),
                )),
            }
        })
        .collect()
}

pub fn build_expander(
    config:   &ExpansionConfig,
    ranking:  &RankingConfig,
    reader:   &Arc<IndexReader>,
    analyzer: &Arc<Analyzer>,
) -> Box<dyn QueryExpander> {
    match config.strategy {
        ExpansionKind::None => Box::new(PassThroughExpander::new(Arc::clone(analyzer))),
        ExpansionKind::Feedback => {
            let first_pass = Bm25Strategy::new(
                Arc::clone(reader),
                Arc::clone(analyzer),
                ranking.search_fields.clone(),
            );
            Box::new(FeedbackExpander::new(
                Arc::clone(reader),
                Arc::clone(analyzer),
                first_pass,
                config.feedback_docs,
                config.expansion_terms,
            ))
        }
    }
}

// ─── Shared Helpers ───────────────────────────────────────────────────────────
/// Analyzed query terms with their counts, in first-seen order.
pub(crate) fn query_terms(analyzer: &Analyzer, query: &str) -> Vec<(String, usize)> {
    let mut terms: Vec<(String, usize)> = Vec::new();
    for term in analyzer.analyze(query) {
        match terms.iter_mut().find(|(t, _)| *t == term) {
            Some((_, count)) => *count += 1,
            None => terms.push((term, 1)),
        }
    }
    terms
}

/// Turn scored ordinals into the top `top_k` hits.
/// Ties keep index order; non-positive scores are dropped.
pub(crate) fn collect_hits(
    reader:   &IndexReader,
    scored:   Vec<(usize, f64)>,
    top_k:    usize,
    strategy: &str,
) -> Result<Vec<SearchHit>> {
    let mut ranked: Vec<(usize, f64)> =
        scored.into_iter().filter(|(_, score)| *score > 0.0).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(top_k);

    ranked
        .into_iter()
        .map(|(ord, score)| {
            let id = reader
                .doc_id(ord)
                .ok_or_else(|| search_error(strategy, format!("document ordinal {ord} has no stored id")))?;
            Ok(SearchHit::new(id, score))
        })
        .collect()
}

pub(crate) fn search_error(strategy: &str, message: impl fmt::Display) -> Error {
    Error::SearchEngine {
        strategy: strategy.to_string(),
        query_id: None,
        message:  message.to_string(),
    }
}

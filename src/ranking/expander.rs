// ============================================================
// Layer 5: Query Expanders
// ============================================================
// Turn raw query text into the text the strategies search for.
//
// PassThroughExpander
//   analyzer.normalize(raw), nothing else.
//
// FeedbackExpander (pseudo-relevance feedback)
//   1. normalize the raw query
//   2. run BM25 for it and treat the top `feedback_docs`
//      documents as relevant
//   3. count the analyzed terms of their content field
//   4. append the `expansion_terms` most frequent terms that
//      are not already in the query (ties alphabetical)
//
//   "flutter of wings" → "flutter wing speed swept thin ..."
//
// Expanded text is already analyzed, so strategies that analyze
// it again see the same terms.
//
// Reference: Rocchio (1971), Manning et al. (2008) §9.1.6

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::data::analyzer::Analyzer;
use crate::domain::error::{Error, Result};
use crate::domain::fields;
use crate::domain::traits::{QueryExpander, RankingStrategy};
use crate::infra::index_store::IndexReader;

use super::Bm25Strategy;

// ─── PassThroughExpander ──────────────────────────────────────────────────────
pub struct PassThroughExpander {
    analyzer: Arc<Analyzer>,
}

impl PassThroughExpander {
    pub fn new(analyzer: Arc<Analyzer>) -> Self {
        Self { analyzer }
    }
}

impl QueryExpander for PassThroughExpander {
    fn expand(&self, raw: &str) -> Result<String> {
        Ok(self.analyzer.normalize(raw))
    }
}

// ─── FeedbackExpander ─────────────────────────────────────────────────────────
pub struct FeedbackExpander {
    reader:          Arc<IndexReader>,
    analyzer:        Arc<Analyzer>,
    first_pass:      Bm25Strategy,
    feedback_docs:   usize,
    expansion_terms: usize,
}

impl FeedbackExpander {
    pub fn new(
        reader:          Arc<IndexReader>,
        analyzer:        Arc<Analyzer>,
        first_pass:      Bm25Strategy,
        feedback_docs:   usize,
        expansion_terms: usize,
    ) -> Self {
        Self { reader, analyzer, first_pass, feedback_docs, expansion_terms }
    }

    /// Content term counts over the given feedback documents.
    fn feedback_counts<'a>(
        &self,
        doc_ids: impl Iterator<Item = &'a str>,
    ) -> Result<HashMap<String, usize>> {
        let mut counts = HashMap::new();
        for id in doc_ids {
            let ord = self.reader.find_id(id).ok_or_else(|| Error::Expansion {
                query_id: None,
                message:  format!("feedback document '{id}' is not in the index"),
            })?;
            let content = self
                .reader
                .stored(ord, fields::CONTENT)
                .map_err(|e| Error::Expansion {
                    query_id: None,
                    message:  format!("cannot read feedback document '{id}': {e}"),
                })?
                .unwrap_or_default();
            for term in self.analyzer.analyze(&content) {
                *counts.entry(term).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}

impl QueryExpander for FeedbackExpander {
    fn expand(&self, raw: &str) -> Result<String> {
        let terms = self.analyzer.analyze(raw);
        let normalized = terms.join(" ");
        if terms.is_empty() || self.feedback_docs == 0 || self.expansion_terms == 0 {
            return Ok(normalized);
        }

        let hits = self
            .first_pass
            .search(&normalized, self.feedback_docs, 0)
            .map_err(|e| Error::Expansion {
                query_id: None,
                message:  format!("feedback search failed: {e}"),
            })?;

        let counts = self.feedback_counts(hits.iter().map(|h| h.doc_id.as_str()))?;
        let present: HashSet<&str> = terms.iter().map(String::as_str).collect();

        let mut candidates: Vec<(&str, usize)> = counts
            .iter()
            .filter(|(term, _)| !present.contains(term.as_str()))
            .map(|(term, count)| (term.as_str(), *count))
            .collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        candidates.truncate(self.expansion_terms);

        tracing::debug!(
            "Expanded '{}' with {} terms from {} feedback documents",
            normalized,
            candidates.len(),
            hits.len()
        );

        let mut expanded = normalized;
        for (term, _) in candidates {
            expanded.push(' ');
            expanded.push_str(term);
        }
        Ok(expanded)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::Document;
    use crate::infra::index_store::memory_reader;

    fn feedback(docs: &[Document], feedback_docs: usize, expansion_terms: usize) -> FeedbackExpander {
        let analyzer = Arc::new(Analyzer::default());
        let reader = Arc::new(memory_reader(docs, Arc::clone(&analyzer)));
        let first_pass = Bm25Strategy::new(
            Arc::clone(&reader),
            Arc::clone(&analyzer),
            vec![fields::CONTENT.to_string()],
        );
        FeedbackExpander::new(reader, analyzer, first_pass, feedback_docs, expansion_terms)
    }

    fn corpus() -> Vec<Document> {
        vec![
            Document::with_fields("1", "", "", "", "flutter panel panel supersonic"),
            Document::with_fields("2", "", "", "", "flutter panel damping"),
            Document::with_fields("3", "", "", "", "heat transfer cone"),
        ]
    }

    #[test]
    fn test_pass_through_normalizes() {
        let e = PassThroughExpander::new(Arc::new(Analyzer::default()));
        assert_eq!(e.expand("The Flutter of Panels").unwrap(), "flutter panel");
    }

    #[test]
    fn test_feedback_appends_frequent_terms() {
        let e = feedback(&corpus(), 2, 2);
        // panel: 3, damping and supersonic: 1 each, alphabetical tie-break
        assert_eq!(e.expand("flutter").unwrap(), "flutter panel damp");
    }

    #[test]
    fn test_feedback_skips_terms_already_in_query() {
        let e = feedback(&corpus(), 2, 10);
        let expanded = e.expand("flutter panels").unwrap();
        let words: Vec<&str> = expanded.split(' ').collect();
        assert_eq!(&words[..2], &["flutter", "panel"]);
        assert_eq!(words.iter().filter(|w| **w == "panel").count(), 1);
        assert!(!words.contains(&"heat"));
    }

    #[test]
    fn test_feedback_without_hits_returns_normalized() {
        let e = feedback(&corpus(), 5, 10);
        assert_eq!(e.expand("Rocket motor").unwrap(), "rocket motor");
    }

    #[test]
    fn test_empty_query_stays_empty() {
        let e = feedback(&corpus(), 5, 10);
        assert_eq!(e.expand("of the").unwrap(), "");
    }

    #[test]
    fn test_expanded_query_retrieves_raw_query_documents() {
        let docs = vec![
            Document::with_fields("1", "", "", "", "dynamic response of panels to noise"),
            Document::with_fields("2", "", "", "", "early expansion of a jet only"),
            Document::with_fields("3", "", "", "", "heat transfer cone"),
        ];
        let analyzer = Arc::new(Analyzer::default());
        let reader = Arc::new(memory_reader(&docs, Arc::clone(&analyzer)));
        let bm25 = Bm25Strategy::new(
            Arc::clone(&reader),
            Arc::clone(&analyzer),
            vec![fields::CONTENT.to_string()],
        );
        let ids = |query: &str| -> Vec<String> {
            bm25.search(query, 10, 1).unwrap().into_iter().map(|h| h.doc_id).collect()
        };

        let raw = "response noise expansion only early";
        let direct = ids(raw);
        assert_eq!(direct.len(), 2);

        // stemmed text searches like the words it came from
        assert_eq!(ids("respons nois"), ids("response noise"));
        assert_eq!(ids("response noise"), vec!["1"]);

        let pass = PassThroughExpander::new(Arc::clone(&analyzer));
        assert_eq!(ids(&pass.expand(raw).unwrap()), direct);

        let first_pass = Bm25Strategy::new(
            Arc::clone(&reader),
            Arc::clone(&analyzer),
            vec![fields::CONTENT.to_string()],
        );
        let fb = FeedbackExpander::new(reader, Arc::clone(&analyzer), first_pass, 1, 3);
        let expanded = ids(&fb.expand(raw).unwrap());
        for id in &direct {
            assert!(expanded.contains(id), "document {id} lost by expansion");
        }
    }
}

// ============================================================
// Layer 5: Vector Space Strategy
// ============================================================
// Classic TF-IDF scoring, the same shape as Lucene's classic
// similarity without coordination or query normalisation.
//
// For each query term t and each search field f:
//
//   tf(t, d)   = sqrt(freq of t in field f of d)
//   idf(t)     = 1 + ln(N / (df + 1))
//   norm(f, d) = 1 / sqrt(token count of field f in d)
//
//   score(d)  += qtf(t) * tf(t, d) * idf(t)^2 * norm(f, d)
//
// N is the number of indexed documents and df the number of
// documents whose field f contains t, both as the engine reports
// them; the token count is the field norm. qtf is how often t
// occurs in the analyzed query.
//
// Reference: Manning et al. (2008) Introduction to IR, §6.2 and §6.3

use std::collections::HashMap;
use std::sync::Arc;

use crate::data::analyzer::Analyzer;
use crate::domain::error::Result;
use crate::domain::query::SearchHit;
use crate::domain::traits::RankingStrategy;
use crate::infra::index_store::IndexReader;

use super::{collect_hits, query_terms};

pub const NAME: &str = "vsm";

pub struct VectorSpaceStrategy {
    reader:   Arc<IndexReader>,
    analyzer: Arc<Analyzer>,
    fields:   Vec<String>,
}

impl VectorSpaceStrategy {
    pub fn new(reader: Arc<IndexReader>, analyzer: Arc<Analyzer>, fields: Vec<String>) -> Self {
        Self { reader, analyzer, fields }
    }

    fn idf(&self, field: &str, term: &str) -> Result<f64> {
        let n = self.reader.doc_count() as f64;
        let df = self.reader.doc_freq(field, term)? as f64;
        Ok(1.0 + (n / (df + 1.0)).ln())
    }
}

impl RankingStrategy for VectorSpaceStrategy {
    fn name(&self) -> &str {
        NAME
    }

    fn search(&self, query: &str, top_k: usize, run_index: usize) -> Result<Vec<SearchHit>> {
        let terms = query_terms(&self.analyzer, query);
        if terms.is_empty() || top_k == 0 {
            tracing::debug!("vsm: query {run_index} has no searchable terms");
            return Ok(Vec::new());
        }

        let mut scores: HashMap<usize, f64> = HashMap::new();
        for field in &self.fields {
            for (term, qtf) in &terms {
                let postings = self.reader.postings(field, term)?;
                if postings.is_empty() {
                    continue;
                }
                let idf = self.idf(field, term)?;
                for posting in postings {
                    if posting.len == 0 {
                        continue;
                    }
                    let tf = f64::from(posting.freq).sqrt();
                    let norm = 1.0 / f64::from(posting.len).sqrt();
                    *scores.entry(posting.ord).or_insert(0.0) += *qtf as f64 * tf * idf * idf * norm;
                }
            }
        }

        let hits = collect_hits(&self.reader, scores.into_iter().collect(), top_k, NAME)?;
        tracing::debug!("vsm: query {run_index} -> {} hits", hits.len());
        Ok(hits)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::Document;
    use crate::domain::fields;
    use crate::infra::index_store::memory_reader;

    fn corpus() -> Vec<Document> {
        vec![
            Document::with_fields("1", "supersonic wing flutter", "", "", "flutter of a thin wing at supersonic speed"),
            Document::with_fields("2", "boundary layer", "", "", "laminar boundary layer on a flat plate"),
            Document::with_fields("3", "heat transfer", "", "", "heat transfer in the boundary layer of a cone"),
        ]
    }

    fn strategy() -> VectorSpaceStrategy {
        let analyzer = Arc::new(Analyzer::default());
        let reader = Arc::new(memory_reader(&corpus(), Arc::clone(&analyzer)));
        VectorSpaceStrategy::new(
            reader,
            analyzer,
            vec![fields::TITLE.to_string(), fields::CONTENT.to_string()],
        )
    }

    #[test]
    fn test_name() {
        assert_eq!(strategy().name(), "vsm");
    }

    #[test]
    fn test_matching_document_ranks_first() {
        let hits = strategy().search("wing flutter", 10, 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, "1");
        assert!(hits[0].score > 0.0);
    }

    #[test]
    fn test_scores_descending() {
        let hits = strategy().search("boundary layer heat", 10, 1).unwrap();
        assert_eq!(hits.len(), 2);
        // two title matches outweigh one
        assert_eq!(hits[0].doc_id, "2");
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_top_k_truncates() {
        let hits = strategy().search("boundary layer", 1, 1).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_empty_query_has_no_hits() {
        assert!(strategy().search("", 10, 1).unwrap().is_empty());
        assert!(strategy().search("the of and", 10, 1).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_terms_have_no_hits() {
        assert!(strategy().search("hypersonic propeller", 10, 1).unwrap().is_empty());
    }
}

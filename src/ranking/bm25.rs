// ============================================================
// Layer 5: BM25 Strategy
// ============================================================
// Okapi BM25 as tantivy scores it (k1 = 1.2, b = 0.75, Lucene's
// non-negative idf):
//
//   idf(t)    = ln(1 + (N - df + 0.5) / (df + 0.5))
//   tfn(t, d) = freq * (k1 + 1) / (freq + k1 * (1 - b + b * len / avg_len))
//
// The query becomes a boolean OR of one term query per analyzed
// query term and search field. A repeated query term adds a
// repeated clause, so it counts once per occurrence.
//
// Reference: Robertson & Zaragoza (2009) The Probabilistic
//            Relevance Framework: BM25 and Beyond

use std::sync::Arc;

use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::IndexRecordOption;
use tantivy::Term;

use crate::data::analyzer::Analyzer;
use crate::domain::error::Result;
use crate::domain::query::SearchHit;
use crate::domain::traits::RankingStrategy;
use crate::infra::index_store::IndexReader;

use super::{collect_hits, search_error};

pub const NAME: &str = "bm25";

pub struct Bm25Strategy {
    reader:   Arc<IndexReader>,
    analyzer: Arc<Analyzer>,
    fields:   Vec<String>,
}

impl Bm25Strategy {
    pub fn new(reader: Arc<IndexReader>, analyzer: Arc<Analyzer>, fields: Vec<String>) -> Self {
        Self { reader, analyzer, fields }
    }

    fn build_query(&self, terms: &[String]) -> Result<BooleanQuery> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for name in &self.fields {
            let field = self.reader.field(name)?;
            for term in terms {
                let query = TermQuery::new(
                    Term::from_field_text(field, term),
                    IndexRecordOption::WithFreqs,
                );
                clauses.push((Occur::Should, Box::new(query)));
            }
        }
        Ok(BooleanQuery::new(clauses))
    }
}

impl RankingStrategy for Bm25Strategy {
    fn name(&self) -> &str {
        NAME
    }

    fn search(&self, query: &str, top_k: usize, run_index: usize) -> Result<Vec<SearchHit>> {
        let terms = self.analyzer.analyze(query);
        if terms.is_empty() || top_k == 0 || self.reader.doc_count() == 0 {
            tracing::debug!("bm25: query {run_index} has no searchable terms");
            return Ok(Vec::new());
        }

        // Every match is collected so equal scores can be put in index order
        let top = self
            .reader
            .searcher()
            .search(&self.build_query(&terms)?, &TopDocs::with_limit(self.reader.doc_count()))
            .map_err(|e| search_error(NAME, e))?;

        let scored: Vec<(usize, f64)> = top
            .into_iter()
            .filter_map(|(score, address)| {
                self.reader.ordinal(address).map(|ord| (ord, f64::from(score)))
            })
            .collect();

        let hits = collect_hits(&self.reader, scored, top_k, NAME)?;
        tracing::debug!("bm25: query {run_index} -> {} hits", hits.len());
        Ok(hits)
    }
}

// ============================================================
// Layer 2: QueryUseCase
// ============================================================
// Runs the query collection against the index:
//
//   Step 1: Open the committed index      (Layer 6 - infra)
//   Step 2: Build expander and strategies (Layer 5 - ranking)
//   Step 3: Truncate one run file per strategy (Layer 6 - infra)
//   Step 4: For each query, in file order:
//             skip it if its text is blank
//             expand the raw text
//             search with every strategy, write the hits
//             advance run_index (starts at 1)
//   Step 5: Flush the run files
//
// run_index counts processed queries, not query ids: Cranfield
// query ids have gaps, relevance judgements number queries 1..N.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::data::analyzer::Analyzer;
use crate::data::parser::QueryParser;
use crate::domain::error;
use crate::domain::query::Query;
use crate::domain::traits::{QueryExpander, RankingStrategy, RunSink};
use crate::infra::config::AppConfig;
use crate::infra::index_store::IndexReader;
use crate::infra::run_writer::RunWriter;
use crate::ranking;

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub queries_processed: usize,
    pub skipped:           usize,
    pub hits_written:      usize,
}

pub struct QueryUseCase {
    queries_path: PathBuf,
    output_dir:   PathBuf,
    analyzer:     Arc<Analyzer>,
    expander:     Box<dyn QueryExpander>,
    strategies:   Vec<Box<dyn RankingStrategy>>,
    top_k:        usize,
    fallback_to_normalized: bool,
}

impl QueryUseCase {
    /// Open the index named in `config` and build the configured
    /// expander and strategies on top of it.
    pub fn open(config: &AppConfig, analyzer: Arc<Analyzer>) -> Result<Self> {
        // ── Step 1: Open the index ───────────────────────────────────────────
        let reader = IndexReader::open(&config.index_dir)
            .with_context(|| format!("cannot open index '{}'", config.index_dir.display()))?;
        let reader = Arc::new(reader);

        // ── Step 2: Ranking components ───────────────────────────────────────
        let strategies = ranking::build_strategies(&config.ranking, &reader, &analyzer);
        let expander = ranking::build_expander(&config.expansion, &config.ranking, &reader, &analyzer);

        let mut use_case = Self::new(analyzer, expander, strategies, config.top_k)
            .with_fallback(config.expansion.fallback_to_normalized);
        use_case.queries_path = config.queries_path.clone();
        use_case.output_dir = config.output_dir.clone();
        Ok(use_case)
    }

    pub fn new(
        analyzer:   Arc<Analyzer>,
        expander:   Box<dyn QueryExpander>,
        strategies: Vec<Box<dyn RankingStrategy>>,
        top_k:      usize,
    ) -> Self {
        Self {
            queries_path: PathBuf::new(),
            output_dir:   PathBuf::new(),
            analyzer,
            expander,
            strategies,
            top_k,
            fallback_to_normalized: false,
        }
    }

    pub fn with_fallback(mut self, fallback_to_normalized: bool) -> Self {
        self.fallback_to_normalized = fallback_to_normalized;
        self
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Parse the query file and write one run file per strategy.
    pub fn execute(&self) -> Result<RunSummary> {
        // ── Step 3: Run files ────────────────────────────────────────────────
        let names = self.strategy_names();
        let mut writer = RunWriter::create(&self.output_dir, names.as_slice())
            .with_context(|| format!("cannot create run files in '{}'", self.output_dir.display()))?;

        // ── Step 4: Queries ──────────────────────────────────────────────────
        tracing::info!("Running queries from '{}'", self.queries_path.display());
        let parser = QueryParser::open(&self.queries_path)
            .with_context(|| format!("cannot open queries '{}'", self.queries_path.display()))?;
        let summary = self
            .process(parser, &mut writer)
            .with_context(|| format!("query run over '{}' failed", self.queries_path.display()))?;

        // ── Step 5: Flush ────────────────────────────────────────────────────
        tracing::info!(
            "Processed {} queries ({} skipped), wrote {} result lines",
            summary.queries_processed,
            summary.skipped,
            writer.lines_written()
        );
        for name in &names {
            tracing::info!("  {name}: '{}'", writer.path_for(name).display());
        }
        writer.finish().context("cannot flush run files")?;
        Ok(summary)
    }

    /// The orchestration loop, independent of where queries come from
    /// and where hits go.
    pub fn process<I, S>(&self, queries: I, sink: &mut S) -> error::Result<RunSummary>
    where
        I: IntoIterator<Item = error::Result<Query>>,
        S: RunSink,
    {
        let mut summary = RunSummary::default();
        let mut run_index = 1;

        for query in queries {
            let query = query?;
            if query.is_blank() {
                tracing::debug!("Skipping blank query '{}'", query.id);
                summary.skipped += 1;
                continue;
            }

            let expanded = self.expand(&query)?;
            tracing::debug!("Query {} (run {run_index}): '{expanded}'", query.id);

            for strategy in &self.strategies {
                let hits = strategy
                    .search(&expanded, self.top_k, run_index)
                    .map_err(|e| e.for_query(&query.id))?;
                sink.write_hits(run_index, strategy.name(), &hits)?;
                summary.hits_written += hits.len();
            }

            summary.queries_processed += 1;
            run_index += 1;
        }

        Ok(summary)
    }

    fn expand(&self, query: &Query) -> error::Result<String> {
        match self.expander.expand(&query.text) {
            Ok(expanded) => Ok(expanded),
            Err(e) if self.fallback_to_normalized => {
                tracing::warn!(
                    kind = e.kind(),
                    "Expansion failed for query {}, using normalized text: {e}",
                    query.id
                );
                Ok(self.analyzer.normalize(&query.text))
            }
            Err(e) => Err(e.for_query(&query.id)),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::index_use_case::IndexUseCase;
    use crate::domain::error::Error;
    use crate::domain::query::SearchHit;
    use crate::ranking::ExpansionKind;
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;
    use tempfile::tempdir;

    type Calls = Rc<RefCell<Vec<String>>>;

    /// Marks expanded text so tests can see the expander ran.
    struct TaggingExpander {
        calls: Calls,
        fail:  bool,
    }

    impl QueryExpander for TaggingExpander {
        fn expand(&self, raw: &str) -> error::Result<String> {
            self.calls.borrow_mut().push(raw.to_string());
            if self.fail {
                return Err(Error::Expansion { query_id: None, message: "boom".to_string() });
            }
            Ok(format!("expanded:{}", raw.trim()))
        }
    }

    struct FixedStrategy {
        name:  &'static str,
        calls: Calls,
        hits:  usize,
    }

    impl RankingStrategy for FixedStrategy {
        fn name(&self) -> &str {
            self.name
        }

        fn search(&self, query: &str, top_k: usize, run_index: usize) -> error::Result<Vec<SearchHit>> {
            self.calls.borrow_mut().push(format!("{}:{run_index}:{query}", self.name));
            Ok((0..self.hits.min(top_k))
                .map(|i| SearchHit::new(format!("d{i}"), 1.0 / (i + 1) as f64))
                .collect())
        }
    }

    struct FailingStrategy;

    impl RankingStrategy for FailingStrategy {
        fn name(&self) -> &str {
            "broken"
        }

        fn search(&self, _: &str, _: usize, _: usize) -> error::Result<Vec<SearchHit>> {
            Err(Error::SearchEngine {
                strategy: "broken".to_string(),
                query_id: None,
                message:  "engine down".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct MemorySink {
        blocks: Vec<(usize, String, usize)>,
    }

    impl RunSink for MemorySink {
        fn write_hits(&mut self, run_index: usize, strategy: &str, hits: &[SearchHit]) -> error::Result<()> {
            self.blocks.push((run_index, strategy.to_string(), hits.len()));
            Ok(())
        }
    }

    struct Fixture {
        use_case:  QueryUseCase,
        expanded:  Calls,
        searched:  Calls,
    }

    fn fixture(fail_expansion: bool) -> Fixture {
        let expanded: Calls = Rc::default();
        let searched: Calls = Rc::default();
        let strategies: Vec<Box<dyn RankingStrategy>> = vec![
            Box::new(FixedStrategy { name: "vsm", calls: Rc::clone(&searched), hits: 3 }),
            Box::new(FixedStrategy { name: "bm25", calls: Rc::clone(&searched), hits: 1 }),
        ];
        let expander = Box::new(TaggingExpander { calls: Rc::clone(&expanded), fail: fail_expansion });
        Fixture {
            use_case: QueryUseCase::new(Arc::new(Analyzer::default()), expander, strategies, 2),
            expanded,
            searched,
        }
    }

    fn queries(items: &[(&str, &str)]) -> Vec<error::Result<Query>> {
        items.iter().map(|(id, text)| Ok(Query::new(*id, *text))).collect()
    }

    #[test]
    fn test_no_queries_writes_nothing() {
        let f = fixture(false);
        let mut sink = MemorySink::default();
        let summary = f.use_case.process(Vec::<error::Result<Query>>::new(), &mut sink).unwrap();
        assert_eq!(summary, RunSummary::default());
        assert!(sink.blocks.is_empty());
        assert!(f.searched.borrow().is_empty());
    }

    #[test]
    fn test_every_strategy_runs_in_order_with_sequential_index() {
        let f = fixture(false);
        let mut sink = MemorySink::default();
        let summary = f
            .use_case
            .process(queries(&[("001", "wing "), ("002", "flutter ")]), &mut sink)
            .unwrap();

        assert_eq!(summary.queries_processed, 2);
        // top_k = 2 caps the vsm stub at two hits
        assert_eq!(summary.hits_written, 6);
        assert_eq!(
            sink.blocks,
            vec![
                (1, "vsm".to_string(), 2),
                (1, "bm25".to_string(), 1),
                (2, "vsm".to_string(), 2),
                (2, "bm25".to_string(), 1),
            ]
        );
        assert_eq!(
            *f.searched.borrow(),
            vec!["vsm:1:expanded:wing", "bm25:1:expanded:wing", "vsm:2:expanded:flutter", "bm25:2:expanded:flutter"]
        );
    }

    #[test]
    fn test_blank_queries_skipped_without_advancing_index() {
        let f = fixture(false);
        let mut sink = MemorySink::default();
        let summary = f
            .use_case
            .process(queries(&[("001", "   "), ("002", "lift "), ("003", "")]), &mut sink)
            .unwrap();

        assert_eq!(summary.queries_processed, 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(sink.blocks[0].0, 1);
        assert_eq!(f.expanded.borrow().len(), 1);
    }

    #[test]
    fn test_last_query_is_expanded_like_the_rest() {
        let f = fixture(false);
        let mut sink = MemorySink::default();
        f.use_case
            .process(queries(&[("001", "drag "), ("002", "heat ")]), &mut sink)
            .unwrap();
        assert_eq!(*f.expanded.borrow(), vec!["drag ", "heat "]);
        assert!(f.searched.borrow().iter().all(|c| c.contains("expanded:")));
    }

    #[test]
    fn test_expansion_failure_is_fatal_by_default() {
        let f = fixture(true);
        let mut sink = MemorySink::default();
        let err = f
            .use_case
            .process(queries(&[("007", "shock ")]), &mut sink)
            .unwrap_err();
        assert_eq!(err.kind(), "ExpansionFailure");
        assert!(err.to_string().contains("007"));
        assert!(sink.blocks.is_empty());
    }

    #[test]
    fn test_expansion_fallback_uses_normalized_text() {
        let f = fixture(true);
        let use_case = f.use_case.with_fallback(true);
        let mut sink = MemorySink::default();
        use_case.process(queries(&[("001", "The Shocks ")]), &mut sink).unwrap();
        assert_eq!(f.searched.borrow()[0], "vsm:1:shock");
    }

    #[test]
    fn test_search_failure_carries_query_id() {
        let use_case = QueryUseCase::new(
            Arc::new(Analyzer::default()),
            Box::new(ranking::PassThroughExpander::new(Arc::new(Analyzer::default()))),
            vec![Box::new(FailingStrategy)],
            10,
        );
        let mut sink = MemorySink::default();
        let err = use_case.process(queries(&[("042", "nozzle ")]), &mut sink).unwrap_err();
        assert_eq!(err.kind(), "SearchEngineFailure");
        assert!(err.to_string().contains("042"));
    }

    #[test]
    fn test_parse_error_propagates() {
        let f = fixture(false);
        let mut sink = MemorySink::default();
        let items = vec![
            Ok(Query::new("001", "lift ")),
            Err(Error::MalformedLine { line_no: 3, line: "x".to_string(), reason: "too short" }),
        ];
        let err = f.use_case.process(items, &mut sink).unwrap_err();
        assert_eq!(err.kind(), "MalformedLine");
        assert_eq!(sink.blocks.len(), 2);
    }

    #[test]
    fn test_end_to_end_run_files() {
        let dir = tempdir().unwrap();
        let corpus = dir.path().join("cran.all.1400");
        let queries_path = dir.path().join("cran.qry");
        fs::write(
            &corpus,
            ".I 1\n.T\nsupersonic wing flutter\n.A\nsmith\n.B\nj. ae. sc.\n.W\nflutter of thin wings at supersonic speed\n\
             .I 2\n.T\nlaminar boundary layer\n.W\nboundary layer growth on a flat plate\n\
             .I 3\n.T\ncone heat transfer\n.W\nheat transfer to a cone in hypersonic flow\n",
        )
        .unwrap();
        fs::write(
            &queries_path,
            ".I 001\n.W\nwhat is known about wing flutter at supersonic speed?\n.I 002\n.W\nheat transfer to cones\n",
        )
        .unwrap();

        let mut config = AppConfig {
            corpus_path: corpus,
            queries_path,
            index_dir:   dir.path().join("index"),
            output_dir:  dir.path().join("results"),
            top_k:       2,
            ..AppConfig::default()
        };
        config.expansion.strategy = ExpansionKind::None;

        let analyzer = Arc::new(Analyzer::new(&config.analyzer));
        IndexUseCase::new(&config, Arc::clone(&analyzer)).execute().unwrap();
        let summary = QueryUseCase::open(&config, analyzer).unwrap().execute().unwrap();
        assert_eq!(summary.queries_processed, 2);

        let bm25 = fs::read_to_string(config.output_dir.join("bm25.run")).unwrap();
        let first: Vec<&str> = bm25.lines().next().unwrap().split(' ').collect();
        assert_eq!(first[..4], ["1", "Q0", "1", "1"]);
        assert_eq!(first[5], "bm25");
        assert!(bm25.lines().any(|l| l.starts_with("2 Q0 3 1 ")));

        let vsm = fs::read_to_string(config.output_dir.join("vsm.run")).unwrap();
        assert!(vsm.lines().all(|l| l.ends_with(" vsm")));
        assert!(vsm.lines().count() <= 4);

        // feedback expansion keeps the raw query's best match
        config.expansion.strategy = ExpansionKind::Feedback;
        let analyzer = Arc::new(Analyzer::new(&config.analyzer));
        let summary = QueryUseCase::open(&config, analyzer).unwrap().execute().unwrap();
        assert_eq!(summary.queries_processed, 2);
        let bm25 = fs::read_to_string(config.output_dir.join("bm25.run")).unwrap();
        assert!(bm25.lines().any(|l| l.starts_with("1 Q0 1 ")));
        assert!(bm25.lines().any(|l| l.starts_with("2 Q0 3 ")));
    }
}

// ============================================================
// Layer 2: IndexUseCase
// ============================================================
// Builds a fresh index from the corpus file:
//
//   Step 1: Open the corpus parser       (Layer 4 - data)
//   Step 2: Open the index in Create mode (Layer 6 - infra)
//   Step 3: Build and add each document  (Layer 4 → Layer 6)
//   Step 4: Commit and close             (Layer 6 - infra)
//
// Parsing is streamed: one document is in memory at a time.
// Any malformed line aborts the run before anything is
// committed.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::data::analyzer::Analyzer;
use crate::data::builder::DocumentBuilder;
use crate::data::parser::CorpusParser;
use crate::domain::document::Document;
use crate::domain::error;
use crate::domain::traits::IndexSink;
use crate::infra::config::AppConfig;
use crate::infra::index_store::{IndexWriter, OpenMode};

pub struct IndexUseCase {
    corpus_path: PathBuf,
    index_dir:   PathBuf,
    analyzer:    Arc<Analyzer>,
    builder:     DocumentBuilder,
}

impl IndexUseCase {
    pub fn new(config: &AppConfig, analyzer: Arc<Analyzer>) -> Self {
        Self {
            corpus_path: config.corpus_path.clone(),
            index_dir:   config.index_dir.clone(),
            analyzer,
            builder:     DocumentBuilder::new(config.fields),
        }
    }

    /// Index the whole corpus, returning the number of documents.
    pub fn execute(&self) -> Result<usize> {
        // ── Step 1: Open the corpus ──────────────────────────────────────────
        tracing::info!("Indexing corpus '{}'", self.corpus_path.display());
        let parser = CorpusParser::open(&self.corpus_path)
            .with_context(|| format!("cannot open corpus '{}'", self.corpus_path.display()))?;

        // ── Step 2: Open the index, discarding any previous one ──────────────
        let mut writer = IndexWriter::open(
            &self.index_dir,
            OpenMode::Create,
            Arc::clone(&self.analyzer),
            &self.builder.layout(),
        )
        .with_context(|| format!("cannot open index '{}'", self.index_dir.display()))?;

        // ── Step 3 and 4: Stream documents in, then commit ───────────────────
        let count = index_documents(parser, &self.builder, &mut writer)
            .with_context(|| format!("indexing '{}' failed", self.corpus_path.display()))?;
        writer.close().context("cannot close index")?;

        tracing::info!("Indexed {} documents into '{}'", count, self.index_dir.display());
        Ok(count)
    }
}

/// Feed every parsed document to `sink` and commit once at the end.
pub fn index_documents<I, S>(documents: I, builder: &DocumentBuilder, sink: &mut S) -> error::Result<usize>
where
    I: IntoIterator<Item = error::Result<Document>>,
    S: IndexSink,
{
    let mut count = 0;
    for document in documents {
        let document = document?;
        sink.add_document(&builder.build(&document))?;
        count += 1;
        if count % 200 == 0 {
            tracing::debug!("Indexed {count} documents");
        }
    }
    sink.commit()?;
    Ok(count)
}

// ============================================================
// Layer 6: Index Store
// ============================================================
// The inverted index, kept in a tantivy directory.
//
// Schema (derived from the DocumentBuilder layout):
//   Keyword fields   STRING | STORED, one exact-match term
//   Text fields      STORED, tokenized by the shared Analyzer
//                    (registered as the "cran" tokenizer), with
//                    freqs, plus positions when the layout asks
//   _seq             u64, STORED; insertion order, so document
//                    ordinals survive segment merges
//
// Writer side (IndexSink):
//   open(dir, Create | Append) → add_document()* → commit() → close()
//
//   - Create on an existing index deletes every document; the
//     deletion becomes visible with the next commit.
//   - Append keeps the committed documents.
//   - Either mode refuses an index whose schema differs.
//
// Reader side:
//   IndexReader::open(dir) takes a searcher over the last commit
//   and numbers the live documents 0..N in insertion order. The
//   rankers work with those ordinals.
//
// Reference: tantivy docs, "Index", "Schema", "Tokenizer"
//            Manning et al. (2008) Introduction to IR, ch. 1-2

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tantivy::postings::Postings;
use tantivy::schema::{
    Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, Value, STORED, STRING,
};
use tantivy::tokenizer::{TextAnalyzer, Token, TokenStream, Tokenizer};
use tantivy::{
    DocAddress, DocSet, Index, IndexWriter as EngineWriter, ReloadPolicy, Searcher,
    TantivyDocument, Term, TERMINATED,
};

use crate::data::analyzer::Analyzer;
use crate::domain::error::{Error, Result};
use crate::domain::fields::{self, FieldKind, FieldSpec, IndexableDocument};
use crate::domain::traits::IndexSink;

/// Name the analyzer is registered under in every index.
pub const TOKENIZER_NAME: &str = "cran";

const SEQ_FIELD: &str = "_seq";
const META_FILE: &str = "meta.json";
const WRITER_THREADS: usize = 1;
const WRITER_HEAP_BYTES: usize = 50_000_000;

/// How `IndexWriter::open` treats an existing index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Start empty; the previous documents go away on the next commit
    Create,
    /// Keep the committed documents and add to them
    Append,
}

fn engine_err(context: &str, err: impl fmt::Display) -> Error {
    Error::index(format!("{context}: {err}"))
}

// ─── Schema ───────────────────────────────────────────────────────────────────
pub fn build_schema(layout: &[FieldSpec]) -> Schema {
    let mut builder = Schema::builder();
    for spec in layout {
        match spec.kind {
            FieldKind::Keyword => {
                builder.add_text_field(spec.name, STRING | STORED);
            }
            FieldKind::Text { positions } => {
                let record = if positions {
                    IndexRecordOption::WithFreqsAndPositions
                } else {
                    IndexRecordOption::WithFreqs
                };
                let indexing = TextFieldIndexing::default()
                    .set_tokenizer(TOKENIZER_NAME)
                    .set_index_option(record);
                let options = TextOptions::default().set_indexing_options(indexing).set_stored();
                builder.add_text_field(spec.name, options);
            }
        }
    }
    builder.add_u64_field(SEQ_FIELD, STORED);
    builder.build()
}

fn same_schema(a: &Schema, b: &Schema) -> bool {
    matches!(
        (serde_json::to_value(a), serde_json::to_value(b)),
        (Ok(x), Ok(y)) if x == y
    )
}

// ─── Tokenizer ────────────────────────────────────────────────────────────────
/// Feeds the Analyzer's terms to tantivy, so documents and queries
/// share one vocabulary.
#[derive(Clone)]
struct AnalyzerTokenizer {
    analyzer: Arc<Analyzer>,
}

struct AnalyzedTokens {
    tokens:  std::vec::IntoIter<Token>,
    current: Token,
}

impl Tokenizer for AnalyzerTokenizer {
    type TokenStream<'a> = AnalyzedTokens;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
        let tokens: Vec<Token> = self
            .analyzer
            .analyze_spans(text)
            .into_iter()
            .enumerate()
            .map(|(position, (term, span))| Token {
                offset_from: span.start,
                offset_to:   span.end,
                position,
                text:        term,
                ..Token::default()
            })
            .collect();
        AnalyzedTokens { tokens: tokens.into_iter(), current: Token::default() }
    }
}

impl TokenStream for AnalyzedTokens {
    fn advance(&mut self) -> bool {
        match self.tokens.next() {
            Some(token) => {
                self.current = token;
                true
            }
            None => false,
        }
    }

    fn token(&self) -> &Token {
        &self.current
    }

    fn token_mut(&mut self) -> &mut Token {
        &mut self.current
    }
}

fn register_analyzer(index: &Index, analyzer: Arc<Analyzer>) {
    index
        .tokenizers()
        .register(TOKENIZER_NAME, TextAnalyzer::builder(AnalyzerTokenizer { analyzer }).build());
}

// ─── IndexWriter ──────────────────────────────────────────────────────────────
pub struct IndexWriter {
    writer:  EngineWriter,
    fields:  HashMap<String, (Field, FieldKind)>,
    seq:     Field,
    /// Documents visible after the last commit
    base:    usize,
    /// Documents added since the last commit
    pending: usize,
    /// Set by add_document and by Create's delete-all
    dirty:   bool,
}

impl IndexWriter {
    /// Open (and create, if needed) the index directory.
    pub fn open(
        dir:      impl Into<PathBuf>,
        mode:     OpenMode,
        analyzer: Arc<Analyzer>,
        layout:   &[FieldSpec],
    ) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

        let schema = build_schema(layout);
        let index = if dir.join(META_FILE).exists() {
            let index = Index::open_in_dir(&dir)
                .map_err(|e| engine_err(&format!("cannot open '{}'", dir.display()), e))?;
            if !same_schema(&index.schema(), &schema) {
                return Err(Error::index(format!(
                    "index at '{}' was built with different field options",
                    dir.display()
                )));
            }
            index
        } else {
            Index::create_in_dir(&dir, schema)
                .map_err(|e| engine_err(&format!("cannot create '{}'", dir.display()), e))?
        };

        let writer = Self::from_index(&index, mode, analyzer, layout)?;
        tracing::debug!(
            "Opened index writer at '{}' ({:?}, {} existing documents)",
            dir.display(),
            mode,
            writer.base
        );
        Ok(writer)
    }

    fn from_index(
        index:    &Index,
        mode:     OpenMode,
        analyzer: Arc<Analyzer>,
        layout:   &[FieldSpec],
    ) -> Result<Self> {
        register_analyzer(index, analyzer);

        let schema = index.schema();
        let mut fields = HashMap::new();
        for spec in layout {
            let field = schema
                .get_field(spec.name)
                .map_err(|e| engine_err("schema lookup", e))?;
            fields.insert(spec.name.to_string(), (field, spec.kind));
        }
        let seq = schema.get_field(SEQ_FIELD).map_err(|e| engine_err("schema lookup", e))?;

        let writer: EngineWriter = index
            .writer_with_num_threads(WRITER_THREADS, WRITER_HEAP_BYTES)
            .map_err(|e| engine_err("cannot acquire index writer", e))?;

        let (base, dirty) = match mode {
            OpenMode::Create => {
                writer
                    .delete_all_documents()
                    .map_err(|e| engine_err("cannot clear index", e))?;
                (0, true)
            }
            OpenMode::Append => {
                let reader: tantivy::IndexReader = index
                    .reader_builder()
                    .reload_policy(ReloadPolicy::Manual)
                    .try_into()
                    .map_err(|e| engine_err("cannot read index", e))?;
                (reader.searcher().num_docs() as usize, false)
            }
        };

        Ok(Self { writer, fields, seq, base, pending: 0, dirty })
    }

    /// Documents in the writer, committed or not.
    pub fn doc_count(&self) -> usize {
        self.base + self.pending
    }

    /// Commit outstanding work and wait for background merges.
    pub fn close(mut self) -> Result<()> {
        if self.dirty {
            self.commit()?;
        }
        self.writer
            .wait_merging_threads()
            .map_err(|e| engine_err("cannot finish merges", e))
    }
}

impl IndexSink for IndexWriter {
    fn add_document(&mut self, doc: &IndexableDocument) -> Result<()> {
        let id = doc
            .id()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::index("document has no id field"))?;

        let mut document = TantivyDocument::default();
        for field in &doc.fields {
            let (handle, kind) = self
                .fields
                .get(&field.name)
                .ok_or_else(|| Error::index(format!("unknown field '{}'", field.name)))?;
            if *kind != field.kind {
                return Err(Error::index(format!(
                    "field '{}' is {:?} in the index but {:?} in document {id}",
                    field.name, kind, field.kind
                )));
            }
            document.add_text(*handle, &field.value);
        }
        let seq = self.doc_count() as u64;
        document.add_u64(self.seq, seq);

        self.writer
            .add_document(document)
            .map_err(|e| engine_err(&format!("cannot add document {id}"), e))?;
        self.pending += 1;
        self.dirty = true;

        tracing::trace!("Added document {id} as sequence {seq}");
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.writer.commit().map_err(|e| engine_err("commit failed", e))?;
        tracing::debug!(
            "Committed {} new documents ({} total)",
            self.pending,
            self.doc_count()
        );
        self.base += self.pending;
        self.pending = 0;
        self.dirty = false;
        Ok(())
    }
}

// ─── IndexReader ──────────────────────────────────────────────────────────────
/// A document's entry in a term's posting list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    /// Reader ordinal of the document
    pub ord:  usize,
    pub freq: u32,
    /// Token count of the field in this document
    pub len:  u32,
}

/// Read-only view of the last committed index.
pub struct IndexReader {
    searcher: Searcher,
    /// Ordinal → engine address, in insertion order
    addresses: Vec<DocAddress>,
    ordinals:  HashMap<DocAddress, usize>,
    ids:       Vec<String>,
    by_id:     HashMap<String, usize>,
}

impl IndexReader {
    pub fn open(dir: &Path) -> Result<Self> {
        let meta = dir.join(META_FILE);
        if !meta.exists() {
            let missing = io::Error::new(io::ErrorKind::NotFound, "no committed index");
            return Err(Error::io(meta, missing));
        }
        let index = Index::open_in_dir(dir)
            .map_err(|e| engine_err(&format!("cannot open '{}'", dir.display()), e))?;
        let reader = Self::from_index(&index)?;
        tracing::info!(
            "Opened index '{}' with {} documents",
            dir.display(),
            reader.doc_count()
        );
        Ok(reader)
    }

    fn from_index(index: &Index) -> Result<Self> {
        let engine_reader: tantivy::IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| engine_err("cannot read index", e))?;
        let searcher = engine_reader.searcher();

        let schema = searcher.schema().clone();
        let id_field = schema.get_field(fields::ID).map_err(|e| engine_err("schema lookup", e))?;
        let seq_field = schema.get_field(SEQ_FIELD).map_err(|e| engine_err("schema lookup", e))?;

        let mut live: Vec<(u64, DocAddress, String)> = Vec::new();
        for (segment_ord, segment) in searcher.segment_readers().iter().enumerate() {
            for doc in segment.doc_ids_alive() {
                let address = DocAddress::new(segment_ord as u32, doc);
                let stored: TantivyDocument = searcher
                    .doc(address)
                    .map_err(|e| engine_err("cannot load stored fields", e))?;
                let seq = stored.get_first(seq_field).and_then(|v| v.as_u64()).unwrap_or(u64::MAX);
                let id = stored
                    .get_first(id_field)
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                live.push((seq, address, id));
            }
        }
        live.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut reader = Self {
            searcher,
            addresses: Vec::with_capacity(live.len()),
            ordinals:  HashMap::with_capacity(live.len()),
            ids:       Vec::with_capacity(live.len()),
            by_id:     HashMap::with_capacity(live.len()),
        };
        for (ord, (_, address, id)) in live.into_iter().enumerate() {
            reader.addresses.push(address);
            reader.ordinals.insert(address, ord);
            reader.by_id.entry(id.clone()).or_insert(ord);
            reader.ids.push(id);
        }
        Ok(reader)
    }

    pub fn doc_count(&self) -> usize {
        self.ids.len()
    }

    /// The external identifier of the document at `ord`.
    pub fn doc_id(&self, ord: usize) -> Option<&str> {
        self.ids.get(ord).map(String::as_str)
    }

    /// Ordinal of the document whose id keyword equals `id`.
    pub fn find_id(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Ordinal of a document the engine returned, if it is live.
    pub fn ordinal(&self, address: DocAddress) -> Option<usize> {
        self.ordinals.get(&address).copied()
    }

    pub fn searcher(&self) -> &Searcher {
        &self.searcher
    }

    pub fn field(&self, name: &str) -> Result<Field> {
        self.searcher
            .schema()
            .get_field(name)
            .map_err(|e| engine_err("schema lookup", e))
    }

    /// Stored value of `field` for the document at `ord`.
    pub fn stored(&self, ord: usize, field: &str) -> Result<Option<String>> {
        let handle = self.field(field)?;
        let Some(&address) = self.addresses.get(ord) else {
            return Ok(None);
        };
        let doc: TantivyDocument = self
            .searcher
            .doc(address)
            .map_err(|e| engine_err("cannot load stored fields", e))?;
        Ok(doc.get_first(handle).and_then(|v| v.as_str()).map(str::to_string))
    }

    /// Number of documents whose `field` contains `term`.
    pub fn doc_freq(&self, field: &str, term: &str) -> Result<u64> {
        let term = Term::from_field_text(self.field(field)?, term);
        self.searcher
            .doc_freq(&term)
            .map_err(|e| engine_err("cannot read document frequency", e))
    }

    /// Posting list for `term` in `field`, in ascending ordinal order.
    pub fn postings(&self, field: &str, term: &str) -> Result<Vec<Posting>> {
        let handle = self.field(field)?;
        let term = Term::from_field_text(handle, term);

        let mut out = Vec::new();
        for (segment_ord, segment) in self.searcher.segment_readers().iter().enumerate() {
            let inverted = segment
                .inverted_index(handle)
                .map_err(|e| engine_err("cannot open inverted index", e))?;
            let Some(mut postings) = inverted
                .read_postings(&term, IndexRecordOption::WithFreqs)
                .map_err(|e| engine_err("cannot read postings", e))?
            else {
                continue;
            };
            let norms = segment
                .get_fieldnorms_reader(handle)
                .map_err(|e| engine_err("cannot read field norms", e))?;

            let mut doc = postings.doc();
            while doc != TERMINATED {
                if let Some(ord) = self.ordinal(DocAddress::new(segment_ord as u32, doc)) {
                    out.push(Posting { ord, freq: postings.term_freq(), len: norms.fieldnorm(doc) });
                }
                doc = postings.advance();
            }
        }
        out.sort_by_key(|p| p.ord);
        Ok(out)
    }
}

impl fmt::Debug for IndexReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexReader").field("docs", &self.doc_count()).finish()
    }
}

// ─── Test Support ─────────────────────────────────────────────────────────────
/// Builds a reader over an in-RAM index, skipping the filesystem.
#[cfg(test)]
pub(crate) fn memory_reader(
    docs:     &[crate::domain::document::Document],
    analyzer: Arc<Analyzer>,
) -> IndexReader {
    use crate::data::builder::DocumentBuilder;

    let builder = DocumentBuilder::default();
    let layout = builder.layout();
    let index = Index::create_in_ram(build_schema(&layout));
    let mut writer = IndexWriter::from_index(&index, OpenMode::Append, analyzer, &layout).unwrap();
    for doc in docs {
        writer.add_document(&builder.build(doc)).unwrap();
    }
    writer.close().unwrap();
    IndexReader::from_index(&index).unwrap()
}

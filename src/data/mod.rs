// ============================================================
// Layer 4: Data Pipeline
// ============================================================
// Everything between the raw collection files and the index
// engine's input.
//
//   cran.all.1400 / cran.qry
//       │
//       ▼
//   Tag               → classifies each line by its 2-char prefix
//       │
//       ▼
//   CorpusParser /
//   QueryParser       → tag state machines yielding records
//       │
//       ▼
//   DocumentBuilder   → maps a Document onto index fields
//       │
//       ▼
//   Analyzer          → tokenize, lowercase, stopwords, length, stem
//                       (run by the index writer and the rankers)
//
// Reference: Rust Book §13 (Iterators and Closures)

/// Two-character line tag classification
pub mod tag;

/// Corpus and query record parsers
pub mod parser;

/// Text normalization pipeline shared by ingest and query paths
pub mod analyzer;

/// Document to index-field mapping
pub mod builder;

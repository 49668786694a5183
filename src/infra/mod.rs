// ============================================================
// Layer 6: Infrastructure Layer
// ============================================================
// Filesystem-facing pieces used by the application layer:
//
//   config.rs         AppConfig: defaults, JSON load/save, validation
//
//   index_store.rs    the index engine: IndexWriter (open,
//                     add_document, commit, close) and
//                     IndexReader (statistics and postings),
//                     on top of a tantivy index in index/
//
//   run_writer.rs     TREC-format run files, one per ranking
//                     strategy, under results/
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling)

/// Run configuration
pub mod config;

/// Inverted index writer and reader
pub mod index_store;

/// Ranked output writer
pub mod run_writer;

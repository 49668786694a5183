// ============================================================
// Layer 2: Application / Use Cases
// ============================================================
// Workflow coordination only. Parsing, scoring and file
// formats live in the lower layers; this layer wires them
// together for one command.
//
//   index_use_case.rs  corpus file → documents → index
//   query_use_case.rs  query file → expansion → every ranking
//                      strategy → run files
//
// Errors leave this layer as anyhow::Error with context
// naming the file or step that failed.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Build the index from the corpus
pub mod index_use_case;

// Run every query against every strategy
pub mod query_use_case;

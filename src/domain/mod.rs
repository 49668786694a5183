// ============================================================
// Layer 3: Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing what the
// system works with: records, queries, hits, index fields,
// errors, and the collaborator interfaces.
//
// Rules for this layer:
//   - NO file I/O
//   - NO scoring or text analysis
//   - Only data types and the traits other layers implement
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A parsed corpus record
pub mod document;

// A parsed query and a ranked hit
pub mod query;

// Field schema consumed by the index engine
pub mod fields;

// The crate-wide error enum
pub mod error;

// Collaborator abstractions (index, rankers, expander, output)
pub mod traits;

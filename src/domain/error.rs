// ============================================================
// Layer 3: Error Type
// ============================================================
// Every failure the pipeline can report, as one enum.
//
// The lower layers (data, ranking, infra) return this typed
// error so callers can match on the kind. The application and
// CLI layers wrap it in anyhow with extra context before it
// reaches the user.
//
// Every variant is fatal: nothing here is retried or downgraded
// to a warning. The Display text always starts with the kind so
// the final "Error: ..." line names what went wrong.
//
// Reference: Rust Book §9 (Recoverable Errors with Result)

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used across the data, ranking and infra layers.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A line could not be classified by its two-character tag.
    #[error("malformed line: line {line_no}: {reason}: {line:?}")]
    MalformedLine {
        line_no: usize,
        line:    String,
        reason:  &'static str,
    },

    /// File missing, unreadable, or a read/write failed mid-stream.
    #[error("I/O failure: {}: {source}", path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("index engine failure: {message}")]
    IndexEngine { message: String },

    #[error("search engine failure ({strategy}{}): {message}", fmt_query(query_id))]
    SearchEngine {
        strategy: String,
        query_id: Option<String>,
        message:  String,
    },

    #[error("expansion failure{}: {message}", fmt_query(query_id))]
    Expansion {
        query_id: Option<String>,
        message:  String,
    },

    #[error("configuration failure: {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl Error {
    /// Short stable name of the error kind, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::MalformedLine { .. } => "MalformedLine",
            Error::Io { .. }            => "IOFailure",
            Error::IndexEngine { .. }   => "IndexEngineFailure",
            Error::SearchEngine { .. }  => "SearchEngineFailure",
            Error::Expansion { .. }     => "ExpansionFailure",
            Error::Config { .. }        => "ConfigFailure",
        }
    }

    /// Build an `Io` error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }

    pub fn index(message: impl Into<String>) -> Self {
        Error::IndexEngine { message: message.into() }
    }

    /// Attach a query id to search and expansion errors that were raised
    /// without one. Other kinds pass through untouched.
    pub fn for_query(self, id: &str) -> Self {
        match self {
            Error::SearchEngine { strategy, query_id: None, message } => Error::SearchEngine {
                strategy,
                query_id: Some(id.to_string()),
                message,
            },
            Error::Expansion { query_id: None, message } => Error::Expansion {
                query_id: Some(id.to_string()),
                message,
            },
            other => other,
        }
    }
}

fn fmt_query(query_id: &Option<String>) -> String {
    match query_id {
        Some(id) => format!(", query {id}"),
        None     => String::new(),
    }
}

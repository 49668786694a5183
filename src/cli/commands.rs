// ============================================================
// Layer 1: CLI Commands and Arguments
// ============================================================
// Three subcommands:
//
//   index   parse the corpus and build the index
//   search  run the query file against an existing index
//   run     index, then search (the default with no subcommand)
//
// Every flag is optional. A flag that is given overrides the
// value from --config, which overrides the built-in default,
// so the args are applied onto an AppConfig rather than
// converted into a fresh one.
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::infra::config::AppConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse the corpus and build a fresh index
    Index(IndexArgs),

    /// Run the query file against an existing index
    Search(SearchArgs),

    /// Build the index, then run the queries
    Run(RunArgs),
}

/// Arguments for the `index` command.
#[derive(Args, Debug, Default)]
pub struct IndexArgs {
    /// Corpus file in Cranfield format
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Directory the index is written to
    #[arg(long)]
    pub index_dir: Option<PathBuf>,
}

/// Arguments for the `search` command.
#[derive(Args, Debug, Default)]
pub struct SearchArgs {
    /// Query file in Cranfield format
    #[arg(long)]
    pub queries: Option<PathBuf>,

    /// Directory holding the index built by `index`
    #[arg(long)]
    pub index_dir: Option<PathBuf>,

    /// Directory for the per-strategy run files
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Hits kept per query and strategy
    #[arg(long)]
    pub top_k: Option<usize>,
}

/// Arguments for the `run` command: the union of the two above.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    #[arg(long)]
    pub queries: Option<PathBuf>,

    #[arg(long)]
    pub index_dir: Option<PathBuf>,

    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    #[arg(long)]
    pub top_k: Option<usize>,
}

/// Which pipeline stages a command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Index,
    Search,
    Both,
}

impl Commands {
    /// Apply the flags onto `config` and report what to run.
    pub fn apply(self, config: &mut AppConfig) -> Step {
        match self {
            Commands::Index(args) => {
                args.apply(config);
                Step::Index
            }
            Commands::Search(args) => {
                args.apply(config);
                Step::Search
            }
            Commands::Run(args) => {
                args.apply(config);
                Step::Both
            }
        }
    }
}

/// Overwrite `slot` only when the flag was given.
fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

impl IndexArgs {
    pub fn apply(self, config: &mut AppConfig) {
        set(&mut config.corpus_path, self.corpus);
        set(&mut config.index_dir, self.index_dir);
    }
}

impl SearchArgs {
    pub fn apply(self, config: &mut AppConfig) {
        set(&mut config.queries_path, self.queries);
        set(&mut config.index_dir, self.index_dir);
        set(&mut config.output_dir, self.output_dir);
        set(&mut config.top_k, self.top_k);
    }
}

impl RunArgs {
    pub fn apply(self, config: &mut AppConfig) {
        IndexArgs { corpus: self.corpus, index_dir: self.index_dir.clone() }.apply(config);
        SearchArgs {
            queries:    self.queries,
            index_dir:  self.index_dir,
            output_dir: self.output_dir,
            top_k:      self.top_k,
        }
        .apply(config);
    }
}

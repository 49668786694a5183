// ============================================================
// Layer 1: CLI / Presentation Layer
// ============================================================
// Parses the command line with clap, resolves the AppConfig
// (defaults, then --config file, then flags) and hands off to
// the Layer 2 use cases. Nothing is computed here.
//
//   cran-search                       same as `cran-search run`
//   cran-search index  [--corpus P] [--index-dir D]
//   cran-search search [--queries P] [--index-dir D]
//                      [--output-dir O] [--top-k N]
//   cran-search run    [any of the above]
//   cran-search --config run.json ...
//   cran-search --write-config used.json ...
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Commands, RunArgs, Step};

use crate::application::index_use_case::IndexUseCase;
use crate::application::query_use_case::QueryUseCase;
use crate::data::analyzer::Analyzer;
use crate::infra::config::AppConfig;

#[derive(Parser, Debug)]
#[command(
    name = "cran-search",
    version,
    about = "Index the Cranfield collection and rank its queries with TF-IDF and BM25."
)]
pub struct Cli {
    /// JSON configuration file; flags override its values
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Save the effective configuration here before running
    #[arg(long, global = true)]
    pub write_config: Option<PathBuf>,

    /// The subcommand to run; `run` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let (config, step) = self.prepare()?;
        match step {
            Step::Index  => run_index(&config),
            Step::Search => run_search(&config),
            Step::Both   => {
                run_index(&config)?;
                run_search(&config)
            }
        }
    }

    /// Resolve defaults < file < flags, validate, and save the
    /// result when `--write-config` was given.
    fn prepare(self) -> Result<(AppConfig, Step)> {
        let mut config = AppConfig::load_or_default(self.config.as_deref())
            .context("cannot load configuration")?;
        let origin = self.config.unwrap_or_else(|| PathBuf::from("<command line>"));

        let step = self.command.unwrap_or(Commands::Run(RunArgs::default())).apply(&mut config);
        config.validate(&origin)?;
        tracing::debug!("Effective configuration: {:?}", config);

        if let Some(path) = &self.write_config {
            config
                .save(path)
                .with_context(|| format!("cannot write configuration '{}'", path.display()))?;
            tracing::info!("Wrote effective configuration to '{}'", path.display());
        }
        Ok((config, step))
    }
}

fn analyzer(config: &AppConfig) -> Arc<Analyzer> {
    Arc::new(Analyzer::new(&config.analyzer))
}

/// Handles the `index` step.
fn run_index(config: &AppConfig) -> Result<()> {
    let count = IndexUseCase::new(config, analyzer(config)).execute()?;
    println!("Indexed {} documents into '{}'.", count, config.index_dir.display());
    Ok(())
}

/// Handles the `search` step.
fn run_search(config: &AppConfig) -> Result<()> {
    let summary = QueryUseCase::open(config, analyzer(config))?.execute()?;
    println!(
        "Ran {} queries ({} skipped), {} hits; results in '{}'.",
        summary.queries_processed,
        summary.skipped,
        summary.hits_written,
        config.output_dir.display()
    );
    Ok(())
}

// ============================================================
// Layer 6: Run Writer
// ============================================================
// Writes ranked results in TREC run format, one file per
// ranking strategy, so they can be fed to trec_eval.
//
// Line format:
//   {run_index} Q0 {doc_id} {rank} {score} {strategy}
//
//   run_index  the orchestrator's sequential query counter
//              (1, 2, 3, ...), not the query's own id
//   rank       1-based position in the hit list
//   score      6 decimal places
//
// Output files (truncated when the writer is created):
//   results/vsm.run
//   results/bm25.run
//
// Example:
//   1 Q0 184 1 12.403718 bm25
//   1 Q0 29 2 11.962140 bm25
//
// Reference: Rust Book §12 (I/O and File Handling)

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::domain::error::{Error, Result};
use crate::domain::query::SearchHit;
use crate::domain::traits::RunSink;

struct RunFile {
    path:   PathBuf,
    writer: BufWriter<File>,
}

/// Owns one buffered file per strategy name.
pub struct RunWriter {
    dir:   PathBuf,
    files: BTreeMap<String, RunFile>,
    lines: usize,
}

impl RunWriter {
    /// Create `dir` if needed and truncate a run file for each strategy.
    pub fn create<S: AsRef<str>>(dir: impl Into<PathBuf>, strategies: &[S]) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

        let mut files = BTreeMap::new();
        for name in strategies {
            let name = name.as_ref();
            let path = run_path(&dir, name);
            let file = File::create(&path).map_err(|e| Error::io(&path, e))?;
            tracing::debug!("Created run file '{}'", path.display());
            files.insert(name.to_string(), RunFile { path, writer: BufWriter::new(file) });
        }

        Ok(Self { dir, files, lines: 0 })
    }

    /// Total result lines written so far across all files.
    pub fn lines_written(&self) -> usize {
        self.lines
    }

    /// Path of the run file for `strategy`.
    pub fn path_for(&self, strategy: &str) -> PathBuf {
        run_path(&self.dir, strategy)
    }

    /// Flush every file. Dropping the writer without calling this
    /// still closes the files, but write errors would go unreported.
    pub fn finish(mut self) -> Result<()> {
        for file in self.files.values_mut() {
            file.writer.flush().map_err(|e| Error::io(&file.path, e))?;
        }
        Ok(())
    }
}

impl RunSink for RunWriter {
    fn write_hits(&mut self, run_index: usize, strategy: &str, hits: &[SearchHit]) -> Result<()> {
        let file = self.files.get_mut(strategy).ok_or_else(|| Error::SearchEngine {
            strategy: strategy.to_string(),
            query_id: None,
            message:  "no run file opened for this strategy".to_string(),
        })?;

        for (rank, hit) in hits.iter().enumerate() {
            writeln!(
                file.writer,
                "{} Q0 {} {} {:.6} {}",
                run_index,
                hit.doc_id,
                rank + 1,
                hit.score,
                strategy,
            )
            .map_err(|e| Error::io(&file.path, e))?;
        }
        self.lines += hits.len();
        Ok(())
    }
}

fn run_path(dir: &Path, strategy: &str) -> PathBuf {
    dir.join(format!("{strategy}.run"))
}

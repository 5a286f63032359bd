//! Directory batch runs: load every comment file and write its text and rated CSV exports.

use crate::concurrency::map_files_limited;
use crate::engine::CommentEngine;
use crate::error::EngineError;
use crate::paths::csv_stem;
use crate::progress::ProgressScope;
use crate::util::init_tracing_once;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Files written for one input.
#[derive(Clone, Debug)]
pub struct BatchOutput {
    pub text: PathBuf,
    pub csv: PathBuf,
    pub comments: usize,
    pub warnings: usize,
}

/// Per-input result; a failed file does not stop the others.
#[derive(Debug)]
pub struct BatchOutcome {
    pub input: PathBuf,
    pub result: std::result::Result<BatchOutput, EngineError>,
}

impl CommentEngine {
    /// Load each input and write `<stem>.txt` and `<stem>.rated.csv` into `out_dir`,
    /// with at most `file_concurrency` files in flight.
    pub fn export_batch(&self, inputs: &[PathBuf], out_dir: &Path) -> Result<Vec<BatchOutcome>> {
        init_tracing_once();
        if let Some(n) = self.opts.parallelism {
            if n > 0 {
                rayon::ThreadPoolBuilder::new().num_threads(n).build_global().ok();
            }
        }
        fs::create_dir_all(out_dir).with_context(|| format!("create {}", out_dir.display()))?;

        let label = self.opts.progress_label.as_deref().unwrap_or("Exporting");
        let pb = ProgressScope::count(self.opts.progress, label, inputs.len() as u64);

        let outcomes = map_files_limited(inputs, self.opts.file_concurrency, |input| {
            let result = self.export_one(input, out_dir);
            if let Err(e) = &result {
                tracing::warn!(path = %input.display(), error = %e, "batch input failed");
            }
            pb.inc(1);
            BatchOutcome { input: input.clone(), result }
        });

        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        pb.finish(format!("{label} done ({failed} failed)"));
        tracing::info!(files = outcomes.len(), failed, "batch finished");
        Ok(outcomes)
    }

    fn export_one(&self, input: &Path, out_dir: &Path) -> std::result::Result<BatchOutput, EngineError> {
        let stem = csv_stem(input).unwrap_or_else(|| "comments".to_string());
        let loaded = self.load(input)?;
        let text = out_dir.join(format!("{stem}.txt"));
        let csv = out_dir.join(format!("{stem}.rated.csv"));
        self.export_text(&loaded.store, &text)?;
        self.export_csv(&loaded.store, &csv)?;
        Ok(BatchOutput { text, csv, comments: loaded.store.len(), warnings: loaded.warnings.len() })
    }
}

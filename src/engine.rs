use crate::config::EngineOptions;
use crate::date::TimestampPolicy;
use crate::error::{ParseWarning, Result};
use crate::export;
use crate::query::{self, FilterPolicy, FilteredView, SortSpec, StoreView, ThreadRow};
use crate::rating::classify;
use crate::source::{read_table, RawTable};
use crate::store::CommentStore;
use crate::util::init_tracing_once;
use std::path::{Path, PathBuf};

/// A freshly built and classified store with the warnings produced while building it.
#[derive(Clone, Debug)]
pub struct Loaded {
    pub source: PathBuf,
    pub store: CommentStore,
    pub warnings: Vec<ParseWarning>,
}

/// Entry point: holds options and runs load/query/export over explicit stores.
#[derive(Clone, Debug, Default)]
pub struct CommentEngine {
    pub(crate) opts: EngineOptions,
}

impl CommentEngine {
    pub fn new() -> Self {
        Self { opts: EngineOptions::default() }
    }

    pub fn with_options(opts: EngineOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.opts
    }

    // -------- Builder methods --------
    pub fn timestamp_policy(mut self, p: TimestampPolicy) -> Self { self.opts = self.opts.with_timestamp_policy(p); self }
    pub fn filter_policy(mut self, p: FilterPolicy) -> Self { self.opts = self.opts.with_filter_policy(p); self }
    pub fn sort(mut self, sort: SortSpec) -> Self { self.opts = self.opts.with_sort(sort); self }
    pub fn pretty_json(mut self, yes: bool) -> Self { self.opts = self.opts.with_pretty_json(yes); self }
    pub fn file_concurrency(mut self, n: usize) -> Self { self.opts = self.opts.with_file_concurrency(n); self }
    pub fn parallelism(mut self, threads: usize) -> Self { self.opts = self.opts.with_parallelism(threads); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn progress_label(mut self, label: impl Into<String>) -> Self { self.opts = self.opts.with_progress_label(label); self }
    pub fn io_buffers(mut self, read_bytes: usize, write_bytes: usize) -> Self { self.opts = self.opts.with_io_buffers(read_bytes, write_bytes); self }

    // -------- Load --------

    /// Read, build and classify `path`. Nothing is returned unless every step succeeds.
    pub fn load(&self, path: &Path) -> Result<Loaded> {
        init_tracing_once();
        let table = read_table(path, self.opts.read_buffer_bytes)?;
        let (store, warnings) = self.build(&table)?;
        tracing::info!(
            path = %path.display(),
            comments = store.len(),
            warnings = warnings.len(),
            op = store.original_poster().unwrap_or("-"),
            "loaded comments"
        );
        for w in &warnings {
            tracing::debug!(%w, "parse warning");
        }
        Ok(Loaded { source: path.to_path_buf(), store, warnings })
    }

    /// Build and classify an already parsed table.
    pub fn build(&self, table: &RawTable) -> Result<(CommentStore, Vec<ParseWarning>)> {
        let (mut store, warnings) = CommentStore::build(table)?;
        classify(&mut store);
        Ok((store, warnings))
    }

    // -------- Queries --------

    pub fn filter<'a>(&self, store: &'a CommentStore, query: &str) -> Result<FilteredView<'a>> {
        query::filter(store, query, self.opts.filter_policy)
    }

    pub fn rows<'a, V: StoreView + ?Sized>(&self, view: &'a V) -> Result<Vec<ThreadRow<'a>>> {
        query::thread_rows(view, self.opts.sort)
    }

    // -------- Exports --------

    pub fn export_text<V: StoreView + ?Sized>(&self, view: &V, dest: &Path) -> Result<()> {
        export::export_text(view, dest, self.opts.sort, self.opts.timestamp_policy, self.opts.write_buffer_bytes)
    }

    pub fn export_csv<V: StoreView + ?Sized>(&self, view: &V, dest: &Path) -> Result<()> {
        export::export_csv(view, dest, self.opts.timestamp_policy, self.opts.write_buffer_bytes)
    }

    pub fn export_json<V: StoreView + ?Sized>(&self, view: &V, dest: &Path) -> Result<()> {
        export::export_json(
            view,
            dest,
            self.opts.sort,
            self.opts.timestamp_policy,
            self.opts.pretty_json,
            self.opts.write_buffer_bytes,
        )
    }
}

use crate::date::TimestampPolicy;
use crate::query::{FilterPolicy, SortSpec};

/// Options shared by load, query, export and batch runs. Every field has a `with_*` setter.
#[derive(Clone, Debug)]
pub struct EngineOptions {
    pub timestamp_policy: TimestampPolicy,
    pub filter_policy: FilterPolicy,
    pub sort: SortSpec,               // current top-level order, also used by exports
    pub pretty_json: bool,

    pub file_concurrency: usize,      // batch: files processed at once
    pub parallelism: Option<usize>,   // rayon worker threads for batch runs; None keeps rayon's default
    pub progress: bool,               // draw indicatif bars on stderr
    pub progress_label: Option<String>,

    // buffer sizes for input files and exports, at least 8 KiB each
    pub read_buffer_bytes: usize,
    pub write_buffer_bytes: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            timestamp_policy: TimestampPolicy::Strict,
            filter_policy: FilterPolicy::Flat,
            sort: SortSpec::default(),
            pretty_json: true,

            file_concurrency: 1,
            parallelism: None,
            progress: false,
            progress_label: None,

            read_buffer_bytes: 256 * 1024,
            write_buffer_bytes: 256 * 1024,
        }
    }
}

impl EngineOptions {
    pub fn with_timestamp_policy(mut self, policy: TimestampPolicy) -> Self {
        self.timestamp_policy = policy;
        self
    }
    pub fn with_filter_policy(mut self, policy: FilterPolicy) -> Self {
        self.filter_policy = policy;
        self
    }
    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }
    pub fn with_pretty_json(mut self, yes: bool) -> Self {
        self.pretty_json = yes;
        self
    }
    pub fn with_file_concurrency(mut self, n: usize) -> Self {
        self.file_concurrency = n.max(1);
        self
    }
    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads);
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_progress_label(mut self, label: impl Into<String>) -> Self {
        self.progress_label = Some(label.into());
        self
    }
    pub fn with_io_buffers(mut self, read_bytes: usize, write_bytes: usize) -> Self {
        self.read_buffer_bytes = read_bytes.max(8 * 1024);
        self.write_buffer_bytes = write_bytes.max(8 * 1024);
        self
    }
}

mod config;
mod date;
mod error;
mod model;
mod source;
mod util;

mod store;
mod rating;
mod query;
mod export;

mod engine;
mod session;

mod paths;
mod progress;
mod concurrency;
mod batch;

pub use crate::config::EngineOptions;
pub use crate::date::{normalize_timestamp, parse_create_time, TimestampPolicy, INVALID_TIME, UNKNOWN_TIME};
pub use crate::error::{missing_video_ids, EngineError, ParseWarning, Result};
pub use crate::model::{Comment, Rating, EXPORT_COLUMNS, MISSING_VIDEO_ID, REQUIRED_COLUMNS};
pub use crate::source::{decode_text, parse_csv, read_table, RawTable};

pub use crate::store::CommentStore;
pub use crate::rating::{classify, identify_op, tier_for_counts};
pub use crate::query::{
    filter, matches_query, thread_rows, top_level, FilterPolicy, FilteredView, SortKey, SortSpec, StoreView, ThreadRow,
};
pub use crate::export::{json_tree, write_csv, write_text, JsonNode};

pub use crate::engine::{CommentEngine, Loaded};
pub use crate::session::{EngineEvents, ExportKind, NoEvents, Session};

// batch helpers for the binary and directory runs
pub use crate::batch::{BatchOutcome, BatchOutput};
pub use crate::paths::{csv_stem, discover_csv_files};
pub use crate::progress::{make_spinner, ProgressScope};
pub use crate::util::init_tracing_once;

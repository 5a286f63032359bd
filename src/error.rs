//! Error taxonomy for load/query/export, plus the non-fatal per-row warnings
//! that are returned as data alongside a built store.

use serde::Serialize;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors. Each aborts only the operation that raised it; a store that
/// was already published is never touched.
#[derive(Error, Debug)]
pub enum EngineError {
    /// One or more of the required columns is absent from the header row.
    #[error("{source_name}: missing required columns: {}", missing.join(", "))]
    Schema { source_name: String, missing: Vec<String> },

    /// Neither UTF-8 nor the GBK fallback decodes the file.
    #[error("{source_name}: content is neither valid UTF-8 nor GBK")]
    Encoding { source_name: String },

    /// Malformed CSV structure, e.g. a record with more cells than the header.
    #[error("{source_name}: malformed CSV at line {line}: {detail}")]
    Csv { source_name: String, line: u64, detail: String },

    /// A parent chain loops back on itself while walking the tree.
    #[error("cycle detected in reply chain at comment {id}")]
    CycleDetected { id: String },

    #[error("{}: {error}", path.display())]
    Io { path: PathBuf, #[source] error: io::Error },

    /// Another load/refresh/export is already running on this session.
    #[error("another load, refresh or export is already in progress")]
    Busy,

    /// Refresh or export requested before any successful load.
    #[error("no comment file has been loaded")]
    NothingLoaded,
}

impl EngineError {
    pub(crate) fn io(path: impl Into<PathBuf>, error: io::Error) -> Self {
        EngineError::Io { path: path.into(), error }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Non-fatal per-row anomalies collected while building a store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseWarning {
    /// `create_time` did not parse; the row was skipped.
    DroppedRow { row: usize, create_time: String },
    /// Blank `video_id`, replaced with `N/A`.
    MissingVideoId { id: String },
    /// A repeated `comment_id` was stored under a new id.
    DuplicateId { original: String, rewritten: String },
    /// The comment sits on a parent cycle and is unreachable from any top-level comment.
    Unreachable { id: String },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::DroppedRow { row, create_time } => {
                write!(f, "row {row}: unparseable create_time {create_time:?}, row dropped")
            }
            ParseWarning::MissingVideoId { id } => write!(f, "comment {id}: missing video_id, set to N/A"),
            ParseWarning::DuplicateId { original, rewritten } => {
                write!(f, "duplicate comment_id {original} stored as {rewritten}")
            }
            ParseWarning::Unreachable { id } => write!(f, "comment {id}: parent chain forms a cycle"),
        }
    }
}

/// Ids whose `video_id` was defaulted, in row order.
pub fn missing_video_ids(warnings: &[ParseWarning]) -> Vec<&str> {
    warnings
        .iter()
        .filter_map(|w| match w {
            ParseWarning::MissingVideoId { id } => Some(id.as_str()),
            _ => None,
        })
        .collect()
}

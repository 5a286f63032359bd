use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Columns every input file must carry (order irrelevant).
pub const REQUIRED_COLUMNS: [&str; 10] = [
    "comment_id",
    "parent_comment_id",
    "create_time",
    "video_id",
    "content",
    "user_id",
    "nickname",
    "avatar",
    "sub_comment_count",
    "last_modify_ts",
];

/// Column order of the flat CSV export.
pub const EXPORT_COLUMNS: [&str; 11] = [
    "comment_id",
    "parent_comment_id",
    "create_time",
    "video_id",
    "content",
    "user_id",
    "nickname",
    "avatar",
    "sub_comment_count",
    "last_modify_ts",
    "rating",
];

pub const MISSING_VIDEO_ID: &str = "N/A";

/// Engagement tier. Declaration order is the display/sort rank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rating {
    A1,
    A2,
    B1,
    B2,
    B3,
    C1,
    C2,
    C3,
    D,
}

impl Rating {
    pub const ALL: [Rating; 9] = [
        Rating::A1,
        Rating::A2,
        Rating::B1,
        Rating::B2,
        Rating::B3,
        Rating::C1,
        Rating::C2,
        Rating::C3,
        Rating::D,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Rating::A1 => "A1",
            Rating::A2 => "A2",
            Rating::B1 => "B1",
            Rating::B2 => "B2",
            Rating::B3 => "B3",
            Rating::C1 => "C1",
            Rating::C2 => "C2",
            Rating::C3 => "C3",
            Rating::D => "D",
        }
    }

    /// 1-based tier rank; unrated comments rank after every tier.
    pub fn rank(rating: Option<Rating>) -> u8 {
        match rating {
            Some(r) => r as u8 + 1,
            None => 100,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rating::ALL
            .iter()
            .copied()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown rating {s:?}"))
    }
}

/// One stored comment. Opaque fields are carried through unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub id: String,
    pub parent_id: String,
    /// Epoch value; seconds vs. milliseconds is decided at display time.
    pub create_time: i64,
    pub video_ref: String,
    pub content: String,
    pub author_id: String,
    pub author_name: String,
    pub avatar_ref: String,
    pub declared_reply_count: String,
    pub last_modified: String,
    pub rating: Option<Rating>,
}

impl Comment {
    /// `sub_comment_count` as a number; non-numeric or missing counts are 0.
    pub fn declared_replies(&self) -> u64 {
        self.declared_reply_count.trim().parse().unwrap_or(0)
    }

    pub fn rating_label(&self) -> &'static str {
        self.rating.map(Rating::as_str).unwrap_or("")
    }
}

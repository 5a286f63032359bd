//! The comment store: id → comment mapping plus the parent → children reply index.
//! Rebuilt wholesale on every load; never mutated after classification.

use crate::date::parse_create_time;
use crate::error::{ParseWarning, Result};
use crate::model::{Comment, Rating, MISSING_VIDEO_ID};
use crate::source::RawTable;
use ahash::{AHashMap, AHashSet};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default)]
pub struct CommentStore {
    comments: Vec<Comment>,
    by_id: AHashMap<String, usize>,
    replies: AHashMap<String, Vec<usize>>,
    op: Option<String>,
}

impl CommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an (unrated) store from a parsed table.
    ///
    /// The schema is checked once up front; a missing column fails the whole build.
    /// Rows with an unparseable `create_time` are dropped, repeated ids are rewritten
    /// to `{id}_{row}` and blank `video_id`s become `N/A`. Each is reported as a warning.
    pub fn build(table: &RawTable) -> Result<(CommentStore, Vec<ParseWarning>)> {
        let [c_id, c_parent, c_time, c_video, c_content, c_user, c_nick, c_avatar, c_subs, c_modify] =
            table.column_index()?;

        let mut store = CommentStore::new();
        let mut warnings = Vec::new();

        for (row, rec) in table.records.iter().enumerate() {
            let cell = |i: usize| rec.get(i).map(String::as_str).unwrap_or_default();

            let Some(create_time) = parse_create_time(cell(c_time)) else {
                warnings.push(ParseWarning::DroppedRow { row, create_time: cell(c_time).to_string() });
                continue;
            };

            let original = cell(c_id).to_string();
            let mut id = original.clone();
            if store.by_id.contains_key(&id) {
                while store.by_id.contains_key(&id) {
                    id = format!("{id}_{row}");
                }
                warnings.push(ParseWarning::DuplicateId { original, rewritten: id.clone() });
            }

            let mut video_ref = cell(c_video).trim().to_string();
            if video_ref.is_empty() {
                warnings.push(ParseWarning::MissingVideoId { id: id.clone() });
                video_ref = MISSING_VIDEO_ID.to_string();
            }

            store.insert(Comment {
                id,
                parent_id: cell(c_parent).to_string(),
                create_time,
                video_ref,
                content: cell(c_content).to_string(),
                author_id: cell(c_user).to_string(),
                author_name: cell(c_nick).to_string(),
                avatar_ref: cell(c_avatar).to_string(),
                declared_reply_count: cell(c_subs).to_string(),
                last_modified: cell(c_modify).to_string(),
                rating: None,
            });
        }

        for children in store.replies.values_mut() {
            // stable: equal timestamps keep row order
            children.sort_by_key(|&i| store.comments[i].create_time);
        }

        for id in store.unreachable_ids() {
            warnings.push(ParseWarning::Unreachable { id });
        }

        tracing::debug!(comments = store.len(), warnings = warnings.len(), source = %table.source_name, "built comment store");
        Ok((store, warnings))
    }

    fn insert(&mut self, comment: Comment) {
        let idx = self.comments.len();
        self.by_id.insert(comment.id.clone(), idx);
        self.replies.entry(comment.parent_id.clone()).or_default().push(idx);
        self.comments.push(comment);
    }

    /// Comments that no walk from a top-level comment reaches (they sit on a parent cycle).
    fn unreachable_ids(&self) -> Vec<String> {
        let mut seen: AHashSet<usize> = AHashSet::with_capacity(self.comments.len());
        let mut stack: Vec<usize> = (0..self.comments.len())
            .filter(|&i| self.is_top_level(&self.comments[i]))
            .collect();
        while let Some(i) = stack.pop() {
            if !seen.insert(i) {
                continue;
            }
            stack.extend(self.reply_indices(&self.comments[i].id).iter().copied());
        }
        if seen.len() == self.comments.len() {
            return Vec::new();
        }
        self.comments
            .iter()
            .enumerate()
            .filter(|(i, _)| !seen.contains(i))
            .map(|(_, c)| c.id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Comment> {
        self.by_id.get(id).map(|&i| &self.comments[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Comments in insertion (row) order.
    pub fn iter(&self) -> std::slice::Iter<'_, Comment> {
        self.comments.iter()
    }

    pub(crate) fn comment_at(&self, idx: usize) -> &Comment {
        &self.comments[idx]
    }

    pub(crate) fn position(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub(crate) fn reply_indices(&self, id: &str) -> &[usize] {
        self.replies.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn reply_entries(&self) -> impl Iterator<Item = (&str, &[usize])> + '_ {
        self.replies.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Direct replies to `id`, ascending by `create_time`.
    pub fn replies(&self, id: &str) -> impl Iterator<Item = &Comment> + '_ {
        self.reply_indices(id).iter().map(move |&i| &self.comments[i])
    }

    /// Parent ids with at least one reply, including ids absent from the store.
    pub fn reply_index_len(&self) -> usize {
        self.replies.len()
    }

    /// A comment is top-level when no stored comment carries its parent id.
    pub fn is_top_level(&self, comment: &Comment) -> bool {
        !self.by_id.contains_key(&comment.parent_id)
    }

    /// Top-level comments in insertion order.
    pub fn top_level(&self) -> impl Iterator<Item = &Comment> + '_ {
        self.comments.iter().filter(move |c| self.is_top_level(c))
    }

    /// Author id assumed to be the original poster; see [`crate::rating::identify_op`].
    pub fn original_poster(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub(crate) fn set_original_poster(&mut self, op: Option<String>) {
        self.op = op;
    }

    pub(crate) fn comments_mut(&mut self) -> &mut [Comment] {
        &mut self.comments
    }

    /// Count of comments per tier; unrated comments are not counted.
    pub fn rating_histogram(&self) -> BTreeMap<Rating, usize> {
        let mut m = BTreeMap::new();
        for r in self.comments.iter().filter_map(|c| c.rating) {
            *m.entry(r).or_insert(0) += 1;
        }
        m
    }
}

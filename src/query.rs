//! Tree queries over a store or a filtered overlay: top-level ordering, free-text
//! filtering and the flattened thread walk used by renderers and exporters.

use crate::error::{EngineError, Result};
use crate::model::{Comment, Rating};
use crate::store::CommentStore;
use ahash::{AHashMap, AHashSet};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Column the top-level list is ordered by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SortKey {
    Id,
    Author,
    Content,
    Time,
    /// Direct replies visible in the view being sorted (the displayed count).
    ReplyCount,
    /// `sub_comment_count` as declared in the file; non-numeric counts as 0.
    DeclaredReplies,
    Rating,
}

impl FromStr for SortKey {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "id" | "comment_id" => Ok(SortKey::Id),
            "author" | "user" | "nickname" => Ok(SortKey::Author),
            "content" => Ok(SortKey::Content),
            "time" | "create_time" => Ok(SortKey::Time),
            "replies" | "reply-count" | "reply_count" => Ok(SortKey::ReplyCount),
            "declared" | "declared-replies" | "sub_comment_count" => Ok(SortKey::DeclaredReplies),
            "rating" => Ok(SortKey::Rating),
            other => Err(format!("unknown sort key {other:?}")),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortKey::Id => "id",
            SortKey::Author => "author",
            SortKey::Content => "content",
            SortKey::Time => "time",
            SortKey::ReplyCount => "reply-count",
            SortKey::DeclaredReplies => "declared-replies",
            SortKey::Rating => "rating",
        };
        f.write_str(s)
    }
}

/// Sort key plus direction. Applies to the top-level list only; replies stay
/// in chronological order at every depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub descending: bool,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self { key: SortKey::Time, descending: false }
    }
}

impl SortSpec {
    pub fn new(key: SortKey, descending: bool) -> Self {
        Self { key, descending }
    }
    pub fn ascending(key: SortKey) -> Self {
        Self::new(key, false)
    }
    pub fn descending(key: SortKey) -> Self {
        Self::new(key, true)
    }
}

/// How a filter treats matched replies whose parent did not match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilterPolicy {
    /// Keep only matching comments. A matched reply under an unmatched parent
    /// loses its ancestor path and surfaces as a top-level entry of the overlay.
    #[default]
    Flat,
    /// Also keep every ancestor of a matching comment so matches stay in place.
    KeepAncestors,
}

/// Read-only surface shared by the base store and filter overlays.
pub trait StoreView {
    fn base(&self) -> &CommentStore;

    /// Member positions in insertion order.
    fn member_indices(&self) -> Box<dyn Iterator<Item = usize> + '_>;

    fn contains_id(&self, id: &str) -> bool;

    /// Children of `id` within this view, ascending by `create_time`.
    fn child_indices(&self, id: &str) -> &[usize];

    /// Number of parent ids with at least one visible reply.
    fn reply_index_len(&self) -> usize;

    fn comments(&self) -> Box<dyn Iterator<Item = &Comment> + '_> {
        Box::new(self.member_indices().map(move |i| self.base().comment_at(i)))
    }

    fn is_top_level(&self, comment: &Comment) -> bool {
        !self.contains_id(&comment.parent_id)
    }

    /// Direct reply count as seen by this view.
    fn reply_count(&self, id: &str) -> usize {
        self.child_indices(id).len()
    }
}

impl StoreView for CommentStore {
    fn base(&self) -> &CommentStore {
        self
    }
    fn member_indices(&self) -> Box<dyn Iterator<Item = usize> + '_> {
        Box::new(0..self.len())
    }
    fn contains_id(&self, id: &str) -> bool {
        self.contains(id)
    }
    fn child_indices(&self, id: &str) -> &[usize] {
        self.reply_indices(id)
    }
    fn reply_index_len(&self) -> usize {
        CommentStore::reply_index_len(self)
    }
}

/// Overlay produced by [`filter`]: a reduced membership and reply index over an
/// untouched base store.
#[derive(Clone, Debug)]
pub struct FilteredView<'a> {
    store: &'a CommentStore,
    members: Vec<usize>,
    member_ids: AHashSet<&'a str>,
    replies: AHashMap<&'a str, Vec<usize>>,
}

impl<'a> FilteredView<'a> {
    fn from_members(store: &'a CommentStore, mut members: Vec<usize>) -> Self {
        members.sort_unstable();
        members.dedup();
        let keep: AHashSet<usize> = members.iter().copied().collect();
        let member_ids = members.iter().map(|&i| store.comment_at(i).id.as_str()).collect();

        let mut replies: AHashMap<&'a str, Vec<usize>> = AHashMap::new();
        for (parent, children) in store.reply_entries() {
            let kept: Vec<usize> = children.iter().copied().filter(|i| keep.contains(i)).collect();
            if !kept.is_empty() {
                replies.insert(parent, kept);
            }
        }
        Self { store, members, member_ids, replies }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl StoreView for FilteredView<'_> {
    fn base(&self) -> &CommentStore {
        self.store
    }
    fn member_indices(&self) -> Box<dyn Iterator<Item = usize> + '_> {
        Box::new(self.members.iter().copied())
    }
    fn contains_id(&self, id: &str) -> bool {
        self.member_ids.contains(id)
    }
    fn child_indices(&self, id: &str) -> &[usize] {
        self.replies.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
    fn reply_index_len(&self) -> usize {
        self.replies.len()
    }
}

/// Does `comment` match an already lowercased query?
pub fn matches_query(comment: &Comment, query_lower: &str) -> bool {
    comment.author_name.to_lowercase().contains(query_lower)
        || comment.content.to_lowercase().contains(query_lower)
}

/// Case-insensitive substring filter on author name and content.
///
/// A blank query keeps every comment, so the overlay equals the base store.
pub fn filter<'a>(store: &'a CommentStore, query: &str, policy: FilterPolicy) -> Result<FilteredView<'a>> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return Ok(FilteredView::from_members(store, (0..store.len()).collect()));
    }

    let matched: Vec<usize> = (0..store.len())
        .filter(|&i| matches_query(store.comment_at(i), &q))
        .collect();

    let members = match policy {
        FilterPolicy::Flat => matched,
        FilterPolicy::KeepAncestors => with_ancestors(store, matched)?,
    };

    let view = FilteredView::from_members(store, members);
    tracing::debug!(query = %q, policy = ?policy, kept = view.len(), "filtered comments");
    Ok(view)
}

fn with_ancestors(store: &CommentStore, matched: Vec<usize>) -> Result<Vec<usize>> {
    let mut included: AHashSet<usize> = matched.iter().copied().collect();
    // nodes whose whole ancestor chain is known to end at a top-level comment
    let mut rooted: AHashSet<usize> = AHashSet::new();
    for &m in &matched {
        let mut path: Vec<usize> = vec![m];
        let mut on_path: AHashSet<usize> = AHashSet::from_iter([m]);
        let mut cur = store.comment_at(m);
        while let Some(p) = store.position(&cur.parent_id) {
            if rooted.contains(&p) {
                break;
            }
            if !on_path.insert(p) {
                return Err(EngineError::CycleDetected { id: store.comment_at(p).id.clone() });
            }
            path.push(p);
            included.insert(p);
            cur = store.comment_at(p);
        }
        rooted.extend(path);
    }
    Ok(included.into_iter().collect())
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SortValue {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

fn sort_value<V: StoreView + ?Sized>(view: &V, c: &Comment, key: SortKey) -> SortValue {
    match key {
        SortKey::Id => SortValue::Text(c.id.to_lowercase()),
        SortKey::Author => SortValue::Text(c.author_name.to_lowercase()),
        SortKey::Content => SortValue::Text(c.content.to_lowercase()),
        SortKey::Time => SortValue::Signed(c.create_time),
        SortKey::ReplyCount => SortValue::Unsigned(view.reply_count(&c.id) as u64),
        SortKey::DeclaredReplies => SortValue::Unsigned(c.declared_replies()),
        SortKey::Rating => SortValue::Unsigned(u64::from(Rating::rank(c.rating))),
    }
}

/// Top-level member positions, stably ordered by `sort` (ties keep insertion order
/// in both directions).
pub fn top_level_indices<V: StoreView + ?Sized>(view: &V, sort: SortSpec) -> Vec<usize> {
    let base = view.base();
    let mut keyed: Vec<(SortValue, usize)> = view
        .member_indices()
        .filter(|&i| view.is_top_level(base.comment_at(i)))
        .map(|i| (sort_value(view, base.comment_at(i), sort.key), i))
        .collect();
    keyed.sort_by(|a, b| {
        let ord: Ordering = a.0.cmp(&b.0);
        if sort.descending { ord.reverse() } else { ord }
    });
    keyed.into_iter().map(|(_, i)| i).collect()
}

pub fn top_level<V: StoreView + ?Sized>(view: &V, sort: SortSpec) -> Vec<&Comment> {
    top_level_indices(view, sort)
        .into_iter()
        .map(|i| view.base().comment_at(i))
        .collect()
}

/// One line of a rendered thread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThreadRow<'a> {
    /// 0 for top-level comments.
    pub depth: usize,
    /// 1-based position among its siblings.
    pub sibling_index: usize,
    pub comment: &'a Comment,
    pub reply_count: usize,
}

/// Pre-order walk of every top-level comment and its replies.
///
/// Iterative, with a visited set: reaching a comment twice fails with
/// `CycleDetected` instead of looping, and so does a view member that no
/// top-level comment leads to (it sits on a parent cycle).
pub fn thread_rows<V: StoreView + ?Sized>(view: &V, sort: SortSpec) -> Result<Vec<ThreadRow<'_>>> {
    let base = view.base();
    let mut rows = Vec::new();
    let mut visited: AHashSet<usize> = AHashSet::new();
    let mut stack: Vec<(usize, usize, usize)> = Vec::new();

    for (n, root) in top_level_indices(view, sort).into_iter().enumerate() {
        stack.push((root, 0, n + 1));
        while let Some((i, depth, sibling_index)) = stack.pop() {
            let comment = base.comment_at(i);
            if !visited.insert(i) {
                return Err(EngineError::CycleDetected { id: comment.id.clone() });
            }
            let children = view.child_indices(&comment.id);
            rows.push(ThreadRow { depth, sibling_index, comment, reply_count: children.len() });
            for (k, &child) in children.iter().enumerate().rev() {
                stack.push((child, depth + 1, k + 1));
            }
        }
    }
    if let Some(stranded) = view.member_indices().find(|i| !visited.contains(i)) {
        return Err(EngineError::CycleDetected { id: base.comment_at(stranded).id.clone() });
    }
    Ok(rows)
}

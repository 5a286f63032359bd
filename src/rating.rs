//! Engagement-tier classification.

use crate::model::Rating;
use crate::store::CommentStore;

/// Guess the original poster: the author of the first top-level comment in row order.
///
/// This is a heuristic. Nothing in the input marks the poster explicitly, so a file
/// whose first top-level row was written by someone else yields the wrong identity.
pub fn identify_op(store: &CommentStore) -> Option<String> {
    store.top_level().next().map(|c| c.author_id.clone())
}

/// Tier for a non-OP comment from its direct reply count and grandchild count.
pub fn tier_for_counts(second: usize, third: usize) -> Rating {
    match second {
        0 => Rating::D,
        1..=9 if third > 0 => Rating::B1,
        1..=9 => Rating::C1,
        10..=100 if third >= 10 => Rating::B2,
        10..=100 => Rating::C2,
        _ if third >= 100 => Rating::B3,
        _ => Rating::C3,
    }
}

/// Assign a tier to every comment in the store and record the OP.
///
/// Each comment is rated independently from its own reply counts; the only
/// tree-position input is whether an OP comment is top-level (A1) or nested (A2).
pub fn classify(store: &mut CommentStore) {
    let op = identify_op(store);

    let ratings: Vec<Rating> = store
        .iter()
        .map(|c| {
            if op.as_deref() == Some(c.author_id.as_str()) {
                return if store.is_top_level(c) { Rating::A1 } else { Rating::A2 };
            }
            let children = store.reply_indices(&c.id);
            let third: usize = children
                .iter()
                .map(|&i| store.reply_indices(&store.comment_at(i).id).len())
                .sum();
            tier_for_counts(children.len(), third)
        })
        .collect();

    for (c, r) in store.comments_mut().iter_mut().zip(ratings) {
        c.rating = Some(r);
    }

    tracing::debug!(op = ?op, comments = store.len(), "classified comments");
    store.set_original_poster(op);
}

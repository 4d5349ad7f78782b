//! Rebuilding nested reply trees from stored comment rows.

use std::collections::VecDeque;

use anyhow::Result;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::{self, Comment, Thread};

/// A stored comment with its replies nested under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedComment {
    pub comment_id: Option<String>,
    pub author: String,
    pub content: String,
    pub timestamp: i64,
    pub score: i64,
    /// Replies below this comment were archived as a continuation thread.
    pub continues: bool,
    pub replies: Vec<RenderedComment>,
}

impl RenderedComment {
    fn new(comment: Comment, replies: Vec<Self>) -> Self {
        Self {
            comment_id: comment.comment_id,
            author: comment.author,
            content: comment.content,
            timestamp: comment.timestamp,
            score: comment.score,
            continues: comment.continues,
            replies,
        }
    }
}

/// An archived thread ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedThread {
    pub thread: Thread,
    pub replies: Vec<RenderedComment>,
}

struct Slot {
    comment: Comment,
    children: Vec<usize>,
}

/// Load the archive of `thread_id` (or of one of its continuations) as a tree.
///
/// Siblings are ordered by score, highest first. Returns `None` when no such
/// archive exists.
///
/// # Errors
///
/// Returns an error if a query fails.
pub async fn reconstruct(
    pool: &SqlitePool,
    thread_id: &str,
    continuing_reply: &str,
) -> Result<Option<RenderedThread>> {
    let Some(thread) = db::get_thread(pool, thread_id, continuing_reply).await? else {
        return Ok(None);
    };

    // Breadth-first walk; every slot is pushed after its parent, so children
    // always have larger indices.
    let mut arena: Vec<Slot> = Vec::new();
    let mut top_level: Vec<usize> = Vec::new();
    let mut queue: VecDeque<Option<usize>> = VecDeque::from([None]);

    while let Some(parent) = queue.pop_front() {
        let parent_id = parent.map(|index| arena[index].comment.id);
        for comment in db::get_child_comments(pool, thread.id, parent_id).await? {
            let index = arena.len();
            arena.push(Slot {
                comment,
                children: Vec::new(),
            });
            match parent {
                Some(p) => arena[p].children.push(index),
                None => top_level.push(index),
            }
            queue.push_back(Some(index));
        }
    }

    let mut built: Vec<Option<RenderedComment>> =
        std::iter::repeat_with(|| None).take(arena.len()).collect();
    while let Some(slot) = arena.pop() {
        let replies = slot
            .children
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        built[arena.len()] = Some(RenderedComment::new(slot.comment, replies));
    }

    let replies = top_level
        .iter()
        .filter_map(|&index| built[index].take())
        .collect();

    Ok(Some(RenderedThread { thread, replies }))
}

//! Typed view over a Reddit comment listing.
//!
//! The upstream payload is a JSON array of two listings: the first holds the
//! submission, the second the top-level comment forest. Every field is
//! optional in practice, so parsing never fails: anything missing or of the
//! wrong type becomes an empty string or zero, and unparseable input becomes
//! an empty listing.

use std::collections::HashMap;

use serde_json::value::RawValue;
use serde_json::Value;
use tracing::{debug, warn};

use crate::constants::{DEFAULT_MAX_COMMENT_DEPTH, REDDIT_ORIGIN};

/// Kind tag of the placeholder Reddit inserts where replies were cut off.
const MORE_KIND: &str = "more";

/// One JSON object with its members left undecoded.
type Object<'a> = HashMap<String, &'a RawValue>;

/// Fields of the submission at the root of a thread.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootFields {
    pub id: String,
    pub title: String,
    pub body: String,
    pub body_link: String,
    pub author: String,
    pub created: i64,
    pub reply_count: i64,
}

/// One node of the comment forest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentNode {
    pub kind: String,
    pub id: Option<String>,
    pub author: String,
    pub body: String,
    pub created: i64,
    pub score: i64,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// Decode a single node. Its replies are returned undecoded.
    fn decode(raw: &RawValue) -> (Self, Vec<&RawValue>) {
        let node = object(raw);
        let data = node.get("data").copied().map(object).unwrap_or_default();
        let replies = data
            .get("replies")
            .copied()
            .map(listing_children)
            .unwrap_or_default();

        let comment = Self {
            kind: string_field(&node, "kind"),
            id: Some(string_field(&data, "id")).filter(|id| !id.is_empty()),
            author: string_field(&data, "author"),
            body: string_field(&data, "body_html"),
            created: int_field(&data, "created"),
            score: int_field(&data, "score"),
            replies: Vec::new(),
        };
        (comment, replies)
    }
}

/// A parsed thread payload.
#[derive(Debug, Clone, Default)]
pub struct ThreadListing {
    root: RootFields,
    comments: Vec<CommentNode>,
}

impl ThreadListing {
    /// Parse a raw listing payload, keeping comments down to the default
    /// depth ceiling.
    #[must_use]
    pub fn parse(data: &[u8]) -> Self {
        Self::parse_to_depth(data, DEFAULT_MAX_COMMENT_DEPTH)
    }

    /// Parse a raw listing payload, keeping comments nested at most
    /// `max_depth` levels below the top-level forest.
    ///
    /// Nodes at depth `max_depth` are kept without their replies so ingestion
    /// can see where a branch was cut. Decoding walks the payload one level at
    /// a time, so nesting depth never grows the stack.
    #[must_use]
    pub fn parse_to_depth(data: &[u8], max_depth: usize) -> Self {
        let Ok(text) = std::str::from_utf8(data) else {
            warn!("Listing payload is not valid UTF-8");
            return Self::default();
        };
        let top: Vec<&RawValue> = match serde_json::from_str(text) {
            Ok(top) => top,
            Err(e) => {
                warn!(error = %e, "Listing payload is not a JSON array");
                return Self::default();
            }
        };

        let root = top
            .first()
            .and_then(|raw| listing_children(raw).into_iter().next())
            .map(|post| root_fields(&object(post)))
            .unwrap_or_default();
        let comments = top
            .get(1)
            .map(|raw| build_forest(listing_children(raw), max_depth))
            .unwrap_or_default();

        Self { root, comments }
    }

    /// Fields of the root submission.
    #[must_use]
    pub const fn root_fields(&self) -> &RootFields {
        &self.root
    }

    /// Top-level comments, in the order the API returned them.
    #[must_use]
    pub fn comments(&self) -> &[CommentNode] {
        &self.comments
    }
}

/// Direct replies of a node, in source order.
#[must_use]
pub fn children(node: &CommentNode) -> &[CommentNode] {
    &node.replies
}

/// Whether the replies under `node` were cut off and have to be fetched with a
/// continuation request rooted at this node.
#[must_use]
pub fn is_load_more(node: &CommentNode) -> bool {
    node.replies
        .first()
        .is_some_and(|first| first.kind == MORE_KIND)
}

/// Whether a node carries neither author nor body. Such nodes (including the
/// `more` placeholders themselves) are not archivable comments.
#[must_use]
pub fn is_link_only(node: &CommentNode) -> bool {
    node.author.is_empty() && node.body.is_empty()
}

fn root_fields(post: &Object<'_>) -> RootFields {
    let data = post.get("data").copied().map(object).unwrap_or_default();

    let mut body_link = string_field(&data, "url_overridden_by_dest");
    if body_link.starts_with('/') {
        body_link = format!("{REDDIT_ORIGIN}{body_link}");
    }

    RootFields {
        id: string_field(&data, "id"),
        title: string_field(&data, "title"),
        body: string_field(&data, "selftext_html"),
        body_link,
        author: string_field(&data, "author"),
        created: int_field(&data, "created"),
        reply_count: int_field(&data, "num_comments"),
    }
}

/// Decode a comment forest breadth first into a flat arena, then nest it
/// bottom-up.
fn build_forest(top_level: Vec<&RawValue>, max_depth: usize) -> Vec<CommentNode> {
    // (node, parent index); parents always precede their children.
    let mut arena: Vec<(CommentNode, Option<usize>)> = Vec::new();
    let mut pending: Vec<(&RawValue, Option<usize>, usize)> =
        top_level.into_iter().map(|raw| (raw, None, 0)).collect();
    let mut dropped = 0usize;

    while !pending.is_empty() {
        let mut next = Vec::new();
        for (raw, parent, depth) in pending {
            let (node, replies) = CommentNode::decode(raw);
            let index = arena.len();
            arena.push((node, parent));
            if depth < max_depth {
                next.extend(replies.into_iter().map(|raw| (raw, Some(index), depth + 1)));
            } else {
                dropped += replies.len();
            }
        }
        pending = next;
    }

    if dropped > 0 {
        debug!(max_depth, dropped, "Discarded replies below the depth ceiling");
    }

    let mut forest = Vec::new();
    while let Some((mut node, parent)) = arena.pop() {
        // Children were attached last-first.
        node.replies.reverse();
        match parent {
            Some(parent) => arena[parent].0.replies.push(node),
            None => forest.push(node),
        }
    }
    forest.reverse();
    forest
}

/// Members of a JSON object; anything else is treated as empty.
fn object(raw: &RawValue) -> Object<'_> {
    serde_json::from_str(raw.get()).unwrap_or_default()
}

/// `data.children` of a listing; anything else is treated as empty.
fn listing_children(raw: &RawValue) -> Vec<&RawValue> {
    object(raw)
        .get("data")
        .copied()
        .map(object)
        .and_then(|data| data.get("children").copied())
        .and_then(|children| serde_json::from_str(children.get()).ok())
        .unwrap_or_default()
}

/// A scalar member. Nested or malformed values become `Null`.
fn scalar(object: &Object<'_>, key: &str) -> Value {
    object
        .get(key)
        .and_then(|raw| serde_json::from_str(raw.get()).ok())
        .unwrap_or(Value::Null)
}

fn string_field(object: &Object<'_>, key: &str) -> String {
    match scalar(object, key) {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn int_field(object: &Object<'_>, key: &str) -> i64 {
    match scalar(object, key) {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => s
            .parse::<i64>()
            .ok()
            .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
            .unwrap_or(0),
        _ => 0,
    }
}

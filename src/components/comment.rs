//! Rendering of an archived thread and its reply tree.

use std::borrow::Cow;

use maud::{html, Markup, PreEscaped, Render};

use super::format_timestamp;
use crate::archiver::RenderedComment;
use crate::db::Thread;

/// Upstream bodies arrive as entity-escaped HTML; decode once before
/// inserting them verbatim.
fn body_html(escaped: &str) -> PreEscaped<Cow<'_, str>> {
    PreEscaped(html_escape::decode_html_entities(escaped))
}

/// The root post of an archived thread.
#[derive(Debug, Clone)]
pub struct ThreadPost<'a> {
    pub thread: &'a Thread,
}

impl<'a> ThreadPost<'a> {
    #[must_use]
    pub const fn new(thread: &'a Thread) -> Self {
        Self { thread }
    }
}

impl Render for ThreadPost<'_> {
    fn render(&self) -> Markup {
        let thread = self.thread;
        html! {
            article class="thread-post" {
                h1 { (thread.title) }
                p class="comment-meta" {
                    "Posted by " strong { (thread.author) }
                    " in " a href=(format!("/r/{}", thread.sub)) { "r/" (thread.sub) }
                    " on " (format_timestamp(thread.timestamp))
                    " | archived " (format_timestamp(thread.archive_timestamp))
                    " | " (thread.replies_num) " replies"
                }
                @if !thread.is_root() {
                    p class="comment-meta" {
                        "Continuation of replies under comment " code { (thread.continuing_reply) }
                        " | " a href=(format!("/thread/{}", thread.thread_id)) { "back to thread" }
                    }
                }
                @if !thread.content_link.is_empty() {
                    p { a href=(thread.content_link) rel="noopener noreferrer" { (thread.content_link) } }
                }
                @if !thread.content.is_empty() {
                    div class="thread-body" { (body_html(&thread.content)) }
                }
            }
        }
    }
}

/// A forest of replies, highest score first at each level.
#[derive(Debug, Clone)]
pub struct CommentTree<'a> {
    pub thread_id: &'a str,
    pub comments: &'a [RenderedComment],
}

impl<'a> CommentTree<'a> {
    #[must_use]
    pub const fn new(thread_id: &'a str, comments: &'a [RenderedComment]) -> Self {
        Self {
            thread_id,
            comments,
        }
    }

    fn render_comment(&self, comment: &RenderedComment) -> Markup {
        html! {
            div class="comment" id=[comment.comment_id.as_deref()] {
                p class="comment-meta" {
                    strong { (comment.author) }
                    " | " (comment.score) " points"
                    " | " (format_timestamp(comment.timestamp))
                }
                div class="comment-body" { (body_html(&comment.content)) }
                @if comment.continues {
                    @if let Some(comment_id) = &comment.comment_id {
                        p {
                            a href=(format!("/thread/{}/{comment_id}", self.thread_id)) {
                                "Continue this thread \u{2192}"
                            }
                        }
                    }
                }
                @for reply in &comment.replies {
                    (self.render_comment(reply))
                }
            }
        }
    }
}

impl Render for CommentTree<'_> {
    fn render(&self) -> Markup {
        html! {
            section class="comments" {
                @if self.comments.is_empty() {
                    p { em { "No replies archived." } }
                }
                @for comment in self.comments {
                    (self.render_comment(comment))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: &str, body: &str, replies: Vec<RenderedComment>) -> RenderedComment {
        RenderedComment {
            comment_id: Some(id.to_string()),
            author: format!("user_{id}"),
            content: body.to_string(),
            timestamp: 1_546_300_800,
            score: 1,
            continues: false,
            replies,
        }
    }

    #[test]
    fn test_nested_replies_render_inside_parent() {
        let tree = vec![comment("a", "parent", vec![comment("c", "child", vec![])])];
        let html = CommentTree::new("agi5zf", &tree).render().into_string();

        let parent = html.find("user_a").unwrap();
        let child = html.find("user_c").unwrap();
        assert!(parent < child);
        assert!(html.contains(r#"id="c""#));
    }

    #[test]
    fn test_body_unescaped_once() {
        let tree = vec![comment("a", "&lt;p&gt;hi &amp;amp; bye&lt;/p&gt;", vec![])];
        let html = CommentTree::new("agi5zf", &tree).render().into_string();
        assert!(html.contains("<p>hi &amp; bye</p>"));
    }

    #[test]
    fn test_continuation_link() {
        let mut continued = comment("deep1", "cut off", vec![]);
        continued.continues = true;
        let tree = vec![continued];
        let html = CommentTree::new("agi5zf", &tree).render().into_string();
        assert!(html.contains(r#"href="/thread/agi5zf/deep1""#));
    }

    #[test]
    fn test_empty_tree() {
        let html = CommentTree::new("agi5zf", &[]).render().into_string();
        assert!(html.contains("No replies archived."));
    }
}

//! Archived thread page.

use maud::{html, Markup};

use crate::archiver::RenderedThread;
use crate::components::{BaseLayout, CommentTree, ThreadPost};

#[must_use]
pub fn render_thread_page(rendered: &RenderedThread) -> Markup {
    let thread = &rendered.thread;
    let content = html! {
        (ThreadPost::new(thread))
        (CommentTree::new(&thread.thread_id, &rendered.replies))
    };

    BaseLayout::new(&thread.title).render(content)
}

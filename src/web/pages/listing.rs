//! Category listing and community directory pages.

use maud::{html, Markup};

use super::home::ThreadTable;
use crate::components::{BaseLayout, Pagination};
use crate::db::ThreadSummary;

/// Render one page of the threads archived from `category`.
#[must_use]
pub fn render_category_page(
    category: &str,
    threads: &[ThreadSummary],
    pagination: &Pagination,
) -> Markup {
    let title = format!("r/{category}");
    let content = html! {
        h1 { (title) }
        (ThreadTable { threads, show_category: false })
        (pagination)
    };

    BaseLayout::new(&title).render(content)
}

/// Render one page of the community directory.
#[must_use]
pub fn render_subs_page(subs: &[String], pagination: &Pagination) -> Markup {
    let content = html! {
        h1 { "Communities" }
        @if subs.is_empty() {
            p { em { "Nothing archived yet." } }
        } @else {
            ul {
                @for sub in subs {
                    li { a href=(format!("/r/{sub}")) { "r/" (sub) } }
                }
            }
        }
        (pagination)
    };

    BaseLayout::new("Communities").render(content)
}

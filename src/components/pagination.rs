//! Previous/next navigation for paged listings.
//!
//! Listings are not counted up front, so the pager only knows whether the
//! current page was full.

use maud::{html, Markup, Render};

#[derive(Debug, Clone)]
pub struct Pagination {
    /// Current page number (0-indexed internally, displayed as 1-indexed)
    pub current_page: i64,
    pub has_next: bool,
    pub base_url: String,
}

impl Pagination {
    #[must_use]
    pub fn new(current_page: i64, has_next: bool, base_url: &str) -> Self {
        Self {
            current_page: current_page.max(0),
            has_next,
            base_url: base_url.to_string(),
        }
    }

    fn build_url(&self, page_num: i64) -> String {
        if page_num > 0 {
            format!("{}?page={page_num}", self.base_url)
        } else {
            self.base_url.clone()
        }
    }

    #[must_use]
    pub fn should_display(&self) -> bool {
        self.current_page > 0 || self.has_next
    }
}

impl Render for Pagination {
    fn render(&self) -> Markup {
        if !self.should_display() {
            return html! {};
        }

        let current = self.current_page;
        html! {
            nav class="pagination" {
                @if current > 0 {
                    a href=(self.build_url(current - 1)) { "\u{00ab} Previous" }
                } @else {
                    span class="disabled" { "\u{00ab} Previous" }
                }
                span class="current" { "Page " (current + 1) }
                @if self.has_next {
                    a href=(self.build_url(current + 1)) { "Next \u{00bb}" }
                } @else {
                    span class="disabled" { "Next \u{00bb}" }
                }
            }
        }
    }
}

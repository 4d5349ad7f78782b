use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use maud::Markup;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use super::pages;
use super::AppState;
use crate::admission::Admission;
use crate::archiver::{reconstruct, ArchiveError};
use crate::components::Pagination;
use crate::constants::{CATEGORY_PAGE_SIZE, LATEST_THREADS_LIMIT};
use crate::db::{count_archived_threads, list_by_category, list_categories, list_latest};
use crate::reddit::{parse_thread_url, validate_category, validate_comment_id, validate_thread_id};

/// Create the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/archive", post(archive_thread))
        .route("/thread/:id", get(thread_page))
        .route("/thread/:id/:reply", get(continuation_page))
        .route("/r/:category", get(category_page))
        .route("/subs", get(subs_page))
        .route("/api/thread/:id", get(api_thread))
        .route("/api/thread/:id/:reply", get(api_continuation))
}

fn cached_html(state: &AppState, markup: Markup) -> Response {
    let max_age = state.config.get_cache_time.as_secs();
    (
        [(header::CACHE_CONTROL, format!("public, max-age={max_age}"))],
        Html(markup.into_string()),
    )
        .into_response()
}

fn error_page(status: StatusCode, title: &str, message: &str) -> Response {
    (
        status,
        Html(pages::render_error_page(title, message).into_string()),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    page: Option<i64>,
}

impl PageParams {
    fn page(&self) -> i64 {
        self.page.unwrap_or(0).max(0)
    }
}

// ========== HTML Routes ==========

async fn health() -> &'static str {
    "API is live."
}

async fn home(State(state): State<AppState>) -> Response {
    let latest = match list_latest(state.db.pool(), LATEST_THREADS_LIMIT).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("Failed to fetch latest threads: {e:#}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };
    let count = match count_archived_threads(state.db.pool()).await {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to count threads: {e:#}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    cached_html(&state, pages::render_home(count, &latest))
}

async fn thread_page(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    render_thread(&state, &id, "").await
}

async fn continuation_page(
    State(state): State<AppState>,
    Path((id, reply)): Path<(String, String)>,
) -> Response {
    if let Err(e) = validate_comment_id(&reply) {
        return error_page(StatusCode::BAD_REQUEST, "Invalid request", &e.to_string());
    }
    render_thread(&state, &id, &reply).await
}

async fn render_thread(state: &AppState, id: &str, reply: &str) -> Response {
    if let Err(e) = validate_thread_id(id) {
        return error_page(StatusCode::BAD_REQUEST, "Invalid request", &e.to_string());
    }

    match reconstruct(state.db.pool(), id, reply).await {
        Ok(Some(rendered)) => cached_html(state, pages::render_thread_page(&rendered)),
        Ok(None) => error_page(
            StatusCode::NOT_FOUND,
            "Not found",
            "This thread has not been archived.",
        ),
        Err(e) => {
            tracing::error!(thread_id = %id, "Failed to load thread: {e:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response()
        }
    }
}

async fn category_page(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(params): Query<PageParams>,
) -> Response {
    if let Err(e) = validate_category(&category) {
        return error_page(StatusCode::BAD_REQUEST, "Invalid request", &e.to_string());
    }

    let page = params.page();
    let threads =
        match list_by_category(state.db.pool(), &category, page, CATEGORY_PAGE_SIZE).await {
            Ok(t) => t,
            Err(e) => {
                tracing::error!("Failed to fetch category threads: {e:#}");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
            }
        };

    let has_next = threads.len() as i64 == CATEGORY_PAGE_SIZE;
    let pagination = Pagination::new(page, has_next, &format!("/r/{category}"));
    cached_html(
        &state,
        pages::render_category_page(&category, &threads, &pagination),
    )
}

async fn subs_page(State(state): State<AppState>, Query(params): Query<PageParams>) -> Response {
    let page = params.page();
    let subs = match list_categories(state.db.pool(), page, CATEGORY_PAGE_SIZE).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to fetch categories: {e:#}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    let has_next = subs.len() as i64 == CATEGORY_PAGE_SIZE;
    let pagination = Pagination::new(page, has_next, "/subs");
    cached_html(&state, pages::render_subs_page(&subs, &pagination))
}

// ========== Submission ==========

#[derive(Debug, Deserialize)]
pub struct ArchiveForm {
    archivef: String,
}

async fn archive_thread(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Form(form): Form<ArchiveForm>,
) -> Response {
    let locator = match parse_thread_url(&form.archivef) {
        Ok(l) => l,
        Err(e) => {
            tracing::debug!(url = %form.archivef, error = %e, "Rejected archive submission");
            return error_page(StatusCode::BAD_REQUEST, "Invalid URL", &e.to_string());
        }
    };

    let client_ip = addr.ip().to_string();
    match state.gate.admit(&client_ip, &locator.thread_id) {
        Admission::Allowed => {}
        Admission::Denied => {
            tracing::info!(client_ip = %client_ip, "Archive request rate limited");
            return error_page(
                StatusCode::TOO_MANY_REQUESTS,
                "Slow down",
                "Too many archive requests. Please wait a minute and try again.",
            );
        }
        Admission::Duplicate => {
            return Html(pages::render_already_requested(&locator.thread_id).into_string())
                .into_response();
        }
    }

    let raw = match state
        .fetcher
        .fetch(&locator.category, &locator.thread_id, None)
        .await
    {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(thread_id = %locator.thread_id, error = %e, "Failed to fetch thread");
            state.gate.withdraw(&locator.thread_id);
            return error_page(
                e.status_code(),
                "Upstream error",
                "Could not fetch the thread from Reddit.",
            );
        }
    };

    match state.archiver.archive(&locator.category, &raw).await {
        Ok(ticket) => {
            Html(pages::render_archive_started(&ticket.thread_id).into_string()).into_response()
        }
        Err(ArchiveError::AlreadyArchived { .. }) => {
            Html(pages::render_already_archived(&locator.thread_id).into_string()).into_response()
        }
        Err(ArchiveError::Validation(message)) => {
            error_page(StatusCode::BAD_REQUEST, "Invalid thread", &message)
        }
        Err(e) => {
            tracing::error!(thread_id = %locator.thread_id, "Failed to start archive: {e:#}");
            error_page(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Archival failed",
                "The thread could not be archived.",
            )
        }
    }
}

// ========== JSON API ==========

#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
}

fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ApiError {
            error: message.into(),
        }),
    )
        .into_response()
}

async fn api_thread(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    api_render(&state, &id, "").await
}

async fn api_continuation(
    State(state): State<AppState>,
    Path((id, reply)): Path<(String, String)>,
) -> Response {
    if let Err(e) = validate_comment_id(&reply) {
        return api_error(StatusCode::BAD_REQUEST, e.to_string());
    }
    api_render(&state, &id, &reply).await
}

async fn api_render(state: &AppState, id: &str, reply: &str) -> Response {
    if let Err(e) = validate_thread_id(id) {
        return api_error(StatusCode::BAD_REQUEST, e.to_string());
    }

    match reconstruct(state.db.pool(), id, reply).await {
        Ok(Some(rendered)) => Json(rendered).into_response(),
        Ok(None) => api_error(StatusCode::NOT_FOUND, "thread not archived"),
        Err(e) => {
            tracing::error!(thread_id = %id, "Failed to load thread: {e:#}");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "database error")
        }
    }
}

// HTTP handlers - thin adapters between axum extractors and the services
pub mod feed;
pub mod follow;
pub mod posts;

use axum::{
    http::{Method, Uri},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::PostId;

/// `?page=N`, kept raw so the paginator decides what a bad value means.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Non-numeric ids never match a post.
pub(crate) fn parse_post_id(raw: &str) -> AppResult<PostId> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("Post {} not found", raw)))
}

pub(crate) fn profile_location(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

pub(crate) fn post_location(post_id: PostId) -> String {
    format!("/posts/{}/", post_id)
}

/// Unmatched GET/HEAD requests for a path without a trailing slash are
/// redirected to the slashed path; everything else is a 404 page.
pub async fn not_found_handler(method: Method, uri: Uri) -> Response {
    match slash_appended(&method, &uri) {
        Some(location) => Redirect::permanent(&location).into_response(),
        None => AppError::NotFound(format!("No route for {}", uri.path())).into_response(),
    }
}

pub async fn method_not_allowed_handler(method: Method, uri: Uri) -> AppError {
    AppError::MethodNotAllowed(format!("{} is not allowed on {}", method, uri.path()))
}

fn slash_appended(method: &Method, uri: &Uri) -> Option<String> {
    let path = uri.path();
    if !(method == Method::GET || method == Method::HEAD)
        || path.ends_with('/')
        || path == "/health"
        || path.starts_with("/media/")
    {
        return None;
    }
    Some(match uri.query() {
        Some(query) => format!("{}/?{}", path, query),
        None => format!("{}/", path),
    })
}

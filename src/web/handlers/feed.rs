// Read-only pages: index, group, profile, followed feed and post detail

use axum::{
    extract::{Path, Query, State},
    http::Uri,
    response::Html,
};

use crate::app_state::AppState;
use crate::error::AppResult;
use crate::infrastructure::middleware::{CurrentUser, Vc};
use crate::web::handlers::{parse_post_id, PageQuery};
use crate::web::templates;

/// Cache key for a rendered page: the viewer plus path and query.
fn page_cache_key(vc: &Vc, uri: &Uri) -> String {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    match vc.username() {
        Some(username) => format!("user:{}:{}", username, target),
        None => format!("anonymous:{}", target),
    }
}

pub async fn index_handler(
    State(state): State<AppState>,
    vc: Vc,
    uri: Uri,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<String>> {
    let key = page_cache_key(&vc, &uri);
    let feed = &state.feed;
    let viewer = &*vc;
    let page_param = query.page.as_deref();
    let body = state
        .page_cache
        .cached_render(&key, move || async move {
            let page = feed.list_all(page_param).await?;
            Ok(templates::index_page(viewer, &page))
        })
        .await?;
    Ok(Html(body.to_string()))
}

pub async fn group_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<String>> {
    let listing = state.feed.list_by_group(&slug, query.page.as_deref()).await?;
    Ok(Html(templates::group_page(&vc, &listing)))
}

pub async fn profile_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<String>> {
    let listing = state
        .feed
        .list_by_author(&username, vc.user_id(), query.page.as_deref())
        .await?;
    Ok(Html(templates::profile_page(&vc, &listing)))
}

pub async fn follow_index_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    vc: Vc,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<String>> {
    let page = state
        .feed
        .list_followed_feed(user.id, query.page.as_deref())
        .await?;
    Ok(Html(templates::follow_page(&vc, &page)))
}

pub async fn post_detail_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(post_id): Path<String>,
) -> AppResult<Html<String>> {
    let detail = state.feed.post_detail(parse_post_id(&post_id)?).await?;
    Ok(Html(templates::post_detail_page(&vc, &detail)))
}

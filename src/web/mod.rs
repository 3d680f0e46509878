// Web layer - router, handlers and HTML templates
pub mod handlers;
pub mod templates;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::app_state::AppState;
use crate::infrastructure::middleware::viewer_context_middleware;
use handlers::{feed, follow, posts};

async fn health_handler() -> Json<Value> {
    Json(json!({"status": "ok", "service": "yatube"}))
}

/// Build the full application router around shared state.
pub fn create_router(state: AppState) -> Router {
    let media = ServeDir::new(state.media.root());
    let body_limit = state.config.media.max_upload_bytes;

    Router::new()
        .route("/", get(feed::index_handler))
        .route("/group/{slug}/", get(feed::group_handler))
        .route("/profile/{username}/", get(feed::profile_handler))
        .route("/profile/{username}/follow/", post(follow::follow_handler))
        .route("/profile/{username}/unfollow/", post(follow::unfollow_handler))
        .route("/follow/", get(feed::follow_index_handler))
        .route("/posts/{post_id}/", get(feed::post_detail_handler))
        .route(
            "/posts/{post_id}/edit/",
            get(posts::edit_form_handler).post(posts::edit_post_handler),
        )
        .route("/posts/{post_id}/comment/", post(posts::add_comment_handler))
        .route(
            "/create/",
            get(posts::create_form_handler).post(posts::create_post_handler),
        )
        .route("/health", get(health_handler))
        .nest_service("/media", media)
        .fallback(handlers::not_found_handler)
        .method_not_allowed_fallback(handlers::method_not_allowed_handler)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            viewer_context_middleware,
        ))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

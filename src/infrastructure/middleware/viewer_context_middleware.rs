// ViewerContext Middleware - resolves the viewer once per request
// and injects it into request extensions for handlers

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{warn, Instrument};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::AppResult;
use crate::infrastructure::database::BlogStore;
use crate::infrastructure::viewer::ViewerContext;

/// Resolve the viewer from the trusted upstream header and run the rest of
/// the stack inside a span tagged with the request id.
pub async fn viewer_context_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let request_id = format!("req-{}", Uuid::new_v4());
    let username = extract_username(request.headers(), &state.config.auth.user_header);
    let viewer = create_viewer_context(state.store.as_ref(), username, request_id).await?;

    let span = tracing::info_span!(
        "request",
        request_id = %viewer.request_id,
        viewer = viewer.username().unwrap_or("anonymous"),
    );
    request.extensions_mut().insert(Arc::new(viewer));

    Ok(next.run(request).instrument(span).await)
}

/// Username asserted by the authentication collaborator, if any.
fn extract_username(headers: &HeaderMap, header_name: &str) -> Option<String> {
    headers
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Unknown usernames fall back to an anonymous viewer.
pub async fn create_viewer_context(
    store: &dyn BlogStore,
    username: Option<String>,
    request_id: String,
) -> AppResult<ViewerContext> {
    let Some(username) = username else {
        return Ok(ViewerContext::anonymous(request_id));
    };

    match store.find_user_by_username(&username).await? {
        Some(user) => Ok(ViewerContext::authenticated_user(user, request_id)),
        None => {
            warn!(username = %username, "auth header names an unknown user");
            Ok(ViewerContext::anonymous(request_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sqlite_database::SqliteStore;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_username_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-remote-user", HeaderValue::from_static(" leo "));
        assert_eq!(extract_username(&headers, "x-remote-user"), Some("leo".to_string()));
    }

    #[test]
    fn test_extract_username_missing_or_blank() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_username(&headers, "x-remote-user"), None);
        headers.insert("x-remote-user", HeaderValue::from_static("  "));
        assert_eq!(extract_username(&headers, "x-remote-user"), None);
    }

    #[tokio::test]
    async fn test_known_user_is_authenticated() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        let leo = store.create_user("leo", "").await.unwrap();

        let viewer = create_viewer_context(&store, Some("leo".to_string()), "req-1".to_string())
            .await
            .unwrap();
        assert!(viewer.is_authenticated());
        assert_eq!(viewer.user_id(), Some(leo.id));
    }

    #[tokio::test]
    async fn test_unknown_user_is_anonymous() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        let viewer = create_viewer_context(&store, Some("ghost".to_string()), "req-2".to_string())
            .await
            .unwrap();
        assert!(!viewer.is_authenticated());
        assert_eq!(viewer.request_id, "req-2");
    }
}

// ViewerContext Extractors - handler-facing access to the resolved viewer

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, Uri},
};
use std::sync::Arc;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::infrastructure::viewer::ViewerContext;
use crate::models::User;

/// The viewer of the current request, authenticated or not.
///
/// Cloning is an `Arc` clone; fields are reachable through `Deref`.
#[derive(Debug, Clone)]
pub struct Vc(Arc<ViewerContext>);

impl Vc {
    pub fn new(vc: Arc<ViewerContext>) -> Self {
        Self(vc)
    }

    pub fn arc(self) -> Arc<ViewerContext> {
        self.0
    }
}

impl std::ops::Deref for Vc {
    type Target = ViewerContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Vc
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Arc<ViewerContext>>()
            .map(|vc| Vc(vc.clone()))
            .ok_or_else(|| AppError::Internal("viewer context middleware not installed".to_string()))
    }
}

/// A signed-in user. Extraction fails with a redirect to the login page
/// before the handler body runs.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let vc = Vc::from_request_parts(parts, state).await?;
        match &vc.user {
            Some(user) => Ok(CurrentUser(user.clone())),
            None => Err(AppError::Unauthenticated(login_redirect(
                &state.config.auth.login_url,
                &parts.uri,
            ))),
        }
    }
}

/// `login_url?next=<path and query>`, keeping `/` unescaped in `next`.
pub fn login_redirect(login_url: &str, uri: &Uri) -> String {
    let next = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    let separator = if login_url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}next={}",
        login_url,
        separator,
        urlencoding::encode(next).replace("%2F", "/")
    )
}

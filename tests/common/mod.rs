// Shared harness: an in-memory app driven through the router with oneshot
#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response, StatusCode},
    Router,
};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use yatube::{
    app_state::AppState,
    config::Config,
    infrastructure::{BlogStore, SqliteStore},
    models::{Group, NewPost, PostId, User},
    web::create_router,
};

pub const BOUNDARY: &str = "yatube-test-boundary";

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<SqliteStore>,
    pub router: Router,
    pub media: TempDir,
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

impl TestApp {
    pub async fn new() -> Self {
        let media = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteStore::new_in_memory().await.unwrap());
        let state = AppState::with_store(Config::in_memory(media.path()), store.clone());
        let router = create_router(state.clone());
        Self {
            state,
            store,
            router,
            media,
        }
    }

    pub async fn user(&self, username: &str) -> User {
        self.store.create_user(username, "").await.unwrap()
    }

    pub async fn group(&self, slug: &str) -> Group {
        self.store.create_group(slug, &slug.to_uppercase(), "").await.unwrap()
    }

    pub async fn post(&self, author: &User, text: &str, group: Option<&Group>) -> PostId {
        self.store
            .insert_post(NewPost {
                author_id: author.id,
                text: text.to_string(),
                group_id: group.map(|g| g.id),
                image: None,
                pub_date: chrono::Utc::now(),
            })
            .await
            .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, viewer: Option<&str>) -> Response<Body> {
        let request = with_viewer(Request::get(uri), viewer)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post_form(&self, uri: &str, viewer: Option<&str>, body: &str) -> Response<Body> {
        let request = with_viewer(Request::post(uri), viewer)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        viewer: Option<&str>,
        parts: &[Part<'_>],
    ) -> Response<Body> {
        let request = with_viewer(Request::post(uri), viewer)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        self.send(request).await
    }
}

fn with_viewer(
    builder: axum::http::request::Builder,
    viewer: Option<&str>,
) -> axum::http::request::Builder {
    match viewer {
        Some(username) => builder.header("x-remote-user", username),
        None => builder,
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// A valid 2x2 PNG, encoded fresh so the bytes always decode.
pub fn tiny_png() -> Vec<u8> {
    let mut bytes = Vec::new();
    image::RgbImage::new(2, 2)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

pub fn assert_redirect(response: &Response<Body>, expected: &str) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(response), expected);
}

pub fn count_posts_in(html: &str) -> usize {
    html.matches("<article class=\"post\">").count()
}

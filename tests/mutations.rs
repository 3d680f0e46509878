mod common;

use axum::http::StatusCode;
use common::{assert_redirect, body_string, count_posts_in, tiny_png, Part, TestApp};
use yatube::infrastructure::{BlogStore, PostFilter};
use yatube::models::Follow;

#[tokio::test]
async fn test_create_post_redirects_to_profile() {
    let app = TestApp::new().await;
    let author = app.user("author").await;
    let group = app.group("cats").await;
    let group_id = group.id.to_string();

    let response = app
        .post_multipart(
            "/create/",
            Some("author"),
            &[Part::Text("text", "Fresh post"), Part::Text("group", &group_id)],
        )
        .await;
    assert_redirect(&response, "/profile/author/");

    let posts = app
        .store
        .list_posts(PostFilter::Author(author.id), 10, 0)
        .await
        .unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].post.text, "Fresh post");
    assert_eq!(posts[0].group.as_ref().map(|g| g.id), Some(group.id));
}

#[tokio::test]
async fn test_create_post_with_image_is_served_from_media() {
    let app = TestApp::new().await;
    app.user("author").await;
    let png = tiny_png();

    let response = app
        .post_multipart(
            "/create/",
            Some("author"),
            &[
                Part::Text("text", "Look at this"),
                Part::Text("group", ""),
                Part::File {
                    name: "image",
                    file_name: "small.png",
                    content_type: "image/png",
                    bytes: &png,
                },
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let index = body_string(app.get("/", None).await).await;
    assert!(index.contains("/media/posts/small.png"));

    let image = app.get("/media/posts/small.png", None).await;
    assert_eq!(image.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_post_form_is_rerendered() {
    let app = TestApp::new().await;
    app.user("author").await;

    let response = app
        .post_multipart(
            "/create/",
            Some("author"),
            &[Part::Text("text", "   "), Part::Text("group", "")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("This field is required."));

    let response = app
        .post_multipart(
            "/create/",
            Some("author"),
            &[
                Part::Text("text", "Not a picture"),
                Part::File {
                    name: "image",
                    file_name: "notes.txt",
                    content_type: "text/plain",
                    bytes: b"plain text",
                },
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("Upload a valid image."));
    assert!(html.contains(">Not a picture</textarea>"));

    assert_eq!(app.store.count_posts(PostFilter::All).await.unwrap(), 0);
}

#[tokio::test]
async fn test_uploads_that_are_not_raster_images_are_rejected() {
    let app = TestApp::new().await;
    app.user("author").await;

    let fakes: [(&str, &str, &[u8]); 2] = [
        ("fake.png", "image/png", b"this is not a png"),
        (
            "evil.svg",
            "image/svg+xml",
            b"<svg><script>alert(document.cookie)</script></svg>",
        ),
    ];
    for (file_name, content_type, bytes) in fakes {
        let response = app
            .post_multipart(
                "/create/",
                Some("author"),
                &[
                    Part::Text("text", "Sneaky"),
                    Part::File {
                        name: "image",
                        file_name,
                        content_type,
                        bytes,
                    },
                ],
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK, "{}", file_name);
        assert!(body_string(response).await.contains("Upload a valid image."));

        let served = app.get(&format!("/media/posts/{}", file_name), None).await;
        assert_eq!(served.status(), StatusCode::NOT_FOUND, "{}", file_name);
    }

    assert_eq!(app.store.count_posts(PostFilter::All).await.unwrap(), 0);
}

#[tokio::test]
async fn test_guest_is_sent_to_login() {
    let app = TestApp::new().await;
    let author = app.user("author").await;
    let id = app.post(&author, "Hello", None).await;

    let response = app
        .post_form(&format!("/posts/{}/comment/", id), None, "text=Hi")
        .await;
    assert_redirect(&response, &format!("/auth/login/?next=/posts/{}/comment/", id));
    assert!(app.store.list_comments(id).await.unwrap().is_empty());

    assert_redirect(&app.get("/create/", None).await, "/auth/login/?next=/create/");
    assert_redirect(&app.get("/follow/", None).await, "/auth/login/?next=/follow/");
}

#[tokio::test]
async fn test_edit_only_by_author() {
    let app = TestApp::new().await;
    let author = app.user("author").await;
    app.user("intruder").await;
    let id = app.post(&author, "Original text", None).await;
    let before = app.store.get_post(id).await.unwrap().unwrap();
    let edit_uri = format!("/posts/{}/edit/", id);
    let detail_uri = format!("/posts/{}/", id);

    assert_redirect(&app.get(&edit_uri, Some("intruder")).await, &detail_uri);
    let response = app
        .post_multipart(&edit_uri, Some("intruder"), &[Part::Text("text", "Hijacked")])
        .await;
    assert_redirect(&response, &detail_uri);
    assert_eq!(app.store.get_post(id).await.unwrap().unwrap().text, "Original text");

    let form = app.get(&edit_uri, Some("author")).await;
    assert_eq!(form.status(), StatusCode::OK);
    assert!(body_string(form).await.contains(">Original text</textarea>"));

    let response = app
        .post_multipart(&edit_uri, Some("author"), &[Part::Text("text", "Edited text")])
        .await;
    assert_redirect(&response, &detail_uri);

    let after = app.store.get_post(id).await.unwrap().unwrap();
    assert_eq!(after.text, "Edited text");
    assert!(after.pub_date > before.pub_date);
}

#[tokio::test]
async fn test_follow_is_idempotent_and_reversible() {
    let app = TestApp::new().await;
    let author = app.user("author").await;
    let reader = app.user("reader").await;
    let edge = Follow {
        follower_id: reader.id,
        author_id: author.id,
    };

    for _ in 0..2 {
        let response = app.post_form("/profile/author/follow/", Some("reader"), "").await;
        assert_redirect(&response, "/profile/author/");
    }
    assert_eq!(app.store.count_followers(author.id).await.unwrap(), 1);

    let profile = body_string(app.get("/profile/author/", Some("reader")).await).await;
    assert!(profile.contains("/profile/author/unfollow/"));

    let response = app.post_form("/profile/author/unfollow/", Some("reader"), "").await;
    assert_redirect(&response, "/profile/author/");
    assert!(!app.store.follow_exists(edge).await.unwrap());
}

#[tokio::test]
async fn test_self_follow_creates_nothing() {
    let app = TestApp::new().await;
    let author = app.user("author").await;

    let response = app.post_form("/profile/author/follow/", Some("author"), "").await;
    assert_redirect(&response, "/profile/author/");
    assert_eq!(app.store.count_following(author.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_followed_feed_shows_only_followed_authors() {
    let app = TestApp::new().await;
    let author = app.user("author").await;
    app.user("follower").await;
    app.user("stranger").await;
    app.post(&author, "For my followers", None).await;

    app.post_form("/profile/author/follow/", Some("follower"), "").await;

    let feed = body_string(app.get("/follow/", Some("follower")).await).await;
    assert_eq!(count_posts_in(&feed), 1);
    assert!(feed.contains("For my followers"));

    let other = body_string(app.get("/follow/", Some("stranger")).await).await;
    assert_eq!(count_posts_in(&other), 0);
}

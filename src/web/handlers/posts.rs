// Post mutations - create, edit and comment
// Forms that fail validation are re-rendered with the submitted values

use axum::{
    extract::{Multipart, Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use tracing::warn;

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};
use crate::forms::{CommentForm, FormErrors, PostFormInput};
use crate::infrastructure::media::ImageUpload;
use crate::infrastructure::middleware::{CurrentUser, Vc};
use crate::models::{GroupId, PostId};
use crate::web::handlers::{parse_post_id, post_location, profile_location};
use crate::web::templates::{self, PostFormContext};

/// Collect the multipart fields of a post form. Unknown fields are skipped.
async fn read_post_form(mut multipart: Multipart) -> AppResult<PostFormInput> {
    let mut input = PostFormInput::default();

    while let Some(field) = multipart.next_field().await.map_err(malformed_form)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text" => input.text = field.text().await.map_err(malformed_form)?,
            "group" => input.group = field.text().await.map_err(malformed_form)?,
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(malformed_form)?;
                input.image = Some(ImageUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "image-clear" => input.clear_image = true,
            _ => {}
        }
    }
    Ok(input)
}

fn malformed_form(err: axum::extract::multipart::MultipartError) -> AppError {
    warn!(error = %err, "malformed multipart body");
    AppError::Validation(FormErrors::single("form", &err.body_text()))
}

/// Submitted values echoed back into a re-rendered form.
fn submitted_group(input: &PostFormInput) -> Option<GroupId> {
    input.group.trim().parse().ok()
}

async fn render_post_form(
    state: &AppState,
    vc: &Vc,
    post_id: Option<PostId>,
    text: &str,
    group_id: Option<GroupId>,
    image: Option<&str>,
    errors: &FormErrors,
) -> AppResult<Html<String>> {
    let groups = state.store.list_groups().await?;
    Ok(Html(templates::post_form_page(
        vc,
        &PostFormContext {
            text,
            group_id,
            image,
            groups: &groups,
            errors,
            post_id,
        },
    )))
}

pub async fn create_form_handler(
    State(state): State<AppState>,
    _user: CurrentUser,
    vc: Vc,
) -> AppResult<Html<String>> {
    render_post_form(&state, &vc, None, "", None, None, &FormErrors::new()).await
}

pub async fn create_post_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    vc: Vc,
    multipart: Multipart,
) -> AppResult<Response> {
    let input = read_post_form(multipart).await?;
    let text = input.text.clone();
    let group_id = submitted_group(&input);

    match state.posts.create_post(&user, input).await {
        Ok(_) => Ok(Redirect::to(&profile_location(&user.username)).into_response()),
        Err(AppError::Validation(errors)) => {
            Ok(render_post_form(&state, &vc, None, &text, group_id, None, &errors)
                .await?
                .into_response())
        }
        Err(err) => Err(err),
    }
}

pub async fn edit_form_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    vc: Vc,
    Path(post_id): Path<String>,
) -> AppResult<Response> {
    let post_id = parse_post_id(&post_id)?;
    let post = match state.posts.post_for_edit(&user, post_id).await {
        Ok(post) => post,
        Err(AppError::PermissionDenied(_)) => {
            return Ok(Redirect::to(&post_location(post_id)).into_response())
        }
        Err(err) => return Err(err),
    };

    Ok(render_post_form(
        &state,
        &vc,
        Some(post.id),
        &post.text,
        post.group_id,
        post.image.as_deref(),
        &FormErrors::new(),
    )
    .await?
    .into_response())
}

pub async fn edit_post_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    vc: Vc,
    Path(post_id): Path<String>,
    multipart: Multipart,
) -> AppResult<Response> {
    let post_id = parse_post_id(&post_id)?;
    let input = read_post_form(multipart).await?;
    let text = input.text.clone();
    let group_id = submitted_group(&input);

    match state.posts.edit_post(&user, post_id, input).await {
        Ok(_) => Ok(Redirect::to(&post_location(post_id)).into_response()),
        Err(AppError::PermissionDenied(_)) => {
            Ok(Redirect::to(&post_location(post_id)).into_response())
        }
        Err(AppError::Validation(errors)) => {
            let current_image = state
                .store
                .get_post(post_id)
                .await?
                .and_then(|post| post.image);
            Ok(render_post_form(
                &state,
                &vc,
                Some(post_id),
                &text,
                group_id,
                current_image.as_deref(),
                &errors,
            )
            .await?
            .into_response())
        }
        Err(err) => Err(err),
    }
}

pub async fn add_comment_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
    Form(form): Form<CommentForm>,
) -> AppResult<Redirect> {
    let post_id = parse_post_id(&post_id)?;
    state.posts.add_comment(&user, post_id, form).await?;
    Ok(Redirect::to(&post_location(post_id)))
}

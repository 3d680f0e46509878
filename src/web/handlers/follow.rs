// Follow and unfollow - POST only, both land back on the author's profile

use axum::{
    extract::{Path, State},
    response::Redirect,
};

use crate::app_state::AppState;
use crate::error::AppResult;
use crate::infrastructure::middleware::CurrentUser;
use crate::web::handlers::profile_location;

pub async fn follow_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Redirect> {
    let author = state.posts.follow(&user, &username).await?;
    Ok(Redirect::to(&profile_location(&author.username)))
}

pub async fn unfollow_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Redirect> {
    let author = state.posts.unfollow(&user, &username).await?;
    Ok(Redirect::to(&profile_location(&author.username)))
}

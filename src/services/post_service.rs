// PostService - write side of the blog: posts, comments and follow edges
// Callers pass an already authenticated user; ownership checks happen here

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::forms::{CommentForm, FormErrors, PostForm, PostFormInput, INVALID_GROUP_MESSAGE};
use crate::infrastructure::database::BlogStore;
use crate::infrastructure::media::MediaStorage;
use crate::models::{
    CommentId, Follow, NewComment, NewPost, Post, PostChanges, PostId, User,
};

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn BlogStore>,
    media: MediaStorage,
}

impl PostService {
    pub fn new(store: Arc<dyn BlogStore>, media: MediaStorage) -> Self {
        Self { store, media }
    }

    pub async fn create_post(&self, author: &User, input: PostFormInput) -> AppResult<PostId> {
        let form = self.clean_post_form(input).await?;
        let image = match &form.image {
            Some(upload) => Some(self.media.save_post_image(upload).await?),
            None => None,
        };

        let inserted = self
            .store
            .insert_post(NewPost {
                author_id: author.id,
                text: form.text,
                group_id: form.group_id,
                image: image.clone(),
                pub_date: Utc::now(),
            })
            .await;
        let id = match inserted {
            Ok(id) => id,
            Err(err) => {
                if let Some(stored) = &image {
                    self.media.discard_post_image(stored).await;
                }
                return Err(err);
            }
        };

        info!(post_id = id, author = %author.username, "post created");
        Ok(id)
    }

    /// Load a post for editing, enforcing that `requestor` wrote it.
    pub async fn post_for_edit(&self, requestor: &User, post_id: PostId) -> AppResult<Post> {
        let post = self
            .store
            .get_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;

        if post.author_id != requestor.id {
            return Err(AppError::PermissionDenied(format!(
                "User {} is not the author of post {}",
                requestor.username, post_id
            )));
        }
        Ok(post)
    }

    pub async fn edit_post(
        &self,
        requestor: &User,
        post_id: PostId,
        input: PostFormInput,
    ) -> AppResult<PostId> {
        let post = self.post_for_edit(requestor, post_id).await?;
        let form = self.clean_post_form(input).await?;

        let image = match (&form.image, form.clear_image) {
            (Some(upload), _) => Some(self.media.save_post_image(upload).await?),
            (None, true) => None,
            (None, false) => post.image.clone(),
        };

        let updated = self
            .store
            .update_post(
                post_id,
                PostChanges {
                    text: form.text,
                    group_id: form.group_id,
                    image: image.clone(),
                    pub_date: refreshed_pub_date(post.pub_date),
                },
            )
            .await;

        let outcome = match updated {
            Ok(true) => Ok(()),
            Ok(false) => Err(AppError::NotFound(format!("Post {} not found", post_id))),
            Err(err) => Err(err),
        };

        // Whichever image did not end up on the row is no longer referenced.
        let stale = if outcome.is_ok() {
            post.image.filter(|old| image.as_ref() != Some(old))
        } else {
            image.filter(|new| post.image.as_ref() != Some(new))
        };
        if let Some(stale) = stale {
            self.media.discard_post_image(&stale).await;
        }
        outcome?;

        info!(post_id, author = %requestor.username, "post edited");
        Ok(post_id)
    }

    /// Blank comments are dropped without an error: `Ok(None)`.
    pub async fn add_comment(
        &self,
        requestor: &User,
        post_id: PostId,
        form: CommentForm,
    ) -> AppResult<Option<CommentId>> {
        if self.store.get_post(post_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Post {} not found", post_id)));
        }

        let form = form.cleaned();
        if form.validate().is_err() {
            debug!(post_id, author = %requestor.username, "blank comment dropped");
            return Ok(None);
        }

        let id = self
            .store
            .insert_comment(NewComment {
                post_id,
                author_id: requestor.id,
                text: form.text,
                created: Utc::now(),
            })
            .await?;

        info!(comment_id = id, post_id, author = %requestor.username, "comment added");
        Ok(Some(id))
    }

    /// Follow `author_username`. Following yourself is silently ignored and
    /// following twice keeps a single edge. Returns the resolved author.
    pub async fn follow(&self, requestor: &User, author_username: &str) -> AppResult<User> {
        let author = self.resolve_author(author_username).await?;
        if author.id == requestor.id {
            debug!(user = %requestor.username, "self-follow ignored");
            return Ok(author);
        }

        let created = self
            .store
            .insert_follow(Follow {
                follower_id: requestor.id,
                author_id: author.id,
            })
            .await?;
        if created {
            info!(follower = %requestor.username, author = %author.username, "follow created");
        }
        Ok(author)
    }

    pub async fn unfollow(&self, requestor: &User, author_username: &str) -> AppResult<User> {
        let author = self.resolve_author(author_username).await?;
        let removed = self
            .store
            .delete_follow(Follow {
                follower_id: requestor.id,
                author_id: author.id,
            })
            .await?;
        if removed {
            info!(follower = %requestor.username, author = %author.username, "follow removed");
        }
        Ok(author)
    }

    async fn resolve_author(&self, username: &str) -> AppResult<User> {
        self.store
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))
    }

    /// Field validation plus the foreign-key check on `group`.
    async fn clean_post_form(&self, input: PostFormInput) -> AppResult<PostForm> {
        let form = PostForm::parse(input).map_err(AppError::Validation)?;
        if let Some(group_id) = form.group_id {
            if self.store.get_group(group_id).await?.is_none() {
                return Err(AppError::Validation(FormErrors::single(
                    "group",
                    INVALID_GROUP_MESSAGE,
                )));
            }
        }
        Ok(form)
    }
}

/// Edits move a post to the top of listings; the new date is strictly later
/// than the previous one even under clock skew.
fn refreshed_pub_date(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

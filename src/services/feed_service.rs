// FeedService - read side of the blog: listings, profiles and post detail
// Every listing is newest first and paginated with the configured page size

use std::sync::Arc;

use crate::core::{Page, Paginator};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{BlogStore, PostFilter};
use crate::models::{CommentView, Follow, Group, PostId, PostView, User, UserId};

#[derive(Debug, Clone)]
pub struct GroupListing {
    pub group: Group,
    pub page: Page<PostView>,
}

#[derive(Debug, Clone)]
pub struct ProfileListing {
    pub author: User,
    pub post_count: u64,
    pub follower_count: u64,
    pub following_count: u64,
    /// Whether the viewer follows this author. Always false for anonymous
    /// viewers and for authors looking at their own profile.
    pub is_following: bool,
    pub page: Page<PostView>,
}

#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: PostView,
    /// Oldest first.
    pub comments: Vec<CommentView>,
    pub author_post_count: u64,
}

#[derive(Clone)]
pub struct FeedService {
    store: Arc<dyn BlogStore>,
    page_size: u32,
}

impl FeedService {
    pub fn new(store: Arc<dyn BlogStore>, page_size: u32) -> Self {
        Self { store, page_size }
    }

    pub async fn list_all(&self, page: Option<&str>) -> AppResult<Page<PostView>> {
        self.paginate(PostFilter::All, page).await
    }

    pub async fn list_by_group(&self, slug: &str, page: Option<&str>) -> AppResult<GroupListing> {
        let group = self
            .store
            .find_group_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group {} not found", slug)))?;
        let page = self.paginate(PostFilter::Group(group.id), page).await?;
        Ok(GroupListing { group, page })
    }

    pub async fn list_by_author(
        &self,
        username: &str,
        viewer: Option<UserId>,
        page: Option<&str>,
    ) -> AppResult<ProfileListing> {
        let author = self
            .store
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))?;

        let is_following = async {
            match viewer {
                Some(viewer_id) if viewer_id != author.id => {
                    self.store
                        .follow_exists(Follow {
                            follower_id: viewer_id,
                            author_id: author.id,
                        })
                        .await
                }
                _ => Ok(false),
            }
        };

        let (page, follower_count, following_count, is_following) = futures::try_join!(
            self.paginate(PostFilter::Author(author.id), page),
            self.store.count_followers(author.id),
            self.store.count_following(author.id),
            is_following,
        )?;

        Ok(ProfileListing {
            post_count: page.total,
            author,
            follower_count,
            following_count,
            is_following,
            page,
        })
    }

    /// Posts by every author `viewer_id` follows; empty when they follow nobody.
    pub async fn list_followed_feed(
        &self,
        viewer_id: UserId,
        page: Option<&str>,
    ) -> AppResult<Page<PostView>> {
        self.paginate(PostFilter::FollowedBy(viewer_id), page).await
    }

    pub async fn post_detail(&self, post_id: PostId) -> AppResult<PostDetail> {
        let post = self
            .store
            .get_post_view(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;

        let (comments, author_post_count) = futures::try_join!(
            self.store.list_comments(post_id),
            self.store.count_posts(PostFilter::Author(post.author.id)),
        )?;

        Ok(PostDetail {
            post,
            comments,
            author_post_count,
        })
    }

    async fn paginate(&self, filter: PostFilter, page: Option<&str>) -> AppResult<Page<PostView>> {
        let total = self.store.count_posts(filter).await?;
        let paginator = Paginator::new(total, self.page_size);
        let number = paginator.resolve(page);
        let (limit, offset) = paginator.window(number);

        let items = if total == 0 {
            Vec::new()
        } else {
            self.store.list_posts(filter, limit, offset).await?
        };
        Ok(paginator.page(number, items))
    }
}

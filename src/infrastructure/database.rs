// Database Interface - typed repository operations for the blog
// Implementations own the schema; callers never see SQL

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{
    CommentId, CommentView, Follow, Group, GroupId, NewComment, NewPost, Post, PostChanges,
    PostId, PostView, User, UserId,
};

/// Which posts a listing covers. Every listing is ordered newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(GroupId),
    Author(UserId),
    /// Posts by any author the given user follows.
    FollowedBy(UserId),
}

#[async_trait]
pub trait BlogStore: Send + Sync {
    // Users
    async fn create_user(&self, username: &str, display_name: &str) -> AppResult<User>;
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;

    // Groups
    async fn create_group(&self, slug: &str, title: &str, description: &str) -> AppResult<Group>;
    async fn get_group(&self, id: GroupId) -> AppResult<Option<Group>>;
    async fn find_group_by_slug(&self, slug: &str) -> AppResult<Option<Group>>;
    async fn list_groups(&self) -> AppResult<Vec<Group>>;

    // Posts
    async fn insert_post(&self, post: NewPost) -> AppResult<PostId>;
    /// Returns false when no post has that id.
    async fn update_post(&self, id: PostId, changes: PostChanges) -> AppResult<bool>;
    async fn get_post(&self, id: PostId) -> AppResult<Option<Post>>;
    async fn get_post_view(&self, id: PostId) -> AppResult<Option<PostView>>;
    async fn count_posts(&self, filter: PostFilter) -> AppResult<u64>;
    async fn list_posts(&self, filter: PostFilter, limit: u64, offset: u64)
        -> AppResult<Vec<PostView>>;

    // Comments
    async fn insert_comment(&self, comment: NewComment) -> AppResult<CommentId>;
    /// Oldest first.
    async fn list_comments(&self, post_id: PostId) -> AppResult<Vec<CommentView>>;

    // Follow edges
    /// Returns true when a new edge was written, false when it already existed.
    async fn insert_follow(&self, follow: Follow) -> AppResult<bool>;
    /// Returns true when an edge was removed.
    async fn delete_follow(&self, follow: Follow) -> AppResult<bool>;
    async fn follow_exists(&self, follow: Follow) -> AppResult<bool>;
    async fn count_followers(&self, author_id: UserId) -> AppResult<u64>;
    async fn count_following(&self, follower_id: UserId) -> AppResult<u64>;
}

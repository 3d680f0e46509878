// Blog entities - plain records, owned by the store

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

pub type UserId = i64;
pub type GroupId = i64;
pub type PostId = i64;
pub type CommentId = i64;

/// Characters of text shown wherever a post or comment is displayed inline.
pub const EXCERPT_LEN: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
}

impl User {
    /// Display name, falling back to the username when none was given.
    pub fn name(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.username
        } else {
            &self.display_name
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub id: GroupId,
    pub slug: String,
    pub title: String,
    pub description: String,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: PostId,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: UserId,
    pub group_id: Option<GroupId>,
    /// Path relative to the media root, e.g. `posts/cat.gif`.
    pub image: Option<String>,
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&excerpt(&self.text, EXCERPT_LEN))
    }
}

/// A post joined with its author and group, as listings display it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostView {
    pub post: Post,
    pub author: User,
    pub group: Option<Group>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub text: String,
    pub created: DateTime<Utc>,
    pub author_id: UserId,
    pub post_id: PostId,
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&excerpt(&self.text, EXCERPT_LEN))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentView {
    pub comment: Comment,
    pub author: User,
}

/// Directed edge: `follower` reads `author`'s posts in their feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Follow {
    pub follower_id: UserId,
    pub author_id: UserId,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: UserId,
    pub text: String,
    pub group_id: Option<GroupId>,
    pub image: Option<String>,
    pub pub_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<GroupId>,
    pub image: Option<String>,
    pub pub_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: PostId,
    pub author_id: UserId,
    pub text: String,
    pub created: DateTime<Utc>,
}

/// First `len` characters of `text`, never splitting a character.
pub fn excerpt(text: &str, len: usize) -> String {
    text.chars().take(len).collect()
}

/// Timestamps are stored as microseconds since the Unix epoch.
pub fn to_micros(time: &DateTime<Utc>) -> i64 {
    time.timestamp_micros()
}

pub fn from_micros(micros: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_micros(micros).unwrap_or_default()
}

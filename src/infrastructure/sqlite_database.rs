use async_trait::async_trait;
use sqlx::{
    sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
    QueryBuilder, Row,
};
use std::str::FromStr;

use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{BlogStore, PostFilter};
use crate::models::{
    from_micros, to_micros, Comment, CommentId, CommentView, Follow, Group, GroupId, NewComment,
    NewPost, Post, PostChanges, PostId, PostView, User, UserId,
};

const POST_VIEW_COLUMNS: &str = "p.id, p.text, p.pub_date, p.author_id, p.group_id, p.image, \
     u.username AS author_username, u.display_name AS author_display_name, \
     g.slug AS group_slug, g.title AS group_title, g.description AS group_description";

const POST_VIEW_FROM: &str = " FROM posts p \
     JOIN users u ON u.id = p.author_id \
     LEFT JOIN communities g ON g.id = p.group_id";

/// SQLite implementation of the blog store
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| {
                AppError::Configuration(format!("Invalid database URL {}: {}", database_url, e))
            })?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to connect to {}: {}", database_url, e))
            })?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// In-memory store for tests. A single connection that never expires keeps
    /// the database alive for the lifetime of the pool.
    pub async fn new_in_memory() -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AppError::Configuration(format!("Invalid in-memory URL: {}", e)))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to connect to in-memory SQLite: {}", e))
            })?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Direct pool access for maintenance tasks outside the store interface.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the blog tables if they do not exist yet
    pub async fn initialize(&self) -> AppResult<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                display_name TEXT NOT NULL DEFAULT ''
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS communities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT ''
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text TEXT NOT NULL,
                pub_date INTEGER NOT NULL,
                author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                group_id INTEGER REFERENCES communities(id) ON DELETE SET NULL,
                image TEXT
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text TEXT NOT NULL,
                created INTEGER NOT NULL,
                author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS follows (
                follower_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                PRIMARY KEY (follower_id, author_id),
                CHECK (follower_id <> author_id)
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_posts_pub_date ON posts(pub_date DESC, id DESC)",
            "CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id, pub_date DESC)",
            "CREATE INDEX IF NOT EXISTS idx_posts_group ON posts(group_id, pub_date DESC)",
            "CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id, created)",
            "CREATE INDEX IF NOT EXISTS idx_follows_author ON follows(author_id)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::Database(format!("Failed to create schema: {}", e)))?;
        }
        Ok(())
    }

    fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: PostFilter) {
        match filter {
            PostFilter::All => {}
            PostFilter::Group(group_id) => {
                qb.push(" WHERE p.group_id = ");
                qb.push_bind(group_id);
            }
            PostFilter::Author(author_id) => {
                qb.push(" WHERE p.author_id = ");
                qb.push_bind(author_id);
            }
            PostFilter::FollowedBy(follower_id) => {
                qb.push(" WHERE p.author_id IN (SELECT author_id FROM follows WHERE follower_id = ");
                qb.push_bind(follower_id);
                qb.push(")");
            }
        }
    }
}

fn user_from_row(row: &SqliteRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        display_name: row.get("display_name"),
    }
}

fn group_from_row(row: &SqliteRow) -> Group {
    Group {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        description: row.get("description"),
    }
}

fn post_from_row(row: &SqliteRow) -> Post {
    Post {
        id: row.get("id"),
        text: row.get("text"),
        pub_date: from_micros(row.get("pub_date")),
        author_id: row.get("author_id"),
        group_id: row.get("group_id"),
        image: row.get("image"),
    }
}

fn post_view_from_row(row: &SqliteRow) -> PostView {
    let post = post_from_row(row);
    let author = User {
        id: post.author_id,
        username: row.get("author_username"),
        display_name: row.get("author_display_name"),
    };
    let group = post.group_id.map(|id| Group {
        id,
        slug: row.get("group_slug"),
        title: row.get("group_title"),
        description: row.get("group_description"),
    });
    PostView {
        post,
        author,
        group,
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl BlogStore for SqliteStore {
    async fn create_user(&self, username: &str, display_name: &str) -> AppResult<User> {
        let result = sqlx::query("INSERT INTO users (username, display_name) VALUES (?, ?)")
            .bind(username)
            .bind(display_name)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => Ok(User {
                id: done.last_insert_rowid(),
                username: username.to_string(),
                display_name: display_name.to_string(),
            }),
            Err(e) if is_unique_violation(&e) => Err(AppError::Validation(
                crate::forms::FormErrors::single("username", "A user with that username already exists."),
            )),
            Err(e) => Err(AppError::Database(format!("Failed to create user {}: {}", username, e))),
        }
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT id, username, display_name FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to find user {}: {}", username, e)))?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn create_group(&self, slug: &str, title: &str, description: &str) -> AppResult<Group> {
        let result = sqlx::query("INSERT INTO communities (slug, title, description) VALUES (?, ?, ?)")
            .bind(slug)
            .bind(title)
            .bind(description)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => Ok(Group {
                id: done.last_insert_rowid(),
                slug: slug.to_string(),
                title: title.to_string(),
                description: description.to_string(),
            }),
            Err(e) if is_unique_violation(&e) => Err(AppError::Validation(
                crate::forms::FormErrors::single("slug", "A group with that slug already exists."),
            )),
            Err(e) => Err(AppError::Database(format!("Failed to create group {}: {}", slug, e))),
        }
    }

    async fn get_group(&self, id: GroupId) -> AppResult<Option<Group>> {
        let row = sqlx::query("SELECT id, slug, title, description FROM communities WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to get group {}: {}", id, e)))?;
        Ok(row.as_ref().map(group_from_row))
    }

    async fn find_group_by_slug(&self, slug: &str) -> AppResult<Option<Group>> {
        let row = sqlx::query("SELECT id, slug, title, description FROM communities WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to find group {}: {}", slug, e)))?;
        Ok(row.as_ref().map(group_from_row))
    }

    async fn list_groups(&self) -> AppResult<Vec<Group>> {
        let rows = sqlx::query("SELECT id, slug, title, description FROM communities ORDER BY title")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to list groups: {}", e)))?;
        Ok(rows.iter().map(group_from_row).collect())
    }

    async fn insert_post(&self, post: NewPost) -> AppResult<PostId> {
        let done = sqlx::query(
            "INSERT INTO posts (text, pub_date, author_id, group_id, image) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&post.text)
        .bind(to_micros(&post.pub_date))
        .bind(post.author_id)
        .bind(post.group_id)
        .bind(&post.image)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to create post for user {}: {}", post.author_id, e))
        })?;
        Ok(done.last_insert_rowid())
    }

    async fn update_post(&self, id: PostId, changes: PostChanges) -> AppResult<bool> {
        let done = sqlx::query(
            "UPDATE posts SET text = ?, group_id = ?, image = ?, pub_date = ? WHERE id = ?",
        )
        .bind(&changes.text)
        .bind(changes.group_id)
        .bind(&changes.image)
        .bind(to_micros(&changes.pub_date))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to update post {}: {}", id, e)))?;
        Ok(done.rows_affected() > 0)
    }

    async fn get_post(&self, id: PostId) -> AppResult<Option<Post>> {
        let row = sqlx::query(
            "SELECT id, text, pub_date, author_id, group_id, image FROM posts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to get post {}: {}", id, e)))?;
        Ok(row.as_ref().map(post_from_row))
    }

    async fn get_post_view(&self, id: PostId) -> AppResult<Option<PostView>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT ");
        qb.push(POST_VIEW_COLUMNS);
        qb.push(POST_VIEW_FROM);
        qb.push(" WHERE p.id = ");
        qb.push_bind(id);

        let row = qb
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to get post {}: {}", id, e)))?;
        Ok(row.as_ref().map(post_view_from_row))
    }

    async fn count_posts(&self, filter: PostFilter) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) AS total FROM posts p");
        Self::push_filter(&mut qb, filter);

        let row = qb
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to count posts: {}", e)))?;
        Ok(row.get::<i64, _>("total").max(0) as u64)
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<PostView>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT ");
        qb.push(POST_VIEW_COLUMNS);
        qb.push(POST_VIEW_FROM);
        Self::push_filter(&mut qb, filter);
        qb.push(" ORDER BY p.pub_date DESC, p.id DESC LIMIT ");
        qb.push_bind(limit as i64);
        qb.push(" OFFSET ");
        qb.push_bind(offset as i64);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to list posts: {}", e)))?;
        Ok(rows.iter().map(post_view_from_row).collect())
    }

    async fn insert_comment(&self, comment: NewComment) -> AppResult<CommentId> {
        let done = sqlx::query(
            "INSERT INTO comments (text, created, author_id, post_id) VALUES (?, ?, ?, ?)",
        )
        .bind(&comment.text)
        .bind(to_micros(&comment.created))
        .bind(comment.author_id)
        .bind(comment.post_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::Database(format!(
                "Failed to create comment on post {}: {}",
                comment.post_id, e
            ))
        })?;
        Ok(done.last_insert_rowid())
    }

    async fn list_comments(&self, post_id: PostId) -> AppResult<Vec<CommentView>> {
        let rows = sqlx::query(
            "SELECT c.id, c.text, c.created, c.author_id, c.post_id, \
             u.username, u.display_name \
             FROM comments c JOIN users u ON u.id = c.author_id \
             WHERE c.post_id = ? ORDER BY c.created, c.id",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to list comments of post {}: {}", post_id, e))
        })?;

        let comments = rows
            .iter()
            .map(|row| {
                let comment = Comment {
                    id: row.get("id"),
                    text: row.get("text"),
                    created: from_micros(row.get("created")),
                    author_id: row.get("author_id"),
                    post_id: row.get("post_id"),
                };
                let author = User {
                    id: comment.author_id,
                    username: row.get("username"),
                    display_name: row.get("display_name"),
                };
                CommentView { comment, author }
            })
            .collect();
        Ok(comments)
    }

    async fn insert_follow(&self, follow: Follow) -> AppResult<bool> {
        let done = sqlx::query("INSERT OR IGNORE INTO follows (follower_id, author_id) VALUES (?, ?)")
            .bind(follow.follower_id)
            .bind(follow.author_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::Database(format!(
                    "Failed to create follow {} -> {}: {}",
                    follow.follower_id, follow.author_id, e
                ))
            })?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete_follow(&self, follow: Follow) -> AppResult<bool> {
        let done = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND author_id = ?")
            .bind(follow.follower_id)
            .bind(follow.author_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::Database(format!(
                    "Failed to delete follow {} -> {}: {}",
                    follow.follower_id, follow.author_id, e
                ))
            })?;
        Ok(done.rows_affected() > 0)
    }

    async fn follow_exists(&self, follow: Follow) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM follows WHERE follower_id = ? AND author_id = ?")
            .bind(follow.follower_id)
            .bind(follow.author_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to check follow: {}", e)))?;
        Ok(row.is_some())
    }

    async fn count_followers(&self, author_id: UserId) -> AppResult<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE author_id = ?")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to count followers: {}", e)))?;
        Ok(total.max(0) as u64)
    }

    async fn count_following(&self, follower_id: UserId) -> AppResult<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE follower_id = ?")
            .bind(follower_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to count following: {}", e)))?;
        Ok(total.max(0) as u64)
    }
}

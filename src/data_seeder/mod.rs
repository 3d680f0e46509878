// Data seeder - demo users, groups, follows and posts
// Safe to run repeatedly: existing records are reused, never duplicated

use chrono::{Duration, Utc};
use tracing::info;

use crate::error::AppResult;
use crate::infrastructure::database::{BlogStore, PostFilter};
use crate::models::{Follow, Group, GroupId, NewPost, User};

const DEMO_USERS: &[(&str, &str)] = &[
    ("leo", "Leo Tolstoy"),
    ("anna", "Anna Akhmatova"),
    ("fyodor", "Fyodor Dostoevsky"),
];

const DEMO_GROUPS: &[(&str, &str, &str)] = &[
    ("novels", "Novels", "Long-form fiction and the people who write it."),
    ("poetry", "Poetry", "Verse, old and new."),
];

/// (author, group slug, text)
const DEMO_POSTS: &[(&str, Option<&str>, &str)] = &[
    ("leo", Some("novels"), "All happy families are alike; each unhappy family is unhappy in its own way."),
    ("leo", None, "Everyone thinks of changing the world, but no one thinks of changing himself."),
    ("anna", Some("poetry"), "I taught myself to live simply and wisely."),
    ("fyodor", Some("novels"), "Pain and suffering are always inevitable for a large intelligence and a deep heart."),
];

/// (follower, author)
const DEMO_FOLLOWS: &[(&str, &str)] = &[("anna", "leo"), ("fyodor", "leo"), ("leo", "anna")];

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub users_created: usize,
    pub groups_created: usize,
    pub posts_created: usize,
    pub follows_created: usize,
}

pub async fn seed_demo_data(store: &dyn BlogStore) -> AppResult<SeedSummary> {
    let mut summary = SeedSummary::default();

    let mut users = Vec::with_capacity(DEMO_USERS.len());
    for (username, display_name) in DEMO_USERS {
        let user = match store.find_user_by_username(username).await? {
            Some(user) => user,
            None => {
                summary.users_created += 1;
                store.create_user(username, display_name).await?
            }
        };
        users.push(user);
    }

    let mut groups = Vec::with_capacity(DEMO_GROUPS.len());
    for (slug, title, description) in DEMO_GROUPS {
        let group = match store.find_group_by_slug(slug).await? {
            Some(group) => group,
            None => {
                summary.groups_created += 1;
                store.create_group(slug, title, description).await?
            }
        };
        groups.push(group);
    }

    for (follower, author) in DEMO_FOLLOWS {
        let (Some(follower), Some(author)) = (find_user(&users, follower), find_user(&users, author))
        else {
            continue;
        };
        let edge = Follow {
            follower_id: follower.id,
            author_id: author.id,
        };
        if store.insert_follow(edge).await? {
            summary.follows_created += 1;
        }
    }

    let start = Utc::now() - Duration::minutes(DEMO_POSTS.len() as i64);
    for user in &users {
        if store.count_posts(PostFilter::Author(user.id)).await? > 0 {
            continue;
        }
        for (i, (_, slug, text)) in DEMO_POSTS
            .iter()
            .enumerate()
            .filter(|(_, (author, _, _))| *author == user.username)
        {
            store
                .insert_post(NewPost {
                    author_id: user.id,
                    text: text.to_string(),
                    group_id: slug.and_then(|slug| find_group(&groups, slug)),
                    image: None,
                    pub_date: start + Duration::minutes(i as i64),
                })
                .await?;
            summary.posts_created += 1;
        }
    }

    info!(?summary, "demo data seeded");
    Ok(summary)
}

fn find_user<'a>(users: &'a [User], username: &str) -> Option<&'a User> {
    users.iter().find(|user| user.username == username)
}

fn find_group(groups: &[Group], slug: &str) -> Option<GroupId> {
    groups.iter().find(|group| group.slug == slug).map(|group| group.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sqlite_database::SqliteStore;

    #[tokio::test]
    async fn test_seeding_twice_creates_nothing_new() {
        let store = SqliteStore::new_in_memory().await.unwrap();

        let first = seed_demo_data(&store).await.unwrap();
        assert_eq!(first.users_created, DEMO_USERS.len());
        assert_eq!(first.groups_created, DEMO_GROUPS.len());
        assert_eq!(first.posts_created, DEMO_POSTS.len());
        assert_eq!(first.follows_created, DEMO_FOLLOWS.len());

        let second = seed_demo_data(&store).await.unwrap();
        assert_eq!(second, SeedSummary::default());
        assert_eq!(
            store.count_posts(PostFilter::All).await.unwrap(),
            DEMO_POSTS.len() as u64
        );
    }

    #[tokio::test]
    async fn test_seeded_feed_follows_authors() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        seed_demo_data(&store).await.unwrap();

        let anna = store.find_user_by_username("anna").await.unwrap().unwrap();
        let feed = store
            .list_posts(PostFilter::FollowedBy(anna.id), 10, 0)
            .await
            .unwrap();
        assert_eq!(feed.len(), 2);
        assert!(feed.iter().all(|view| view.author.username == "leo"));
    }
}

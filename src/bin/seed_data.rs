// Seed Data - fills the configured database with demo content

use tracing_subscriber::EnvFilter;

use yatube::{config::Config, data_seeder::seed_demo_data, infrastructure::SqliteStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("yatube=info")),
        )
        .init();

    let config = Config::from_env()?;
    let store = SqliteStore::connect(&config.database.url, config.database.max_connections).await?;

    let summary = seed_demo_data(&store).await?;
    println!(
        "Seeded {} users, {} groups, {} posts, {} follows into {}",
        summary.users_created,
        summary.groups_created,
        summary.posts_created,
        summary.follows_created,
        config.database.url
    );
    Ok(())
}

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub site: SiteConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub capacity: usize,
    pub index_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Entry point of the external authentication service.
    pub login_url: String,
    /// Header set by the trusted upstream with the signed-in username.
    pub user_header: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub root: PathBuf,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite:yatube.db?mode=rwc".to_string()),
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 5)?,
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env("SERVER_PORT", 8000)?,
            },
            cache: CacheConfig {
                capacity: parse_env("CACHE_CAPACITY", 1000)?,
                index_ttl_secs: parse_env("INDEX_CACHE_TTL_SECS", 20)?,
            },
            site: SiteConfig {
                page_size: parse_env("PAGE_SIZE", 10)?,
            },
            auth: AuthConfig {
                login_url: env::var("LOGIN_URL").unwrap_or_else(|_| "/auth/login/".to_string()),
                user_header: env::var("AUTH_USER_HEADER")
                    .unwrap_or_else(|_| "x-remote-user".to_string())
                    .to_ascii_lowercase(),
            },
            media: MediaConfig {
                root: env::var("MEDIA_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("media")),
                max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 5 * 1024 * 1024)?,
            },
        })
    }

    /// Settings for tests and embedding: in-memory store, temp media root.
    pub fn in_memory(media_root: impl Into<PathBuf>) -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            cache: CacheConfig {
                capacity: 100,
                index_ttl_secs: 20,
            },
            site: SiteConfig { page_size: 10 },
            auth: AuthConfig {
                login_url: "/auth/login/".to_string(),
                user_header: "x-remote-user".to_string(),
            },
            media: MediaConfig {
                root: media_root.into(),
                max_upload_bytes: 5 * 1024 * 1024,
            },
        }
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn index_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.index_ttl_secs)
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> AppResult<T> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            AppError::Configuration(format!("{} has an invalid value: {:?}", key, raw))
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_falls_back_to_default() {
        let value: u32 = parse_env("YATUBE_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        env::set_var("YATUBE_TEST_BAD_PORT", "eighty");
        let result: AppResult<u16> = parse_env("YATUBE_TEST_BAD_PORT", 80);
        assert!(matches!(result, Err(AppError::Configuration(_))));
        env::remove_var("YATUBE_TEST_BAD_PORT");
    }

    #[test]
    fn test_in_memory_defaults() {
        let config = Config::in_memory("/tmp/media");
        assert_eq!(config.site.page_size, 10);
        assert_eq!(config.index_cache_ttl(), Duration::from_secs(20));
        assert_eq!(config.auth.login_url, "/auth/login/");
    }
}

// Core infrastructure modules
pub mod database;        // Store interface
pub mod sqlite_database; // SQLite store
pub mod cache;           // Page cache
pub mod media;           // Uploaded images
pub mod viewer;          // Viewer context
pub mod middleware;      // Viewer resolution and extractors

pub use cache::PageCache;
pub use database::{BlogStore, PostFilter};
pub use media::{ImageUpload, MediaStorage};
pub use sqlite_database::SqliteStore;
pub use viewer::ViewerContext;

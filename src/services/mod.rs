// Services - business logic between the web layer and the store
pub mod feed_service; // Listings, profiles and post detail
pub mod post_service; // Posts, comments and follows

pub use feed_service::{FeedService, GroupListing, PostDetail, ProfileListing};
pub use post_service::PostService;

// ViewerContext middleware and extractors
// Handlers only ever see the resolved viewer, never raw auth headers

pub mod viewer_context_extractor;
pub mod viewer_context_middleware;

pub use viewer_context_extractor::{login_redirect, CurrentUser, Vc};
pub use viewer_context_middleware::viewer_context_middleware;

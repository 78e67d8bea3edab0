//! HTTP surface: request context, middleware pipeline, handlers, and the
//! server lifecycle.

pub mod context;
pub mod handlers;
pub mod middleware;
pub mod module;

pub use context::RequestContext;
pub use handlers::AppState;
pub use module::{build_router, ServerModule};

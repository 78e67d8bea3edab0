//! HTTP handlers and the shared application state.

use std::sync::Arc;
use std::time::Instant;

use crate::account::AccountService;
use crate::auth::AuthFacade;
use crate::store::UserStore;

mod auth;
mod health;
mod users;

pub use auth::login_handler;
pub use health::health_handler;
pub use users::{profile_handler, registration_handler};

/// Shared state handed to every handler.
///
/// All members are cheaply cloneable handles; the state itself is cloned
/// per request by axum.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthFacade>,
    pub accounts: Arc<AccountService>,
    pub store: Arc<dyn UserStore>,
    pub start_time: Instant,
}

//! Gatekey core -- domain model and wire types shared across the service.

pub mod api;
pub mod events;
pub mod identity;
pub mod user;

pub use api::{
    ErrorBody, LoginRequest, LoginResponse, ProfileResponse, RegistrationRequest,
    RegistrationResponse,
};
pub use events::RegistrationEvent;
pub use identity::TokenPayload;
pub use user::{User, UserResponse};

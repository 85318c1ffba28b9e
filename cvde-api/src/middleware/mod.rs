pub mod auth;

pub use auth::{admin_auth_middleware, vet_auth_middleware, PortalClaims};

//! Authentication and authorization helpers.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`host`] -- Loads a debate session and checks host / participant access.

pub mod auth;
pub mod host;

//! Authentication and authorization primitives.
//!
//! - [`password`] -- password rules and Argon2id hashing on the blocking pool.
//! - [`jwt`] -- access tokens naming the user and login, plus refresh tokens.
//! - [`video`] -- room tokens for the external video conferencing provider.

pub mod jwt;
pub mod password;
pub mod video;

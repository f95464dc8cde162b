//! Row models and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - `Deserialize` request DTOs or plain insert DTOs where the row is created

pub mod debate_session;
pub mod login;
pub mod participant;
pub mod session_event;
pub mod user;

pub mod auth;
pub mod debate_session;
pub mod timer;

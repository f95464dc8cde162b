//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod debate_session_repo;
pub mod login_repo;
pub mod participant_repo;
pub mod session_event_repo;
pub mod user_repo;

pub use debate_session_repo::DebateSessionRepo;
pub use login_repo::LoginRepo;
pub use participant_repo::ParticipantRepo;
pub use session_event_repo::SessionEventRepo;
pub use user_repo::UserRepo;

//! Well-known account role name constants.
//!
//! These must match the `ck_users_role` constraint in the users migration.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_COACH: &str = "coach";
pub const ROLE_DEBATER: &str = "debater";

/// Role assigned to self-registered accounts.
pub const DEFAULT_ROLE: &str = ROLE_DEBATER;

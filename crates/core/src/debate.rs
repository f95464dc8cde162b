//! Debate session constants and validation.
//!
//! Lives in `core` so the repositories, API handlers, and clients agree on
//! formats, participant roles, and field limits.

use crate::types::DbId;

// ---------------------------------------------------------------------------
// Formats
// ---------------------------------------------------------------------------

/// Known debate formats.
pub mod formats {
    pub const BRITISH_PARLIAMENTARY: &str = "british_parliamentary";
    pub const WORLD_SCHOOLS: &str = "world_schools";
    pub const POLICY: &str = "policy";
    pub const PUBLIC_FORUM: &str = "public_forum";
    pub const LINCOLN_DOUGLAS: &str = "lincoln_douglas";
    /// Solo or informal practice round.
    pub const PRACTICE: &str = "practice";
}

pub const VALID_FORMATS: &[&str] = &[
    formats::BRITISH_PARLIAMENTARY,
    formats::WORLD_SCHOOLS,
    formats::POLICY,
    formats::PUBLIC_FORUM,
    formats::LINCOLN_DOUGLAS,
    formats::PRACTICE,
];

// ---------------------------------------------------------------------------
// Participant roles
// ---------------------------------------------------------------------------

/// Roles a user can hold inside a debate session.
pub mod participant_roles {
    pub const HOST: &str = "host";
    pub const DEBATER: &str = "debater";
    pub const JUDGE: &str = "judge";
    pub const OBSERVER: &str = "observer";
}

/// Roles a user may request when joining. `host` is assigned at creation only.
pub const JOINABLE_ROLES: &[&str] = &[
    participant_roles::DEBATER,
    participant_roles::JUDGE,
    participant_roles::OBSERVER,
];

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_MOTION_LEN: usize = 500;

pub const DEFAULT_LIST_LIMIT: i64 = 20;
pub const MAX_LIST_LIMIT: i64 = 100;

/// Prefix of generated video room names.
pub const ROOM_NAME_PREFIX: &str = "podium-";

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

pub fn validate_title(title: &str) -> Result<(), String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err("Title must not be empty".to_string());
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        ));
    }
    Ok(())
}

pub fn validate_motion(motion: Option<&str>) -> Result<(), String> {
    match motion {
        Some(m) if m.chars().count() > MAX_MOTION_LEN => Err(format!(
            "Motion must be at most {MAX_MOTION_LEN} characters"
        )),
        _ => Ok(()),
    }
}

pub fn validate_format(format: &str) -> Result<(), String> {
    if !VALID_FORMATS.contains(&format) {
        return Err(format!(
            "Invalid format '{format}'. Must be one of: {}",
            VALID_FORMATS.join(", ")
        ));
    }
    Ok(())
}

pub fn validate_join_role(role: &str) -> Result<(), String> {
    if !JOINABLE_ROLES.contains(&role) {
        return Err(format!(
            "Invalid role '{role}'. Must be one of: {}",
            JOINABLE_ROLES.join(", ")
        ));
    }
    Ok(())
}

pub fn validate_session_id(session_id: DbId) -> Result<(), String> {
    if session_id <= 0 {
        return Err(format!("session_id must be positive, got {session_id}"));
    }
    Ok(())
}

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_formats_validate() {
        for format in VALID_FORMATS {
            assert!(validate_format(format).is_ok());
        }
        assert!(validate_format("Policy").is_err());
        assert!(validate_format("").is_err());
    }

    #[test]
    fn host_is_not_joinable() {
        assert!(validate_join_role("observer").is_ok());
        assert!(validate_join_role("judge").is_ok());
        let err = validate_join_role("host").unwrap_err();
        assert!(err.contains("debater, judge, observer"));
    }

    #[test]
    fn title_must_be_present_and_bounded() {
        assert!(validate_title("Round 1").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(MAX_TITLE_LEN + 1)).is_err());
    }

    #[test]
    fn motion_is_optional_but_bounded() {
        assert!(validate_motion(None).is_ok());
        assert!(validate_motion(Some("This house would ban homework")).is_ok());
        assert!(validate_motion(Some(&"m".repeat(MAX_MOTION_LEN + 1))).is_err());
    }

    #[test]
    fn clamp_limit_bounds() {
        assert_eq!(clamp_limit(None, 20, 100), 20);
        assert_eq!(clamp_limit(Some(500), 20, 100), 100);
        assert_eq!(clamp_limit(Some(0), 20, 100), 1);
    }

    #[test]
    fn clamp_offset_floors_at_zero() {
        assert_eq!(clamp_offset(Some(-3)), 0);
        assert_eq!(clamp_offset(Some(40)), 40);
    }
}

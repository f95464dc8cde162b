//! Podium domain core.
//!
//! Pure, IO-free building blocks shared by the database layer, the API
//! server, and the timer client:
//!
//! - [`timer`] -- the shared countdown state machine and its snapshots.
//! - [`realtime`] -- the JSON WebSocket protocol for timer change notifications.
//! - [`debate`] -- debate formats, participant roles, and input validation.
//! - [`event_types`] -- canonical domain event names.

pub mod debate;
pub mod error;
pub mod event_types;
pub mod realtime;
pub mod roles;
pub mod timer;
pub mod types;

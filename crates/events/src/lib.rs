//! Podium domain event bus.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`DomainEvent`] -- the event envelope shared by the API server and the
//!   real-time fan-out.
//! - [`EventPersistence`] -- background service that appends every event to
//!   the `session_events` table.

pub mod bus;
pub mod persistence;

pub use bus::{DomainEvent, EventBus};
pub use persistence::EventPersistence;

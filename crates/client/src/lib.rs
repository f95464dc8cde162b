//! `podium-client` library crate.
//!
//! Client-side pieces of the shared debate timer: the host controller,
//! the countdown ticker, the WebSocket change subscriber, and the
//! reconciled [`display::TimerDisplay`] they all write to, plus the
//! [`auth::TokenSource`] that keeps a long-running client signed in. The
//! binary entrypoint lives in `main.rs`.

pub mod alert;
pub mod api;
pub mod auth;
pub mod display;
pub mod error;
pub mod host;
pub mod local;
pub mod subscriber;
pub mod ticker;

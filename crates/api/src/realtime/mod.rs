//! Real-time delivery of timer changes to subscribed WebSocket clients.

pub mod fanout;

pub use fanout::TimerFanout;

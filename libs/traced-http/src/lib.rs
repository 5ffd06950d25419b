//! Outgoing HTTP with tracing: every request runs inside an `outgoing_http`
//! span and carries a W3C `traceparent` header.

pub mod client;
pub mod trace_context;

pub use client::TracedClient;

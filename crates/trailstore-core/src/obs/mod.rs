//! Observability: metrics events and the in-memory recorder.
//!
//! Structured logs go through `tracing` at the call sites; this module only
//! carries counters.
pub mod metrics;
pub mod sink;

//! Observability setup for dagctl: structured logging and optional
//! OpenTelemetry span export.

pub mod tracing_setup;

//! Observability setup for botgate: tracing subscriber installation with
//! human or JSON output and optional OpenTelemetry span export.

pub mod tracing_setup;

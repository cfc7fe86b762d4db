//! Telemetry setup shared by playlog binaries and tests.

pub mod tracing;

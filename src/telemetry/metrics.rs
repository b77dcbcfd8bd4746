//! Metric instrument factories for vinhunt.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! Without an OTLP endpoint the global provider is a no-op.

use opentelemetry::metrics::{Counter, Histogram, Meter};

fn meter() -> Meter {
    opentelemetry::global::meter("vinhunt")
}

/// Counter: record lookups made.
/// Labels: `result` ("found" | "not_found" | "error").
pub fn lookups() -> Counter<u64> {
    meter()
        .u64_counter("vinhunt.lookups")
        .with_description("Number of record lookups made")
        .build()
}

/// Histogram: lookup round-trip time in milliseconds.
/// Labels: `service`.
pub fn lookup_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("vinhunt.lookup.duration_ms")
        .with_description("Record lookup duration in milliseconds")
        .with_unit("ms")
        .build()
}

/// Counter: work items finished by this bot.
/// Labels: `outcome` ("found" | "exhausted" | "rejected" | "released").
pub fn items() -> Counter<u64> {
    meter()
        .u64_counter("vinhunt.items")
        .with_description("Number of work items finished")
        .build()
}

/// Counter: queue table operations.
/// Labels: `operation`.
pub fn queue_operations() -> Counter<u64> {
    meter()
        .u64_counter("vinhunt.queue.operations")
        .with_description("Number of work queue operations")
        .build()
}

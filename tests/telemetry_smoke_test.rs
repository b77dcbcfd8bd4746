//! Smoke test for OTLP export.
//!
//! Requires a collector listening on localhost:4317 (e.g. the
//! `otel/opentelemetry-collector` image). Run with:
//! ```sh
//! cargo test --test telemetry_smoke_test -- --ignored --nocapture
//! ```

use std::time::Duration;

use opentelemetry::KeyValue;
use vinhunt::model::work::WorkId;
use vinhunt::telemetry::{TelemetryConfig, init_telemetry, metrics, work};

#[test]
#[ignore]
fn smoke_otlp_export() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let guard = init_telemetry(TelemetryConfig {
            endpoint: Some("http://localhost:4317".to_string()),
            service_name: "vinhunt-smoke-test".to_string(),
            log_level: "debug".to_string(),
            log_file: None,
        })
        .expect("failed to init telemetry");

        {
            let span = work::start_item_span("smoke_bot", WorkId(1), "000001");
            let _enter = span.enter();
            work::record_state_transition(&span, "unclaimed", "claimed");
            tracing::info!(vin = "1FA6P8R08P5000001", "smoke lookup");
        }

        metrics::lookups().add(1, &[KeyValue::new("result", "not_found")]);
        metrics::lookup_duration_ms().record(42.5, &[KeyValue::new("service", "smoke")]);
        metrics::items().add(1, &[KeyValue::new("outcome", "exhausted")]);
        metrics::queue_operations().add(1, &[KeyValue::new("operation", "acquire")]);

        guard.force_flush();
        tokio::time::sleep(Duration::from_secs(2)).await;
    });
}

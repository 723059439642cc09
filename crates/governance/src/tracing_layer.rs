//! Distributed tracing configuration.

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, trace as sdktrace, Resource};
use tracing::Subscriber;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use verdant_core::{Error, Result};

/// `service.name` reported to the collector.
pub const SERVICE_NAME: &str = "verdant-orchestrator";

/// Configure logging with an optional OpenTelemetry exporter.
///
/// `RUST_LOG` overrides the default filter. When `json_logs` is set, log
/// lines are emitted as JSON objects. The OTLP layer is added only when
/// `OTEL_EXPORTER_OTLP_ENDPOINT` is present.
pub fn configure_tracing(json_logs: bool) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,verdant=debug".into()),
    );

    let fmt_layer = if json_logs {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    let registry = tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter);

    if let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        tracing::info!(endpoint = %endpoint, "Initializing OpenTelemetry tracing");

        registry
            .with(otlp_layer(&endpoint)?)
            .try_init()
            .map_err(|e| Error::internal(format!("Failed to install subscriber: {}", e)))?;
    } else {
        registry
            .try_init()
            .map_err(|e| Error::internal(format!("Failed to install subscriber: {}", e)))?;
    }

    Ok(())
}

/// OTLP export layer. The provider is installed globally so it outlives the
/// returned tracer. Must be called inside a Tokio runtime.
pub fn otlp_layer<S>(endpoint: &str) -> Result<OpenTelemetryLayer<S, sdktrace::Tracer>>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let provider = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint),
        )
        .with_trace_config(sdktrace::Config::default().with_resource(Resource::new(vec![
            KeyValue::new("service.name", SERVICE_NAME),
        ])))
        .install_batch(runtime::Tokio)
        .map_err(|e| Error::internal(format!("Failed to install OTLP pipeline: {}", e)))?;

    let tracer = provider.tracer(SERVICE_NAME);
    global::set_tracer_provider(provider);

    Ok(tracing_opentelemetry::layer().with_tracer(tracer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_otlp_layer_builds_without_collector() {
        let layer = otlp_layer::<tracing_subscriber::Registry>("http://127.0.0.1:4317");
        assert!(layer.is_ok());
    }
}

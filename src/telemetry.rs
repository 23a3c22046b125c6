use anyhow::{Context, Result, anyhow, bail};
use opentelemetry::trace::{TraceContextExt, Tracer, TracerProvider as _};
use opentelemetry::{Context as OtelContext, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider, SpanExporter};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const SERVICE_NAME: &str = "contractor";
const TRACES_PATH: &str = "/v1/traces";

/// Exports the spans of one contractor run over OTLP.
pub(crate) struct Telemetry {
    tracer: SdkTracer,
    provider: SdkTracerProvider,
}

impl Telemetry {
    /// Connects to an OTLP HTTP collector. A bare `http://host:port`
    /// endpoint gets the standard traces path.
    pub(crate) fn new(endpoint: String) -> Result<Self> {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_http()
            .with_endpoint(traces_endpoint(&endpoint)?)
            .build()
            .context("build OTLP span exporter")?;
        Ok(Self::with_exporter(exporter))
    }

    fn with_exporter<E: SpanExporter + 'static>(exporter: E) -> Self {
        let provider = SdkTracerProvider::builder()
            .with_resource(Resource::builder().with_service_name(SERVICE_NAME).build())
            .with_batch_exporter(exporter)
            .build();
        Self {
            tracer: provider.tracer(SERVICE_NAME),
            provider,
        }
    }

    /// A context holding a new span under `parent`.
    fn start(&self, name: &str, attributes: &[KeyValue], parent: &OtelContext) -> OtelContext {
        let span = self
            .tracer
            .span_builder(name.to_string())
            .with_attributes(attributes.to_vec())
            .start_with_context(&self.tracer, parent);
        parent.with_span(span)
    }

    /// Flushes pending spans.
    pub(crate) fn shutdown(&self) -> Result<()> {
        self.provider
            .shutdown()
            .map_err(|err| anyhow!("failed to shutdown tracer provider: {err}"))
    }
}

fn traces_endpoint(endpoint: &str) -> Result<String> {
    let mut url = reqwest::Url::parse(endpoint).context("parse OTLP endpoint")?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("OTLP endpoint must use http or https: {endpoint}");
    }
    if url.path() == "/" {
        url.set_path(TRACES_PATH);
    }
    Ok(url.to_string())
}

/// Runs `f` in a span under the current one, or plainly without telemetry.
pub(crate) fn with_span<T>(
    telemetry: Option<&Telemetry>,
    name: &str,
    attributes: &[KeyValue],
    f: impl FnOnce() -> T,
) -> T {
    with_child_span(telemetry, name, attributes, &OtelContext::current(), f)
}

/// Runs `f` in a span under `parent`. Rayon workers do not inherit the
/// caller's context, so parallel phases pass it explicitly.
pub(crate) fn with_child_span<T>(
    telemetry: Option<&Telemetry>,
    name: &str,
    attributes: &[KeyValue],
    parent: &OtelContext,
    f: impl FnOnce() -> T,
) -> T {
    let Some(telemetry) = telemetry else {
        return f();
    };
    let _attached = telemetry.start(name, attributes, parent).attach();
    f()
}

/// Hex trace id of the active span, if any.
pub(crate) fn current_trace_id() -> Option<String> {
    OtelContext::map_current(|cx| {
        let span = cx.span();
        let context = span.span_context();
        context.is_valid().then(|| context.trace_id().to_string())
    })
}

/// Logs to stderr. `RUST_LOG` replaces the default filter.
pub(crate) fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("contractor=info,warn"));
    // A subscriber installed earlier (as in tests) wins.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

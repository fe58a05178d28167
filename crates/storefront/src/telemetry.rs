//! Logging and error tracking setup.

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, SentryConfig};

/// Log filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "cardhub_storefront=info,cardhub_cli=info";

/// Keeps Sentry flushing until dropped.
pub struct TelemetryGuard {
    sentry: Option<sentry::ClientInitGuard>,
}

impl std::fmt::Debug for TelemetryGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryGuard")
            .field("sentry", &self.sentry.is_some())
            .finish()
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &SentryConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(config.environment.clone().into()),
            sample_rate: config.sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}

/// Install the global subscriber: `EnvFilter`, a stderr fmt layer (text or
/// JSON), and the Sentry layer. Sentry is initialized first so the layer has
/// a client.
///
/// Logs go to stderr so command output on stdout stays clean.
#[must_use]
pub fn init(config: &SentryConfig, format: LogFormat, verbose: bool) -> TelemetryGuard {
    // Initialize Sentry (must be done before tracing subscriber)
    let sentry = init_sentry(config);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            "cardhub_storefront=debug,cardhub_cli=debug".into()
        } else {
            DEFAULT_LOG_FILTER.into()
        }
    });

    let json = format == LogFormat::Json;
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    // A second init (for example in tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .try_init();

    if sentry.is_some() {
        tracing::info!(environment = %config.environment, "Sentry initialized");
    }

    TelemetryGuard { sentry }
}

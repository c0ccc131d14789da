//! # Structured Logging Module
//!
//! Environment-aware structured logging for both services. Console output is
//! either human-readable or JSON, selected by `logging.format`.

use chrono::Utc;
use std::io::IsTerminal;
use std::sync::OnceLock;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::config::{ConfigManager, LogFormat, LoggingConfig};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration.
///
/// Safe to call more than once; only the first call installs a subscriber, and
/// an already installed global subscriber is left in place.
pub fn init_structured_logging(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = build_filter(config, &environment);

        let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
            LogFormat::Pretty => fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(std::io::stdout().is_terminal())
                .boxed(),
            LogFormat::Json => fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .boxed(),
        };

        // Use try_init to avoid panic if global subscriber already set
        if tracing_subscriber::registry()
            .with(layer.with_filter(filter))
            .try_init()
            .is_err()
        {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            format = ?config.format,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

/// `RUST_LOG` wins, then the configured level, then the environment default
fn build_filter(config: &LoggingConfig, environment: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let directive = config
        .level
        .clone()
        .unwrap_or_else(|| get_log_level(environment).to_string());
    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(get_log_level(environment)))
}

fn get_environment() -> String {
    ConfigManager::detect_environment()
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "test" => "debug",
        "development" => "debug",
        "production" => "info",
        _ => "debug",
    }
}

/// Log structured data for order operations
pub fn log_order_operation(
    operation: &str,
    order_id: &str,
    status: Option<&str>,
    outcome: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        order_id = %order_id,
        status = status,
        outcome = %outcome,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "📦 ORDER_OPERATION"
    );
}

/// Log structured data for broker message operations
pub fn log_message_operation(
    operation: &str,
    topic: &str,
    key: Option<&str>,
    partition: Option<i32>,
    offset: Option<i64>,
    outcome: &str,
) {
    tracing::info!(
        operation = %operation,
        topic = %topic,
        key = key,
        partition = partition,
        offset = offset,
        outcome = %outcome,
        timestamp = %Utc::now().to_rfc3339(),
        "📨 MESSAGE_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "❌ ERROR"
    );
}

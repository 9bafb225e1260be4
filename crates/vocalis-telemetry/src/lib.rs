//! Logging for Vocalis
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and a text
//! or JSON formatter.

use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};
use vocalis_config::{LogFormat, TelemetryConfig};

/// Filter used when the configured directive does not parse
const FALLBACK_FILTER: &str = "info";

/// Install the global subscriber
///
/// The filter comes from `filter_override` when given, then `RUST_LOG`,
/// then the configured `log_filter`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init(config: &TelemetryConfig, filter_override: Option<&str>) -> anyhow::Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = filter_directive(config, filter_override, rust_log.as_deref());

    let filter = EnvFilter::try_new(directive).unwrap_or_else(|e| {
        eprintln!("invalid log filter '{directive}' ({e}), falling back to '{FALLBACK_FILTER}'");
        EnvFilter::new(FALLBACK_FILTER)
    });

    let fmt_layer = match config.format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
    };

    tracing_subscriber::registry().with(filter).with(fmt_layer).try_init()?;

    Ok(())
}

fn filter_directive<'a>(
    config: &'a TelemetryConfig,
    filter_override: Option<&'a str>,
    rust_log: Option<&'a str>,
) -> &'a str {
    filter_override
        .or(rust_log.filter(|value| !value.trim().is_empty()))
        .unwrap_or(&config.log_filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_beats_environment_beats_config() {
        let config = TelemetryConfig {
            log_filter: "warn".to_string(),
            ..TelemetryConfig::default()
        };

        assert_eq!(filter_directive(&config, Some("debug"), Some("trace")), "debug");
        assert_eq!(filter_directive(&config, None, Some("tts=trace")), "tts=trace");
        assert_eq!(filter_directive(&config, None, Some("  ")), "warn");
        assert_eq!(filter_directive(&config, None, None), "warn");
    }
}

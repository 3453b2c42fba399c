use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stability_core::settings::PipelineSettings;

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Create the raw-data, event and database directories named in `settings`.
pub fn ensure_directories(settings: &PipelineSettings) -> anyhow::Result<()> {
    std::fs::create_dir_all(&settings.indicator_dir)?;
    std::fs::create_dir_all(&settings.event_dir)?;
    if let Some(parent) = settings.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map an upper-case level name (`WARNING`, `CRITICAL`, ...) to a `tracing` filter directive.
///
/// Unrecognised names are passed through unchanged so full `EnvFilter`
/// directives (`"stability_data=debug"`) also work.
pub fn filter_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" | "WARN" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Install the global `tracing` subscriber, writing to stderr.
///
/// Falls back to `"info"` if the level cannot be parsed. Calling this again
/// once a subscriber is installed is a no-op, so it is safe to run from every
/// interactive session.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(filter_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt::layer().with_target(false).with_thread_ids(false);

    if tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already installed");
    }

    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

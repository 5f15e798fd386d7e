use std::sync::Once;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static LOG_INIT: Once = Once::new();

/// Output flavour of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One line per event, with file and line number. Meant for terminals and tests.
    #[default]
    Compact,
    /// Multi-line, human oriented output.
    Pretty,
}

/// Filter applied when neither `RUST_LOG` nor an explicit filter is given.
const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber with the compact format.
///
/// `default_filter` is used when `RUST_LOG` is not set, e.g. `Some("info,wxpay_client=debug")`.
/// Only the first call has an effect, so every test can call it.
pub fn log_init(default_filter: Option<&str>) {
    log_init_with_format(default_filter, LogFormat::Compact);
}

/// Same as [`log_init`] with an explicit output format.
pub fn log_init_with_format(default_filter: Option<&str>, format: LogFormat) {
    LOG_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter.unwrap_or(DEFAULT_FILTER)));
        tracing_setup(filter, format);
    });
}

fn tracing_setup(filter: EnvFilter, format: LogFormat) {
    let layer = tracing_subscriber::fmt::layer()
        .with_level(true)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true);

    // a subscriber may already be installed by the host application
    let _ = match format {
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(layer.compact())
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(layer.pretty())
            .try_init(),
    };
}

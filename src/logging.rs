use std::{io, sync::OnceLock};

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::LoggingConfig;

static INIT: OnceLock<()> = OnceLock::new();

/// Installs the console subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(config: &LoggingConfig) {
    INIT.get_or_init(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let console_layer = fmt::layer()
            .with_writer(io::stderr)
            .with_target(true)
            .with_ansi(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();

        tracing::debug!(level = %config.level, "tracing initialized");
    });
}

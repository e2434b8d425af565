use std::fs::File;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_PATH_ENV: &str = "VOCAB_LOG";

/// File logging, off unless `VOCAB_LOG` names a path. The terminal belongs to
/// the session screen, so nothing is ever written to stdout or stderr.
pub fn init_tracing() {
    let Some(log_path) = std::env::var(LOG_PATH_ENV)
        .ok()
        .filter(|path| !path.trim().is_empty())
    else {
        return;
    };

    let file = match File::create(&log_path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("Warning: failed to create log file {log_path}: {err}");
            return;
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();
}
